//! End-to-end tests over a scratch corpus, the offline embedder and a
//! scripted generative model.

pub(crate) mod support;
