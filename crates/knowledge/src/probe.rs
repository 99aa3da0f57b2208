//! Capability detection for the persistent backend.

use crate::lancedb_index::LanceDbIndex;
use crate::types::Chunk;
use crate::vector_index::VectorIndex;
use async_trait::async_trait;
use hipaa_core::config::IndexSettings;
use hipaa_core::{AppError, AppResult};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Decides whether the persistent backend can be used in this environment.
#[async_trait]
pub trait BackendProbe: Send + Sync {
    /// `Ok(())` if usable, otherwise [`AppError::IndexBackendUnavailable`].
    async fn check(&self) -> AppResult<()>;
}

/// Writes, reopens and queries a one-row scratch table.
#[derive(Debug, Default)]
pub struct LanceDbProbe;

#[async_trait]
impl BackendProbe for LanceDbProbe {
    async fn check(&self) -> AppResult<()> {
        let scratch = TempDir::new().map_err(|e| {
            AppError::IndexBackendUnavailable(format!("cannot create scratch directory: {}", e))
        })?;
        let path = scratch.path().join("probe");

        let chunk = Chunk {
            id: "probe".to_string(),
            text: "probe".to_string(),
            source_path: PathBuf::from("probe.txt"),
            page: None,
            sequence_index: 0,
        };

        LanceDbIndex::create(&path, 2, &[chunk], &[vec![1.0, 0.0]]).await?;
        let hits = LanceDbIndex::open(&path)
            .await?
            .search(&[1.0, 0.0], 1)
            .await
            .map_err(|e| AppError::IndexBackendUnavailable(e.to_string()))?;

        if hits.len() != 1 {
            return Err(AppError::IndexBackendUnavailable(format!(
                "scratch query returned {} rows, expected 1",
                hits.len()
            )));
        }

        tracing::debug!("LanceDB backend probe succeeded");
        Ok(())
    }
}

/// Always reports the persistent backend as unavailable.
#[derive(Debug, Clone)]
pub struct DisabledProbe {
    reason: String,
}

impl DisabledProbe {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl BackendProbe for DisabledProbe {
    async fn check(&self) -> AppResult<()> {
        Err(AppError::IndexBackendUnavailable(self.reason.clone()))
    }
}

/// Probe matching the configured backend preference.
pub fn probe_for(settings: &IndexSettings) -> Arc<dyn BackendProbe> {
    if settings.persistent_backend {
        Arc::new(LanceDbProbe)
    } else {
        Arc::new(DisabledProbe::new(
            "persistent backend disabled by configuration",
        ))
    }
}
