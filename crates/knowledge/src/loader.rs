//! Corpus loading: one raw document per text file, one per PDF page.

use crate::types::RawDocument;
use hipaa_core::{AppError, AppResult};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Source formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Markdown,
    PlainText,
}

impl DocumentKind {
    /// Detect the kind from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "md" => Some(Self::Markdown),
            "txt" => Some(Self::PlainText),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Markdown => "markdown",
            Self::PlainText => "text",
        }
    }
}

/// Load every recognized file directly inside `dir`.
///
/// Subdirectories are not descended into and unrecognized extensions are
/// skipped. A recognized file that cannot be parsed is logged and skipped.
/// Documents whose text is only whitespace are dropped.
///
/// # Errors
/// `NoDocumentsFound` if `dir` is missing or yields no documents.
pub fn load_documents(dir: &Path) -> AppResult<Vec<RawDocument>> {
    if !dir.is_dir() {
        return Err(AppError::NoDocumentsFound {
            path: dir.to_path_buf(),
        });
    }

    let mut documents = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(kind) = DocumentKind::from_path(path) else {
            tracing::debug!("Skipping unrecognized file: {:?}", path);
            continue;
        };

        match load_file(path, kind) {
            Ok(docs) => {
                let before = documents.len();
                documents.extend(docs.into_iter().filter(|d| !d.text.trim().is_empty()));
                tracing::debug!(
                    "Loaded {:?} as {}: {} document(s)",
                    path,
                    kind.as_str(),
                    documents.len() - before
                );
            }
            Err(e) => {
                tracing::warn!("{}", e);
            }
        }
    }

    if documents.is_empty() {
        return Err(AppError::NoDocumentsFound {
            path: dir.to_path_buf(),
        });
    }

    tracing::info!("Loaded {} documents from {:?}", documents.len(), dir);
    Ok(documents)
}

fn load_file(path: &Path, kind: DocumentKind) -> AppResult<Vec<RawDocument>> {
    match kind {
        DocumentKind::Pdf => load_pdf(path),
        DocumentKind::Markdown | DocumentKind::PlainText => {
            let text = fs::read_to_string(path).map_err(|e| AppError::UnsupportedFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            Ok(vec![RawDocument {
                text,
                source_path: path.to_path_buf(),
                page: None,
            }])
        }
    }
}

/// Extract one document per page.
fn load_pdf(path: &Path) -> AppResult<Vec<RawDocument>> {
    let unsupported = |reason: String| AppError::UnsupportedFile {
        path: path.to_path_buf(),
        reason,
    };

    let doc = lopdf::Document::load(path).map_err(|e| unsupported(e.to_string()))?;

    let mut pages = Vec::new();
    for page_number in doc.get_pages().keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(text) => pages.push(RawDocument {
                text,
                source_path: path.to_path_buf(),
                page: Some(*page_number),
            }),
            Err(e) => {
                tracing::warn!("Skipping page {} of {:?}: {}", page_number, path, e);
            }
        }
    }

    if pages.is_empty() {
        return Err(unsupported("no extractable pages".to_string()));
    }

    Ok(pages)
}
