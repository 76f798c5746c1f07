//! Identification hints attached to analysis requests.
//!
//! A provider is constructed explicitly, initialized once, and passed to the
//! analysis client. Nothing here is global.

use std::path::PathBuf;
use std::sync::OnceLock;

use serde::Deserialize;

use crate::error::AnalysisError;
use crate::models::AnalysisMode;

pub trait KnowledgeProvider: Send + Sync {
    /// Load the knowledge base. Calling it again after success is a no-op.
    fn initialize(&self) -> Result<(), AnalysisError>;

    fn is_ready(&self) -> bool;

    /// Context text for a request in `mode`, if this provider covers it and
    /// is ready.
    fn hints(&self, mode: AnalysisMode) -> Option<String>;
}

/// One identification hint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KnowledgeEntry {
    pub topic: String,
    pub hint: String,
}

#[derive(Debug, Deserialize)]
struct KnowledgeFile {
    #[serde(default)]
    entries: Vec<KnowledgeEntry>,
}

const BUILTIN: &[(&str, &str)] = &[
    (
        "perforation",
        "Measure the perforation gauge (holes per 2 cm); imperforate edges usually mean an earlier or special issue.",
    ),
    (
        "watermark",
        "Note any visible watermark pattern; it separates otherwise identical printings.",
    ),
    (
        "cancellation",
        "Describe the cancellation (handstamp, machine, pen, or mint) and any legible date or town.",
    ),
    (
        "printing",
        "Distinguish engraved, lithographed, typographed or photogravure printing from line sharpness and ink relief.",
    ),
    (
        "denomination",
        "Read the face value and currency; together with the country name they anchor the catalogue lookup.",
    ),
    (
        "condition",
        "Check centering, thins, creases, toning and gum state before estimating value.",
    ),
];

/// Stamp identification hints, built in or loaded from a YAML file
#[derive(Debug, Default)]
pub struct StampKnowledge {
    source: Option<PathBuf>,
    entries: OnceLock<Vec<KnowledgeEntry>>,
}

impl StampKnowledge {
    /// Provider backed by the built-in hints.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Provider backed by a YAML file with an `entries` list of
    /// `{topic, hint}`.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(path.into()),
            entries: OnceLock::new(),
        }
    }

    fn load(&self) -> Result<Vec<KnowledgeEntry>, AnalysisError> {
        let Some(path) = &self.source else {
            return Ok(BUILTIN
                .iter()
                .map(|(topic, hint)| KnowledgeEntry {
                    topic: topic.to_string(),
                    hint: hint.to_string(),
                })
                .collect());
        };

        let content = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::Knowledge(format!("{}: {e}", path.display())))?;
        let file: KnowledgeFile = serde_yaml::from_str(&content)
            .map_err(|e| AnalysisError::Knowledge(format!("{}: {e}", path.display())))?;
        if file.entries.is_empty() {
            return Err(AnalysisError::Knowledge(format!(
                "{}: no entries",
                path.display()
            )));
        }
        Ok(file.entries)
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        self.entries.get().map(Vec::as_slice).unwrap_or(&[])
    }
}

impl KnowledgeProvider for StampKnowledge {
    fn initialize(&self) -> Result<(), AnalysisError> {
        if self.entries.get().is_some() {
            return Ok(());
        }
        let entries = self.load()?;
        tracing::info!(entries = entries.len(), "Stamp knowledge loaded");
        // A concurrent initializer may have won; both loaded the same data
        let _ = self.entries.set(entries);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.entries.get().is_some()
    }

    fn hints(&self, mode: AnalysisMode) -> Option<String> {
        if mode != AnalysisMode::Stamps {
            return None;
        }
        let entries = self.entries.get()?;
        let mut text = String::from("Stamp identification checklist:\n");
        for entry in entries {
            text.push_str(&format!("- {}: {}\n", entry.topic, entry.hint));
        }
        Some(text)
    }
}
