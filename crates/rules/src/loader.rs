//! Filesystem rule loader.
//!
//! Scans a directory (recursively) for `*.yml` / `*.yaml` files and
//! deserializes them into [`RuleDocument`] instances via two-pass
//! deserialization. Parse errors are reported per file and never abort the scan.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::analysis_config::CompiledAnalysisConfig;
use crate::error::{Result, RuleError};
use crate::pipeline_template::PipelineTemplateRule;
use crate::schema::{RuleDocument, RuleEnvelope};

/// Outcome of loading a single rule file.
#[derive(Debug)]
pub struct LoadResult {
    /// Path to the file that was loaded.
    pub path: PathBuf,
    /// Status of the load attempt.
    pub status: LoadStatus,
}

/// Status of a single file load attempt.
#[derive(Debug, PartialEq)]
pub enum LoadStatus {
    /// Rule was successfully loaded.
    Loaded { rule_id: String },
    /// File was skipped (dotfile, non-YAML, disabled rule).
    Skipped { reason: String },
    /// Parse or validation error occurred.
    Failed { error: String },
}

/// Loaded rule documents keyed by `metadata.id`.
///
/// A `BTreeMap` keeps lookups that pick "the first" document deterministic.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    documents: BTreeMap<String, RuleDocument>,
}

impl RuleSet {
    pub fn insert(&mut self, doc: RuleDocument) -> Option<RuleDocument> {
        self.documents.insert(doc.metadata().id.clone(), doc)
    }

    pub fn get(&self, id: &str) -> Option<&RuleDocument> {
        self.documents.get(id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> impl Iterator<Item = &RuleDocument> {
        self.documents.values()
    }

    /// The enabled AnalysisConfig with the lowest id, compiled; defaults if none.
    pub fn analysis_config(&self) -> CompiledAnalysisConfig {
        let mut configs = self
            .documents
            .values()
            .filter_map(RuleDocument::as_analysis_config);
        match configs.next() {
            Some(first) => {
                let extra = configs.count();
                if extra > 0 {
                    warn!(
                        chosen = %first.metadata.id,
                        ignored = extra,
                        "multiple AnalysisConfig documents enabled; using the first by id"
                    );
                }
                first.compile()
            }
            None => CompiledAnalysisConfig::default(),
        }
    }

    /// Look up a pipeline template by id.
    pub fn template(&self, id: &str) -> Option<&PipelineTemplateRule> {
        self.documents
            .get(id)
            .and_then(RuleDocument::as_pipeline_template)
    }
}

/// Filesystem-backed rule loader.
pub struct RuleLoader {
    /// Root directory containing rule YAML files.
    rules_dir: PathBuf,
}

impl RuleLoader {
    pub fn new(rules_dir: impl Into<PathBuf>) -> Self {
        Self {
            rules_dir: rules_dir.into(),
        }
    }

    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    /// Recursively scan the rules directory and load all enabled YAML documents.
    ///
    /// A missing directory yields an empty set. Dotfiles and non-YAML files
    /// are skipped.
    pub fn load_all(&self) -> Result<(RuleSet, Vec<LoadResult>)> {
        let mut set = RuleSet::default();
        let mut results = Vec::new();
        if !self.rules_dir.exists() {
            debug!(path = %self.rules_dir.display(), "rules directory missing, using defaults");
            return Ok((set, results));
        }

        // Sorted so duplicate-id resolution does not depend on directory order.
        let walker = WalkDir::new(&self.rules_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_type().is_dir() || !is_hidden(e));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "walkdir error, skipping entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let hidden = is_hidden(&entry);
            let path = entry.into_path();
            let status = if hidden {
                LoadStatus::Skipped {
                    reason: "dotfile".to_string(),
                }
            } else if !is_yaml(&path) {
                LoadStatus::Skipped {
                    reason: "not a YAML file".to_string(),
                }
            } else {
                Self::load_into(&path, &mut set)
            };
            results.push(LoadResult { path, status });
        }

        info!(
            path = %self.rules_dir.display(),
            loaded = set.len(),
            files = results.len(),
            "rules loaded"
        );
        Ok((set, results))
    }

    fn load_into(path: &Path, set: &mut RuleSet) -> LoadStatus {
        match Self::load_file(path) {
            Ok(doc) if !doc.metadata().enabled => {
                debug!(rule_id = %doc.metadata().id, "skipping disabled rule");
                LoadStatus::Skipped {
                    reason: "disabled".to_string(),
                }
            }
            Ok(doc) => {
                let rule_id = doc.metadata().id.clone();
                info!(rule_id = %rule_id, kind = %doc.kind(), path = %path.display(), "loaded rule");
                if set.insert(doc).is_some() {
                    warn!(rule_id = %rule_id, path = %path.display(), "duplicate rule id, later file wins");
                }
                LoadStatus::Loaded { rule_id }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load rule file");
                LoadStatus::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Parse a single YAML file into a [`RuleDocument`] via two-pass deserialization.
    pub fn load_file(path: &Path) -> Result<RuleDocument> {
        let contents = fs::read_to_string(path)?;
        Self::parse_str(&contents)
    }

    /// Parse YAML text into a [`RuleDocument`].
    pub fn parse_str(contents: &str) -> Result<RuleDocument> {
        // First pass: extract envelope (kind + metadata).
        let envelope: RuleEnvelope = serde_yaml::from_str(contents)?;

        if envelope.metadata.id.is_empty() {
            return Err(RuleError::Validation(
                "rule metadata.id must not be empty".to_string(),
            ));
        }

        // Second pass: deserialize into kind-specific type.
        envelope.parse_full().map_err(|e| {
            RuleError::Validation(format!(
                "failed to parse rule '{}': {}",
                envelope.metadata.id, e
            ))
        })
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml" | "yaml")
    )
}
