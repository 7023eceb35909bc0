//! File references and name derivation.
//!
//! All relationships between a template, its expanded source and the
//! translated output are purely name-based suffix substitutions:
//! `foo.pyx.in` -> `foo.pyx` -> `foo.c`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::PrepareError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Text template that expands into an extension source
    Template,
    /// Extension source handed straight to the translator
    Source,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SuffixRules {
    #[serde(default = "default_source_suffix")]
    pub source: String,
    #[serde(default = "default_template_marker")]
    pub template_marker: String,
    #[serde(default = "default_target_suffix")]
    pub target: String,
    /// Declarations shared with other modules, e.g. `.pxd`
    #[serde(default = "default_declaration_suffix")]
    pub declaration: String,
}

fn default_source_suffix() -> String { ".pyx".to_string() }
fn default_template_marker() -> String { ".in".to_string() }
fn default_target_suffix() -> String { ".c".to_string() }
fn default_declaration_suffix() -> String { ".pxd".to_string() }

impl Default for SuffixRules {
    fn default() -> Self {
        Self {
            source: default_source_suffix(),
            template_marker: default_template_marker(),
            target: default_target_suffix(),
            declaration: default_declaration_suffix(),
        }
    }
}

impl SuffixRules {
    /// Full suffix of a template file, e.g. `.pyx.in`
    pub fn template_suffix(&self) -> String {
        format!("{}{}", self.source, self.template_marker)
    }

    pub fn classify(&self, path: &Path) -> Option<SourceKind> {
        let name = path.file_name()?.to_str()?;
        if name.ends_with(&self.template_suffix()) {
            Some(SourceKind::Template)
        } else if name.ends_with(&self.source) {
            Some(SourceKind::Source)
        } else {
            None
        }
    }

    /// Name a template expands into: the template marker is dropped.
    pub fn expanded_path(&self, template: &Path) -> Result<PathBuf, PrepareError> {
        replace_suffix(template, &self.template_suffix(), &self.source)
            .ok_or_else(|| PrepareError::InvalidInput(template.to_path_buf()))
    }

    /// Name of the translated counterpart of a template or source file.
    ///
    /// Names carrying neither suffix are returned unchanged.
    pub fn translated_path(&self, path: &Path) -> PathBuf {
        replace_suffix(path, &self.template_suffix(), &self.target)
            .or_else(|| replace_suffix(path, &self.source, &self.target))
            .unwrap_or_else(|| path.to_path_buf())
    }

    /// Declaration file sitting next to a source, e.g. `b.pyx` -> `b.pxd`
    pub fn declaration_path(&self, source: &Path) -> Option<PathBuf> {
        replace_suffix(source, &self.source, &self.declaration)
    }
}

fn replace_suffix(path: &Path, suffix: &str, replacement: &str) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(suffix)?;
    if stem.is_empty() {
        return None;
    }
    Some(path.with_file_name(format!("{}{}", stem, replacement)))
}
