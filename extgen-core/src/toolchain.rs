//! Translator Toolchain - detection, version gate, invocation
//!
//! The toolchain is never assumed: its presence and version are queried
//! before anything is handed to it.

use log::{debug, warn};
use semver::Version;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::PrepareError;

/// An external source-to-source translator
pub trait Translator {
    fn name(&self) -> &str;

    /// Installed version, or `None` when the toolchain cannot be found or queried.
    fn detect(&self) -> Option<Version>;

    /// Translate `input` into `output`.
    fn translate(&self, input: &Path, output: &Path) -> Result<(), PrepareError>;
}

/// Parse a version the way loose version strings are usually written.
///
/// The first whitespace-separated token starting with a digit is used, so
/// `"Cython version 0.29.36"` parses. Missing components are zero and a
/// trailing tag such as `a11` or `rc1` ends the parse.
pub fn parse_loose_version(text: &str) -> Option<Version> {
    let token = text
        .split_whitespace()
        .map(|t| t.trim_start_matches('v'))
        .find(|t| t.starts_with(|c: char| c.is_ascii_digit()))?;

    let mut parts = [0u64; 3];
    for (slot, component) in parts.iter_mut().zip(token.split('.')) {
        let digits: String = component.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            break;
        }
        *slot = digits.parse().ok()?;
        if digits.len() < component.len() {
            break;
        }
    }

    Some(Version::new(parts[0], parts[1], parts[2]))
}

/// Check a detected version against a minimum given as text
pub fn meets_minimum(version: &Version, minimum: &str) -> Result<bool, PrepareError> {
    let min_ver = parse_loose_version(minimum)
        .ok_or_else(|| PrepareError::InvalidVersion(minimum.to_string()))?;
    Ok(*version >= min_ver)
}

/// Translator run as an external program found on `PATH`.
///
/// Invoked as `<program> [extra args] <input> -o <output>`.
#[derive(Debug, Clone)]
pub struct CommandTranslator {
    program: String,
    extra_args: Vec<String>,
}

impl CommandTranslator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_args: vec![],
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.extra_args.extend(args);
        self
    }

    fn locate(&self) -> Option<PathBuf> {
        which::which(&self.program).ok()
    }
}

impl Translator for CommandTranslator {
    fn name(&self) -> &str {
        &self.program
    }

    fn detect(&self) -> Option<Version> {
        let path = self.locate()?;
        debug!("Found translator at: {}", path.display());

        let output = match Command::new(&path).arg("--version").output() {
            Ok(o) => o,
            Err(e) => {
                warn!("Failed to query {} version: {}", self.program, e);
                return None;
            }
        };

        // Some releases print the version on stderr
        let text = format!(
            "{} {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let version = parse_loose_version(&text);
        if version.is_none() {
            warn!("Could not read a version from `{} --version`: {}", self.program, text.trim());
        }
        version
    }

    fn translate(&self, input: &Path, output: &Path) -> Result<(), PrepareError> {
        let path = self
            .locate()
            .ok_or_else(|| PrepareError::MissingDependency(self.program.clone()))?;

        let status = Command::new(&path)
            .args(&self.extra_args)
            .arg(input)
            .arg("-o")
            .arg(output)
            .status()
            .map_err(|e| PrepareError::io(&path, e))?;

        if !status.success() {
            return Err(PrepareError::TranslationFailed {
                path: input.to_path_buf(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_versions() {
        assert_eq!(parse_loose_version("0.29.36"), Some(Version::new(0, 29, 36)));
        assert_eq!(parse_loose_version("3.0"), Some(Version::new(3, 0, 0)));
        assert_eq!(parse_loose_version("3"), Some(Version::new(3, 0, 0)));
    }

    #[test]
    fn test_parse_tagged_versions() {
        assert_eq!(parse_loose_version("3.0.0a11"), Some(Version::new(3, 0, 0)));
        assert_eq!(parse_loose_version("0.23rc1"), Some(Version::new(0, 23, 0)));
        assert_eq!(parse_loose_version("v1.4.2"), Some(Version::new(1, 4, 2)));
    }

    #[test]
    fn test_parse_version_banner() {
        assert_eq!(
            parse_loose_version("Cython version 0.23.4\n"),
            Some(Version::new(0, 23, 4))
        );
        assert_eq!(parse_loose_version("no digits here"), None);
    }

    #[test]
    fn test_meets_minimum() {
        let min = crate::MIN_TRANSLATOR_VERSION;
        assert!(meets_minimum(&Version::new(0, 23, 4), min).unwrap());
        assert!(meets_minimum(&Version::new(3, 0, 0), min).unwrap());
        assert!(!meets_minimum(&Version::new(0, 23, 3), min).unwrap());
        assert!(!meets_minimum(&Version::new(0, 9, 99), min).unwrap());
    }

    #[test]
    fn test_meets_minimum_rejects_garbage() {
        let err = meets_minimum(&Version::new(1, 0, 0), "latest").unwrap_err();
        assert!(matches!(err, PrepareError::InvalidVersion(_)));
    }

    #[test]
    fn test_missing_program_not_detected() {
        let translator = CommandTranslator::new("extgen-no-such-translator-xyz");
        assert!(translator.detect().is_none());
        let err = translator
            .translate(Path::new("a.pyx"), Path::new("a.c"))
            .unwrap_err();
        assert!(matches!(err, PrepareError::MissingDependency(_)));
    }
}
