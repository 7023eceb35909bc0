//! Source Preparer - Single Entry Point
//!
//! Decides whether translated sources must be regenerated and does so when
//! a recent enough translator is installed. Without one, pre-built
//! translated sources shipped in the tree are used instead.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::PrepareError;
use crate::hashing::file_digest;
use crate::sources::{SourceKind, SuffixRules};
use crate::templating::{self, MinijinjaEngine, TemplateEngine};
use crate::toolchain::{meets_minimum, parse_loose_version, CommandTranslator, Translator};
use crate::MIN_TRANSLATOR_VERSION;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareConfig {
    #[serde(default)]
    pub suffixes: SuffixRules,
    #[serde(default = "default_min_version")]
    pub min_translator_version: String,
    #[serde(default = "default_translator")]
    pub translator: String,
    #[serde(default)]
    pub translator_args: Vec<String>,
    /// Re-run the translator even when its output is newer than its input
    #[serde(default)]
    pub force: bool,
}

fn default_min_version() -> String { MIN_TRANSLATOR_VERSION.to_string() }
fn default_translator() -> String { "cython".to_string() }

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            suffixes: SuffixRules::default(),
            min_translator_version: default_min_version(),
            translator: default_translator(),
            translator_args: vec![],
            force: false,
        }
    }
}

/// What a call to `prepare` did
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PrepareOutcome {
    /// Clean action; nothing was touched
    Skipped,
    /// No usable translator; these pre-built files are used
    Fallback { files: Vec<PathBuf> },
    /// Sources were (re)generated
    Generated { files: Vec<GeneratedFile> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedFile {
    pub input: PathBuf,
    pub expanded: Option<PathBuf>,
    pub output: PathBuf,
    /// False when the output was already up to date
    pub translated: bool,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainStatus {
    pub translator: String,
    pub version: Option<String>,
    pub minimum: String,
    pub usable: bool,
}

pub struct SourcePreparer {
    config: PrepareConfig,
    translator: Box<dyn Translator>,
    engine: Option<Box<dyn TemplateEngine>>,
}

impl SourcePreparer {
    /// Preparer driving the configured translator program, with minijinja templates
    pub fn new(config: PrepareConfig) -> Self {
        let translator = CommandTranslator::new(config.translator.clone())
            .with_args(config.translator_args.clone());
        Self {
            config,
            translator: Box::new(translator),
            engine: Some(Box::new(MinijinjaEngine)),
        }
    }

    pub fn with_translator(mut self, translator: impl Translator + 'static) -> Self {
        self.translator = Box::new(translator);
        self
    }

    /// Replace the template engine; `None` means no engine is installed
    pub fn with_engine(mut self, engine: Option<Box<dyn TemplateEngine>>) -> Self {
        self.engine = engine;
        self
    }

    pub fn config(&self) -> &PrepareConfig {
        &self.config
    }

    /// Detect the translator and check it against the minimum version
    pub fn toolchain_status(&self) -> Result<ToolchainStatus, PrepareError> {
        let minimum = &self.config.min_translator_version;
        let version = self.translator.detect();
        let usable = match &version {
            Some(v) => meets_minimum(v, minimum)?,
            None => {
                // Still reject a malformed minimum
                parse_loose_version(minimum)
                    .ok_or_else(|| PrepareError::InvalidVersion(minimum.clone()))?;
                false
            }
        };

        Ok(ToolchainStatus {
            translator: self.translator.name().to_string(),
            version: version.map(|v| v.to_string()),
            minimum: minimum.clone(),
            usable,
        })
    }

    /// Expand a single template file
    pub fn expand(&self, template: &Path) -> Result<PathBuf, PrepareError> {
        templating::expand(template, &self.config.suffixes, self.engine.as_deref())
    }

    /// Prepare translated sources for `files`, resolved under `working_dir`.
    ///
    /// With `clean` set nothing is done at all.
    pub fn prepare<P: AsRef<Path>>(
        &self,
        files: &[P],
        working_dir: &Path,
        clean: bool,
    ) -> Result<PrepareOutcome, PrepareError> {
        if clean {
            debug!("Clean requested; skipping source preparation");
            return Ok(PrepareOutcome::Skipped);
        }

        let inputs: Vec<PathBuf> = files.iter().map(|f| working_dir.join(f)).collect();

        let status = self.toolchain_status()?;
        if !status.usable {
            return self.fall_back(&inputs, &status);
        }

        let mut generated = vec![];
        for input in &inputs {
            generated.push(self.generate(input)?);
        }
        Ok(PrepareOutcome::Generated { files: generated })
    }

    fn fall_back(
        &self,
        inputs: &[PathBuf],
        status: &ToolchainStatus,
    ) -> Result<PrepareOutcome, PrepareError> {
        let rules = &self.config.suffixes;
        let outputs: Vec<PathBuf> = inputs.iter().map(|i| rules.translated_path(i)).collect();

        if let Some(missing) = outputs.iter().find(|o| !o.is_file()) {
            debug!("No pre-built source at {}", missing.display());
            return Err(PrepareError::ToolchainUnavailable(status.minimum.clone()));
        }

        // Pre-built files are used as-is; freshness is only reported
        for (input, output) in inputs.iter().zip(&outputs) {
            if is_newer(input, output) {
                warn!("Pre-built {} is older than {}", output.display(), input.display());
            }
        }

        let names: Vec<String> = outputs.iter().map(|o| o.display().to_string()).collect();
        info!(
            "{} >= {} not found; falling back to pre-built {}",
            status.translator,
            status.minimum,
            names.join(" ")
        );
        Ok(PrepareOutcome::Fallback { files: outputs })
    }

    fn generate(&self, input: &Path) -> Result<GeneratedFile, PrepareError> {
        let rules = &self.config.suffixes;
        let kind = rules
            .classify(input)
            .ok_or_else(|| PrepareError::InvalidInput(input.to_path_buf()))?;

        let expanded = match kind {
            SourceKind::Template => Some(self.expand(input)?),
            SourceKind::Source => None,
        };
        let source = expanded.as_deref().unwrap_or(input);
        let output = rules.translated_path(source);

        let translated = if self.config.force || self.is_stale(source, &output) {
            info!("Translating {} -> {}", source.display(), output.display());
            self.translator.translate(source, &output)?;
            true
        } else {
            debug!("{} is up to date", output.display());
            false
        };

        Ok(GeneratedFile {
            input: input.to_path_buf(),
            expanded,
            output: output.clone(),
            translated,
            sha256: file_digest(&output)?,
        })
    }

    /// Output is missing, or older than its source or the source's declarations
    fn is_stale(&self, source: &Path, output: &Path) -> bool {
        if !output.is_file() || is_newer(source, output) {
            return true;
        }
        self.config
            .suffixes
            .declaration_path(source)
            .map_or(false, |decl| is_newer(&decl, output))
    }
}

impl Default for SourcePreparer {
    fn default() -> Self {
        Self::new(PrepareConfig::default())
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// True when both files exist and `a` was modified after `b`
fn is_newer(a: &Path, b: &Path) -> bool {
    match (modified(a), modified(b)) {
        (Some(a), Some(b)) => a > b,
        _ => false,
    }
}
