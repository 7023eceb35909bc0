//! Template Expansion
//!
//! Templates are rendered with an empty context: only what the engine
//! provides by itself (loops, `range`, filters) is available.

use log::info;
use minijinja::{context, Environment, UndefinedBehavior};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PrepareError;
use crate::sources::SuffixRules;

/// Text templating engine used to expand template files
pub trait TemplateEngine {
    fn name(&self) -> &'static str;

    /// Render `source`, loaded from `path`, with no external context.
    fn render(&self, path: &Path, source: &str) -> Result<String, PrepareError>;
}

/// Jinja2-syntax templates via minijinja
#[derive(Debug, Clone, Copy, Default)]
pub struct MinijinjaEngine;

impl TemplateEngine for MinijinjaEngine {
    fn name(&self) -> &'static str {
        "minijinja"
    }

    fn render(&self, path: &Path, source: &str) -> Result<String, PrepareError> {
        let name = path.display().to_string();
        let template_error = |e: minijinja::Error| PrepareError::Template {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        let template = env
            .template_from_named_str(&name, source)
            .map_err(template_error)?;
        template.render(context! {}).map_err(template_error)
    }
}

/// Expand a template file next to itself, dropping the template marker
/// from its name. Any existing file of that name is overwritten.
pub fn expand(
    template: &Path,
    rules: &SuffixRules,
    engine: Option<&dyn TemplateEngine>,
) -> Result<PathBuf, PrepareError> {
    let engine = engine.ok_or_else(|| {
        PrepareError::MissingDependency("a template engine is required to expand templates".into())
    })?;

    let output = rules.expanded_path(template)?;
    let source = fs::read_to_string(template).map_err(|e| PrepareError::io(template, e))?;
    let content = engine.render(template, &source)?;
    fs::write(&output, content).map_err(|e| PrepareError::io(&output, e))?;

    info!("Expanded {} with {} -> {}", template.display(), engine.name(), output.display());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const TEMPLATE: &str = "{% for t in ['float', 'double'] %}def f_{{ t }}(): pass\n{% endfor %}";

    #[test]
    fn test_expand_writes_source() {
        let dir = tempdir().unwrap();
        let template = dir.path().join("_ops.pyx.in");
        fs::write(&template, TEMPLATE).unwrap();

        let output = expand(&template, &SuffixRules::default(), Some(&MinijinjaEngine)).unwrap();

        assert_eq!(output, dir.path().join("_ops.pyx"));
        let content = fs::read_to_string(&output).unwrap();
        assert_eq!(content, "def f_float(): pass\ndef f_double(): pass\n");
    }

    #[test]
    fn test_expand_is_idempotent() {
        let dir = tempdir().unwrap();
        let template = dir.path().join("_ops.pyx.in");
        fs::write(&template, "{% for i in range(3) %}{{ i }},{% endfor %}\n").unwrap();
        let rules = SuffixRules::default();

        let first = fs::read(expand(&template, &rules, Some(&MinijinjaEngine)).unwrap()).unwrap();
        let second = fs::read(expand(&template, &rules, Some(&MinijinjaEngine)).unwrap()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, b"0,1,2,\n");
    }

    #[test]
    fn test_expand_overwrites_existing() {
        let dir = tempdir().unwrap();
        let template = dir.path().join("a.pyx.in");
        fs::write(&template, "fresh\n").unwrap();
        fs::write(dir.path().join("a.pyx"), "stale contents").unwrap();

        expand(&template, &SuffixRules::default(), Some(&MinijinjaEngine)).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("a.pyx")).unwrap(), "fresh\n");
    }

    #[test]
    fn test_expand_rejects_wrong_suffix() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("b.pyx");
        fs::write(&source, "pass\n").unwrap();

        let err = expand(&source, &SuffixRules::default(), Some(&MinijinjaEngine)).unwrap_err();
        assert!(matches!(err, PrepareError::InvalidInput(_)));
    }

    #[test]
    fn test_expand_without_engine() {
        let dir = tempdir().unwrap();
        let template = dir.path().join("a.pyx.in");
        fs::write(&template, "pass\n").unwrap();

        let err = expand(&template, &SuffixRules::default(), None).unwrap_err();
        assert!(matches!(err, PrepareError::MissingDependency(_)));
        assert!(!dir.path().join("a.pyx").exists());
    }

    #[test]
    fn test_undefined_name_is_an_error() {
        let err = MinijinjaEngine
            .render(Path::new("x.pyx.in"), "{{ dtype }}")
            .unwrap_err();
        assert!(matches!(err, PrepareError::Template { .. }));
    }
}
