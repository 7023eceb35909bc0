//! ExtGen Core - Extension Source Preparer
//!
//! Regenerates compiled-language sources for native extension modules:
//! 1. Templates are expanded into extension sources
//! 2. Extension sources are translated by an external toolchain
//! 3. Without a usable toolchain, pre-built translated sources are used as-is

pub mod error;
pub mod sources;
pub mod toolchain;
pub mod templating;
pub mod hashing;
pub mod preparer;

pub use error::PrepareError;
pub use sources::{SourceKind, SuffixRules};
pub use toolchain::{CommandTranslator, Translator, parse_loose_version};
pub use templating::{expand, MinijinjaEngine, TemplateEngine};
pub use hashing::sha256_hex;
pub use preparer::{GeneratedFile, PrepareConfig, PrepareOutcome, SourcePreparer};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const MIN_TRANSLATOR_VERSION: &str = "0.23.4";
