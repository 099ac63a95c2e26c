//! Extraction driver: root-gated walk followed by rendering.
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────┐     ┌───────────────┐
//! │ TypeGraph       │────▶│ Walker       │────▶│ Forest        │
//! │ Provider        │     │ (root gate,  │     │ (registry,    │
//! └─────────────────┘     │  cycles)     │     │  type slots)  │
//!                         └──────────────┘     └───────────────┘
//!                                                      │
//!                                                      ▼
//!                                              ┌───────────────┐
//!                                              │ Renderer      │
//!                                              │ (.d.ts text)  │
//!                                              └───────────────┘
//! ```

mod render;
mod walker;

pub use render::{render, RenderOptions};
pub use walker::Walker;

use globset::{Glob, GlobSet, GlobSetBuilder};
use thiserror::Error;
use tracing::{debug, warn};

use crate::graph::TypeGraphProvider;
use crate::model::Forest;

/// Interface names skipped unless configured otherwise.
pub const DEFAULT_IGNORED_INTERFACES: &[&str] = &["Array", "ConcatArray", "Console"];

/// Errors that abort an extraction run.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("no active container to attach to (traversal bug)")]
    NoActiveContainer,
    #[error("entry point {0:?} not found")]
    EntryPointNotFound(String),
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Interface names that are never extracted, matched as glob patterns.
#[derive(Debug, Clone)]
pub struct IgnoreList {
    patterns: Vec<String>,
    set: GlobSet,
}

impl IgnoreList {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern.as_ref())?);
        }
        Ok(Self {
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
            set: builder.build()?,
        })
    }

    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.set.is_match(name)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Default for IgnoreList {
    fn default() -> Self {
        // The defaults are literal names, which always compile.
        Self::new(DEFAULT_IGNORED_INTERFACES).unwrap_or_else(|_| Self::empty())
    }
}

/// Options for the walk phase.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub ignored: IgnoreList,
    /// Treat a missing entry point as an error.
    pub strict: bool,
}

/// Walk the provider's top-level nodes until the entry point is found and
/// return everything collected from it.
///
/// A missing entry point yields an empty forest unless `options.strict`.
pub fn extract<P: TypeGraphProvider>(
    provider: &P,
    entry_point: &str,
    options: &ExtractOptions,
) -> Result<Forest, ExtractError> {
    let mut walker = Walker::new(provider, entry_point, options);

    for node in provider.top_level() {
        if walker.root_found() {
            break;
        }
        walker.visit(node)?;
    }

    let forest = walker.finish();
    if forest.is_empty() {
        if options.strict {
            return Err(ExtractError::EntryPointNotFound(entry_point.to_string()));
        }
        warn!(entry_point, "entry point not found, output will be empty");
    } else {
        debug!(
            definitions = forest.definition_count(),
            nodes = forest.node_count(),
            "extraction finished"
        );
    }

    Ok(forest)
}

/// Result of slicing one entry point out of a source.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub forest: Forest,
    pub output: String,
}

/// Parse TypeScript `source`, extract `entry_point` and render the result.
///
/// Relative imports are resolved against the directory of `path`.
#[cfg(feature = "tree-sitter")]
pub fn extract_source(
    path: &str,
    source: String,
    entry_point: &str,
    extract_options: &ExtractOptions,
    render_options: &RenderOptions,
) -> Result<Extraction, ExtractError> {
    use crate::graph::{ParsedSource, SourceSet, TypeScriptGraph};

    let parsed = ParsedSource::parse(path, source).map_err(|e| ExtractError::Parse {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    let sources = SourceSet::with_imports(parsed).map_err(|e| ExtractError::Parse {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    let graph = TypeScriptGraph::new(&sources).map_err(|e| ExtractError::Parse {
        path: path.to_string(),
        message: e.to_string(),
    })?;

    let forest = extract(&graph, entry_point, extract_options)?;
    let output = render(&forest, render_options);
    Ok(Extraction { forest, output })
}
