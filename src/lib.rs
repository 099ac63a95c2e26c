//! Typeslice - entry-point declaration extractor for TypeScript.
//!
//! Typeslice reads a TypeScript source, finds one named declaration (the
//! entry point) and writes a standalone declaration file containing it and
//! every type it transitively references.
//!
//! # Architecture
//!
//! - `graph`: the `TypeGraphProvider` seam and its tree-sitter implementation
//! - `extract`: root-gated walker and the `.d.ts` renderer
//! - `model`: arena forest of extracted nodes with a name-keyed registry
//! - `config`: YAML configuration
//! - `report`: run summaries (pretty, JSON)
//! - `cli`: command-line entry points
//!
//! # Example
//!
//! ```no_run
//! use typeslice::extract::{extract_source, ExtractOptions, RenderOptions};
//!
//! let source = std::fs::read_to_string("api.ts")?;
//! let extraction = extract_source(
//!     "api.ts",
//!     source,
//!     "IntStudent",
//!     &ExtractOptions::default(),
//!     &RenderOptions::default(),
//! )?;
//! print!("{}", extraction.output);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod extract;
pub mod graph;
pub mod model;
pub mod report;

pub use config::Config;
pub use extract::{extract, render, ExtractError, ExtractOptions, IgnoreList, RenderOptions};
pub use graph::{DeclarationKind, Syntax, TypeGraphProvider};
pub use model::{ExtractedNode, Forest, NodeId, NodeKind, Primitive, Root, RootKind};

#[cfg(feature = "tree-sitter")]
pub use extract::extract_source;
#[cfg(feature = "tree-sitter")]
pub use graph::{ParsedSource, SourceSet, TypeScriptGraph};
