//! Output formatting for extraction results.
//!
//! Supports two output formats:
//! - Pretty: colored terminal summary for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};

use crate::model::{Forest, NodeKind};

// =============================================================================
// JSON Format
// =============================================================================

/// JSON report for one extraction run.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub source: String,
    pub entry_point: String,
    /// Path of the written file; absent with `--stdout`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub found: bool,
    /// "namespace" or "interface"; absent when the entry point was not found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_kind: Option<String>,
    pub declarations: Vec<JsonDeclaration>,
}

/// One extracted declaration.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDeclaration {
    pub name: String,
    pub kind: String,
    /// Properties or enum values.
    pub members: usize,
}

/// Build the JSON report for an extraction.
pub fn build_report(
    source: &str,
    entry_point: &str,
    output: Option<&str>,
    forest: &Forest,
) -> JsonReport {
    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        source: source.to_string(),
        entry_point: entry_point.to_string(),
        output: output.map(str::to_string),
        found: !forest.is_empty(),
        root_kind: forest.root().map(|r| r.kind.as_str().to_string()),
        declarations: declarations(forest),
    }
}

fn declarations(forest: &Forest) -> Vec<JsonDeclaration> {
    forest
        .definitions()
        .map(|(name, id)| {
            let node = forest.node(id);
            JsonDeclaration {
                name: name.to_string(),
                kind: declaration_kind(node.kind).to_string(),
                members: node.members.len(),
            }
        })
        .collect()
}

/// Display kind of a definition node.
fn declaration_kind(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Alias => "type",
        other => other.as_str(),
    }
}

/// Write the report in JSON format.
pub fn write_json(
    source: &str,
    entry_point: &str,
    output: Option<&str>,
    forest: &Forest,
) -> anyhow::Result<()> {
    let report = build_report(source, entry_point, output, forest);
    let json = serde_json::to_string_pretty(&report)?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write the report in pretty (human-readable) format.
///
/// Goes to stderr so that `--stdout` output stays clean.
pub fn write_pretty(source: &str, entry_point: &str, output: Option<&str>, forest: &Forest) {
    // Header
    eprintln!();
    eprint!("  ");
    eprint!("{}", "typeslice".cyan().bold());
    eprintln!(" v{}", env!("CARGO_PKG_VERSION"));
    eprintln!();

    eprint!("  {}", "Source:  ".dimmed());
    eprintln!("{}", source);
    eprint!("  {}", "Entry:   ".dimmed());
    eprintln!("{}", entry_point);
    if let Some(output) = output {
        eprint!("  {}", "Output:  ".dimmed());
        eprintln!("{}", output);
    }
    eprintln!();

    let Some(root) = forest.root() else {
        eprintln!("  {} entry point not found, nothing extracted", "✗".yellow());
        eprintln!();
        return;
    };

    eprintln!(
        "  {} found {} {}",
        "✓".green(),
        root.kind.as_str(),
        root.name.as_str().bold()
    );
    eprintln!();

    write_declarations(&declarations(forest));
    eprintln!();
}

fn write_declarations(declarations: &[JsonDeclaration]) {
    eprintln!("  {}", format!("{} declarations", declarations.len()).bold());
    for d in declarations {
        eprint!("    ");
        write_kind_tag(&d.kind);
        eprintln!(" {}", d.name);
    }
}

fn write_kind_tag(kind: &str) {
    let tag = format!("{:<9}", kind);
    match kind {
        "interface" => eprint!("{}", tag.blue()),
        "enum" => eprint!("{}", tag.magenta()),
        _ => eprint!("{}", tag.dimmed()),
    }
}
