//! YAML error diagnostics for catalog and request documents

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// YAML syntax or shape error with source location
#[derive(Debug, Error, Diagnostic)]
#[error("{document} could not be parsed: {message}")]
#[diagnostic(code(est::yaml::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    document: String,

    /// The underlying error message
    message: String,
}

impl YamlSyntaxError {
    /// Build a diagnostic from a serde_yml error
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));

        let offset = line_col_to_offset(source, line, column);
        let message = err.to_string();
        let help = generate_help(&message);

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help,
            document: filename.to_string(),
            message,
        }
    }
}

/// Error reading or parsing a YAML document from disk
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("Failed to read {path}: {source}")]
    #[diagnostic(code(est::yaml::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convert a 1-based line/column pair to a byte offset
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    let mut current_line = 1;

    for (i, ch) in source.char_indices() {
        if current_line == line {
            let mut col = 1;
            for (j, c) in source[i..].char_indices() {
                if col == column {
                    return i + j;
                }
                if c == '\n' {
                    break;
                }
                col += 1;
            }
            return i;
        }
        if ch == '\n' {
            current_line += 1;
        }
        offset = i;
    }

    offset
}

/// Suggest a fix for the most common mistakes in catalogs and requests
fn generate_help(message: &str) -> Option<String> {
    let msg_lower = message.to_lowercase();

    if msg_lower.contains("tab") {
        return Some("Indent with spaces, not tabs.".to_string());
    }

    if msg_lower.contains("duplicate") {
        return Some("Each key may appear once. Catalog keys must be unique per table.".to_string());
    }

    if msg_lower.contains("unknown variant") {
        return Some(
            "Check the spelling of enumerated values (e.g. `policy: flat_rate`, `type: per_screen`)."
                .to_string(),
        );
    }

    if msg_lower.contains("missing field") {
        return Some("A required field is absent; compare against a built-in catalog.".to_string());
    }

    if msg_lower.contains("invalid type") {
        return Some("Numbers must not be quoted; lists use `[a, b]` or `- a` entries.".to_string());
    }

    if msg_lower.contains("mapping values are not allowed") {
        return Some("You may be missing a space after ':' or have inconsistent indentation.".to_string());
    }

    None
}
