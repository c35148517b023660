use std::ops::Range;
use std::path::PathBuf;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use thiserror::Error;

/// Failures while reading a site's page index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("cannot read index '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The index is not a JSON array of page records.
    #[error("invalid index: {message}")]
    Syntax { message: String, span: Range<usize> },
}

impl IndexError {
    /// Build a syntax error from serde_json's 1-based line/column position.
    pub(crate) fn from_json(source: &str, err: serde_json::Error) -> Self {
        let offset = line_column_to_offset(source, err.line(), err.column());
        let end = (offset + 1).min(source.len()).max(offset);
        IndexError::Syntax {
            message: strip_position(&err.to_string()),
            span: offset..end,
        }
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self, file_id: usize) -> Diagnostic<usize> {
        match self {
            IndexError::Io { .. } => Diagnostic::error().with_message(self.to_string()),
            IndexError::Syntax { message, span } => Diagnostic::error()
                .with_message("invalid page index")
                .with_labels(vec![
                    Label::primary(file_id, span.clone()).with_message(message.clone()),
                ])
                .with_notes(vec![
                    "expected an array of {permalink, title, htmlString} records".to_string(),
                ]),
        }
    }
}

fn line_column_to_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    let mut offset = (line_start + column.saturating_sub(1)).min(source.len());
    while offset > 0 && !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// serde_json appends " at line X column Y"; the span already says that.
fn strip_position(message: &str) -> String {
    match message.rfind(" at line ") {
        Some(pos) => message[..pos].to_string(),
        None => message.to_string(),
    }
}
