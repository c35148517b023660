pub mod error;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use error::IndexError;

/// One rendered page as exported by the site generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub permalink: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "htmlString", default)]
    pub html_string: String,
}

impl Page {
    pub fn new(
        permalink: impl Into<String>,
        title: impl Into<String>,
        html_string: impl Into<String>,
    ) -> Self {
        Page {
            permalink: permalink.into(),
            title: title.into(),
            html_string: html_string.into(),
        }
    }
}

/// Parse the JSON page index. Fields other than the three above are ignored.
pub fn load_pages(source: &str) -> Result<Vec<Page>, IndexError> {
    serde_json::from_str(source).map_err(|e| IndexError::from_json(source, e))
}

/// Read and parse a page index file.
pub fn read_index(path: &Path) -> Result<Vec<Page>, IndexError> {
    let source = std::fs::read_to_string(path).map_err(|source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_pages(&source)
}
