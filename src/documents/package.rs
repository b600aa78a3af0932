//! Tool result packaging
//!
//! Every operation returns a [`ToolOutput`]. Generated files are read back,
//! base64 encoded and described by a [`FileBlock`] so they survive JSON transport.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DocumentError, Result};

/// Transport-safe representation of a generated file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileBlock {
    /// Standard base64 of the file content
    pub data: String,

    /// MIME type of the file
    pub mime_type: String,

    /// Base file name
    pub name: String,
}

impl FileBlock {
    /// Build a block from raw bytes
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            data: STANDARD.encode(bytes),
            mime_type: mime_type.into(),
            name: name.into(),
        }
    }

    /// Decode the payload back into bytes
    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD.decode(&self.data).map_err(|e| {
            crate::error::ValidationError::InvalidParameter {
                name: "data".to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }
}

/// Result of a single operation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// A JSON value passed through unchanged
    Plain(Value),

    /// Generated files; currently always exactly one
    Files(Vec<FileBlock>),
}

impl ToolOutput {
    /// The JSON payload sent to the caller
    pub fn to_json(&self) -> Value {
        match self {
            ToolOutput::Plain(value) => value.clone(),
            ToolOutput::Files(files) => Value::Array(
                files
                    .iter()
                    .map(|f| serde_json::to_value(f).unwrap_or(Value::Null))
                    .collect(),
            ),
        }
    }

    /// The payload as text content. Strings are sent verbatim, everything else as JSON.
    pub fn to_text(&self) -> String {
        match self {
            ToolOutput::Plain(Value::String(s)) => s.clone(),
            other => other.to_json().to_string(),
        }
    }
}

impl From<Value> for ToolOutput {
    fn from(value: Value) -> Self {
        ToolOutput::Plain(value)
    }
}

/// Read a file and package it as a single-element file result.
///
/// The source file is left in place.
pub fn package_file(path: &Path, mime_type: &str) -> Result<ToolOutput> {
    let bytes = std::fs::read(path).map_err(|source| DocumentError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(ToolOutput::Files(vec![FileBlock::from_bytes(
        &bytes, mime_type, name,
    )]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_package_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        let bytes: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        std::fs::write(&path, &bytes).unwrap();

        let output = package_file(&path, "application/octet-stream").unwrap();
        let ToolOutput::Files(files) = &output else {
            panic!("expected files");
        };
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "blob.bin");
        assert_eq!(files[0].decode().unwrap(), bytes);

        assert!(path.exists());
    }

    #[test]
    fn test_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.md");
        std::fs::write(&path, b"").unwrap();

        let output = package_file(&path, "text/markdown").unwrap();
        assert_eq!(
            output.to_json(),
            json!([{"data": "", "mime_type": "text/markdown", "name": "empty.md"}])
        );
    }

    #[test]
    fn test_missing_file_is_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = package_file(&dir.path().join("nope.pdf"), "application/pdf").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
    }

    #[test]
    fn test_plain_passthrough() {
        let value = json!({"current": {"temp_c": 21.0}});
        let output = ToolOutput::from(value.clone());
        assert_eq!(output.to_json(), value);
        assert_eq!(output.to_text(), value.to_string());

        assert_eq!(ToolOutput::Plain(json!("hello")).to_text(), "hello");
    }
}
