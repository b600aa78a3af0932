//! Document generation
//!
//! Filename policy, format renderers and the packaging of generated files
//! into transport-safe tool results.

pub mod filename;
pub mod package;
pub mod render;

use std::path::PathBuf;

use crate::config::ServerConfig;
use crate::error::Result;

pub use filename::report_filename;
pub use package::{package_file, FileBlock, ToolOutput};

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Png,
    Markdown,
}

impl DocumentFormat {
    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Png => "png",
            DocumentFormat::Markdown => "md",
        }
    }

    /// MIME type reported in the file block
    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DocumentFormat::Png => "image/png",
            DocumentFormat::Markdown => "text/markdown",
        }
    }
}

/// Renders documents into the output directory and packages them
#[derive(Debug, Clone)]
pub struct DocumentGenerator {
    output_dir: PathBuf,
    font_paths: Vec<PathBuf>,
}

impl DocumentGenerator {
    /// Create a generator from the server configuration
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            font_paths: config.font_paths.clone(),
        }
    }

    /// Render `content` in `format`, write it to disk and package the file
    pub fn generate(
        &self,
        format: DocumentFormat,
        content: &str,
        file_name: Option<&str>,
    ) -> Result<ToolOutput> {
        let now = chrono::Local::now().naive_local();
        let name = report_filename(file_name, format.extension(), now)?;
        let path = self.output_dir.join(&name);

        match format {
            DocumentFormat::Pdf => render::write_pdf(&path, content)?,
            DocumentFormat::Docx => render::write_docx(&path, content)?,
            DocumentFormat::Png => render::write_png(&path, content, &self.font_paths)?,
            DocumentFormat::Markdown => render::write_markdown(&path, content, now)?,
        }

        tracing::info!(path = %path.display(), "Generated document");
        package_file(&path, format.mime_type())
    }
}
