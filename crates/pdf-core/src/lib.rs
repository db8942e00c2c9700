//! PDF Core - Low-level PDF manipulation
//!
//! This crate provides functionality for:
//! - Opening and saving PDF documents
//! - Embedding TrueType fonts and referencing the standard Helvetica font
//! - Measuring text
//! - Inserting single and multi-line text at specific coordinates
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::PdfDocument;
//!
//! let mut doc = PdfDocument::open("template.pdf")?;
//! doc.add_font("dejavu", include_bytes!("fonts/DejaVuSans.ttf"))?;
//! doc.set_font("dejavu", 48.0)?;
//! doc.insert_text("Hello, World!", 1, 99.0, 180.0)?;
//! doc.save("output.pdf")?;
//! ```

mod document;
mod font;
mod text;

pub use document::{Color, PdfDocument};
pub use font::{FontData, FontObjects, StandardFont};
pub use text::{generate_text_operators, split_lines, TextRenderContext};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Font not found: {0}")]
    FontNotFound(String),

    #[error("Font already exists: {0}")]
    FontAlreadyExists(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;
