//! Certificate - fills a PDF certificate template
//!
//! This crate provides:
//! - A catalog of the selectable certificate fonts and where to fetch them
//! - Field values (student name, ceremony date, body text, fonts, size)
//! - Layout configuration with the fixed overlay positions
//! - Fit-to-width sizing for the student name
//! - Filling a template and batch generation over a comma-separated name list
//!
//! # Example
//!
//! ```ignore
//! use certificate::{DirSource, FieldValues, TemplateFiller};
//!
//! let filler = TemplateFiller::new(DirSource::new("public"));
//! let values = FieldValues::new("Ana").with_date("2023-11-07");
//! let certificate = filler.generate(&values)?;
//! std::fs::write("certificado_Ana.pdf", certificate.as_bytes())?;
//! ```

mod batch;
mod catalog;
mod fields;
mod filler;
mod layout;

pub use batch::{
    certificate_file_name, generate_batch, parse_names, preview, BatchEntry, BatchFailure,
    BatchReport,
};
pub use catalog::{AssetSource, DirSource, FontCatalog, FontId, MemorySource};
pub use fields::{format_date, FieldValues, DEFAULT_BODY_TEXT, DEFAULT_FONT_SIZE};
pub use filler::{fill, GeneratedCertificate, TemplateFiller};
pub use layout::{fit_font_size, BodyField, CertificateLayout, DateField, NameField, Position};

use thiserror::Error;

/// Errors that can occur while generating a certificate
#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("Failed to load template: {0}")]
    TemplateLoad(String),

    #[error("Failed to load font {font}: {reason}")]
    FontLoad { font: String, reason: String },

    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid layout: {0}")]
    Layout(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_core::PdfError),
}

/// Result type for certificate operations
pub type Result<T> = std::result::Result<T, CertificateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CertificateError::FontLoad {
            font: "TomNR".to_string(),
            reason: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to load font TomNR: not found");
        assert_eq!(
            CertificateError::InvalidDate("2023/11/07".to_string()).to_string(),
            "Invalid date '2023/11/07': expected YYYY-MM-DD"
        );
    }
}
