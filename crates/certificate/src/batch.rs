//! Batch generation over a comma-separated list of names

use tracing::{info, warn};

use crate::catalog::AssetSource;
use crate::fields::FieldValues;
use crate::filler::{GeneratedCertificate, TemplateFiller};
use crate::{CertificateError, Result};

/// Split a comma-separated list into trimmed, non-empty names
pub fn parse_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Download file name for a student's certificate
pub fn certificate_file_name(name: &str) -> String {
    format!("certificado_{name}.pdf")
}

/// A certificate produced for one name of a batch
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub name: String,
    pub file_name: String,
    pub certificate: GeneratedCertificate,
}

/// A name of a batch that could not be generated
#[derive(Debug)]
pub struct BatchFailure {
    pub name: String,
    pub error: CertificateError,
}

/// Outcome of a batch, in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub certificates: Vec<BatchEntry>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.certificates.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run `generate` once per name in `names`
///
/// Each name gets a copy of `values` with only the student name replaced.
/// A failing name is recorded and the batch moves on.
pub fn generate_batch<F>(names: &str, values: &FieldValues, mut generate: F) -> BatchReport
where
    F: FnMut(&FieldValues) -> Result<GeneratedCertificate>,
{
    let mut report = BatchReport::default();

    for name in parse_names(names) {
        match generate(&values.for_student(&name)) {
            Ok(certificate) => report.certificates.push(BatchEntry {
                file_name: certificate_file_name(&name),
                name,
                certificate,
            }),
            Err(error) => {
                warn!(student = %name, %error, "skipping certificate");
                report.failures.push(BatchFailure { name, error });
            }
        }
    }

    info!(
        generated = report.certificates.len(),
        failed = report.failures.len(),
        "batch finished"
    );
    report
}

/// Generate the certificate for the first name in `names` only
///
/// Returns `None` when the list holds no names.
pub fn preview<F>(
    names: &str,
    values: &FieldValues,
    generate: F,
) -> Result<Option<GeneratedCertificate>>
where
    F: FnOnce(&FieldValues) -> Result<GeneratedCertificate>,
{
    match parse_names(names).first() {
        Some(first) => generate(&values.for_student(first)).map(Some),
        None => Ok(None),
    }
}

impl<S: AssetSource> TemplateFiller<S> {
    /// Generate one certificate per comma-separated name
    pub fn generate_batch(&self, names: &str, values: &FieldValues) -> BatchReport {
        generate_batch(names, values, |values| self.generate(values))
    }

    /// Generate the certificate of the first listed name
    pub fn preview(
        &self,
        names: &str,
        values: &FieldValues,
    ) -> Result<Option<GeneratedCertificate>> {
        preview(names, values, |values| self.generate(values))
    }
}
