//! Values written onto a certificate

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::FontId;
use crate::{CertificateError, Result};

/// Base size of the student name before fitting
pub const DEFAULT_FONT_SIZE: u16 = 48;

/// Body wording used when none is supplied
pub const DEFAULT_BODY_TEXT: &str =
    "A Direção do Colégio Estadual Cívico-Militar Gregório Szeremeta \n\
confere ao estudante o certificado de Menção Honrosa por ter alcançado \n\
o primeiro lugar do ano turma na Prova Paraná - 1ª edição de 2023.";

/// Field values for one certificate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldValues {
    pub student_name: String,
    /// Ceremony date as `YYYY-MM-DD`
    pub date: String,
    pub body_text: String,
    /// Font identifier for the student name
    pub name_font: String,
    /// Font identifier for the body text
    pub body_font: String,
    /// Name size before fit-to-width shrinking
    pub font_size: u16,
}

impl Default for FieldValues {
    fn default() -> Self {
        Self {
            student_name: String::new(),
            date: Utc::now().date_naive().format("%Y-%m-%d").to_string(),
            body_text: DEFAULT_BODY_TEXT.to_string(),
            name_font: FontId::DEFAULT.name().to_string(),
            body_font: FontId::DEFAULT.name().to_string(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl FieldValues {
    /// Default values for the given student
    pub fn new(student_name: &str) -> Self {
        Self {
            student_name: student_name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_date(mut self, iso: &str) -> Self {
        self.date = iso.to_string();
        self
    }

    pub fn with_calendar_date(mut self, date: NaiveDate) -> Self {
        self.date = date.format("%Y-%m-%d").to_string();
        self
    }

    pub fn with_body_text(mut self, text: &str) -> Self {
        self.body_text = text.to_string();
        self
    }

    pub fn with_name_font(mut self, font: &str) -> Self {
        self.name_font = font.to_string();
        self
    }

    pub fn with_body_font(mut self, font: &str) -> Self {
        self.body_font = font.to_string();
        self
    }

    pub fn with_font_size(mut self, size: u16) -> Self {
        self.font_size = size;
        self
    }

    /// Same values for a different student
    pub fn for_student(&self, student_name: &str) -> Self {
        Self {
            student_name: student_name.to_string(),
            ..self.clone()
        }
    }
}

/// Reorder an ISO `YYYY-MM-DD` date into `DD/MM/YYYY`
///
/// Only the shape is checked: three dash-separated groups of 4, 2 and 2
/// digits. `2023-02-31` is accepted and becomes `31/02/2023`.
pub fn format_date(iso: &str) -> Result<String> {
    let invalid = || CertificateError::InvalidDate(iso.to_string());

    let segments: Vec<&str> = iso.split('-').collect();
    let [year, month, day] = segments.as_slice() else {
        return Err(invalid());
    };

    let well_formed = [(year, 4), (month, 2), (day, 2)]
        .iter()
        .all(|(segment, len)| {
            segment.len() == *len && segment.bytes().all(|b| b.is_ascii_digit())
        });
    if !well_formed {
        return Err(invalid());
    }

    Ok(format!("{day}/{month}/{year}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2023-11-07").unwrap(), "07/11/2023");
        assert_eq!(format_date("1999-01-31").unwrap(), "31/01/1999");
    }

    #[test]
    fn test_format_date_no_calendar_check() {
        assert_eq!(format_date("2023-02-31").unwrap(), "31/02/2023");
    }

    #[test]
    fn test_format_date_invalid() {
        for input in [
            "",
            "2023/11/07",
            "2023-11",
            "2023-11-07-01",
            "23-11-07",
            "2023-1-07",
            "2023-ab-07",
            " 2023-11-07",
        ] {
            assert!(
                matches!(format_date(input), Err(CertificateError::InvalidDate(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_default_values() {
        let values = FieldValues::new("Ana");
        assert_eq!(values.student_name, "Ana");
        assert_eq!(values.font_size, 48);
        assert_eq!(values.name_font, "DejaVuSans");
        assert_eq!(values.body_font, "DejaVuSans");
        assert_eq!(values.body_text.lines().count(), 3);
        assert!(format_date(&values.date).is_ok());
    }

    #[test]
    fn test_calendar_date() {
        let date = NaiveDate::from_ymd_opt(2023, 11, 7).unwrap();
        let values = FieldValues::new("Ana").with_calendar_date(date);
        assert_eq!(values.date, "2023-11-07");
    }

    #[test]
    fn test_for_student_keeps_other_fields() {
        let values = FieldValues::new("Ana")
            .with_name_font("TomNR")
            .with_font_size(36);
        let other = values.for_student("Beto");

        assert_eq!(other.student_name, "Beto");
        assert_eq!(other.name_font, "TomNR");
        assert_eq!(other.font_size, 36);
    }

    #[test]
    fn test_deserialize_partial() {
        let values: FieldValues =
            serde_json::from_str(r#"{"studentName": "Cid", "date": "2024-03-01", "fontSize": 30}"#)
                .unwrap();
        assert_eq!(values.student_name, "Cid");
        assert_eq!(values.date, "2024-03-01");
        assert_eq!(values.font_size, 30);
        assert_eq!(values.body_text, DEFAULT_BODY_TEXT);
    }
}
