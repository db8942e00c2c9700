//! Overlay layout configuration
//!
//! Every field has a default matching the stock certificate template, so an
//! empty JSON object is a valid layout.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::FontCatalog;
use crate::{CertificateError, Result};

/// Position in PDF coordinates (points, origin bottom-left)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Where and how the student name is drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NameField {
    pub position: Position,
    /// Widest the name may be, in points
    pub max_width: f64,
    /// Smallest size shrinking may reach
    pub min_size: u16,
}

impl Default for NameField {
    fn default() -> Self {
        Self {
            position: Position::new(99.0, 180.0),
            max_width: 400.0,
            min_size: 10,
        }
    }
}

impl NameField {
    /// Fit a name whose width at size 1 is `unit_width` points
    pub fn fit(&self, unit_width: f64, base_size: u16) -> u16 {
        fit_font_size(
            |size| unit_width * f64::from(size),
            base_size,
            self.max_width,
            self.min_size,
        )
    }
}

/// Where and how the date is drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateField {
    pub position: Position,
    pub size: f32,
}

impl Default for DateField {
    fn default() -> Self {
        Self {
            position: Position::new(99.0, 82.0),
            size: 21.0,
        }
    }
}

/// Where and how the body text is drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BodyField {
    pub position: Position,
    pub size: f32,
    /// Distance between consecutive baselines
    pub line_height: f32,
}

impl Default for BodyField {
    fn default() -> Self {
        Self {
            position: Position::new(99.0, 340.0),
            size: 16.0,
            line_height: 24.0,
        }
    }
}

/// Template path, font paths and field placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateLayout {
    /// Path of the template PDF within the asset source
    pub template: String,
    pub fonts: FontCatalog,
    pub name: NameField,
    pub date: DateField,
    pub body: BodyField,
}

impl Default for CertificateLayout {
    fn default() -> Self {
        Self {
            template: "template.pdf".to_string(),
            fonts: FontCatalog::default(),
            name: NameField::default(),
            date: DateField::default(),
            body: BodyField::default(),
        }
    }
}

impl CertificateLayout {
    /// Parse a layout from JSON, filling omitted fields with defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let layout: Self =
            serde_json::from_str(json).map_err(|e| CertificateError::Layout(e.to_string()))?;
        layout.validate()?;
        debug!(template = %layout.template, "loaded layout");
        Ok(layout)
    }

    fn validate(&self) -> Result<()> {
        if self.template.is_empty() {
            return Err(CertificateError::Layout("template path is empty".to_string()));
        }
        if self.name.max_width.is_nan() || self.name.max_width <= 0.0 {
            return Err(CertificateError::Layout(format!(
                "name max width must be positive, got {}",
                self.name.max_width
            )));
        }
        if self.date.size <= 0.0 || self.body.size <= 0.0 {
            return Err(CertificateError::Layout("font sizes must be positive".to_string()));
        }
        Ok(())
    }
}

/// Shrink a font size until the measured width fits
///
/// Starting at `base_size`, the size drops one point at a time while
/// `measure(size)` exceeds `max_width` and the size is above `min_size`.
/// A base size at or below `min_size` is returned unchanged.
pub fn fit_font_size<F>(measure: F, base_size: u16, max_width: f64, min_size: u16) -> u16
where
    F: Fn(u16) -> f64,
{
    let mut size = base_size;
    while measure(size) > max_width && size > min_size {
        size -= 1;
    }
    size
}
