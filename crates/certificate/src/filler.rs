//! Template filling

use pdf_core::{Color, PdfDocument, StandardFont};
use tracing::debug;

use crate::catalog::{AssetSource, FontCatalog, FontId};
use crate::fields::{format_date, FieldValues};
use crate::layout::CertificateLayout;
use crate::{CertificateError, Result};

/// Only the first page of the template is written to
const TARGET_PAGE: usize = 1;

/// Resource name of the page's default font, used for the date
const PAGE_DEFAULT_FONT: &str = "Helvetica";

/// A filled certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCertificate {
    pdf: Vec<u8>,
    name_font_size: u16,
}

impl GeneratedCertificate {
    /// The serialized PDF
    pub fn as_bytes(&self) -> &[u8] {
        &self.pdf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.pdf
    }

    /// Size the student name was drawn at after fitting
    pub fn name_font_size(&self) -> u16 {
        self.name_font_size
    }
}

/// Fill a template with one student's values
///
/// `template` is never modified; every call parses it afresh. Font bytes are
/// fetched from `source` using the paths in `layout.fonts`.
pub fn fill<S: AssetSource + ?Sized>(
    template: &[u8],
    source: &S,
    layout: &CertificateLayout,
    values: &FieldValues,
) -> Result<GeneratedCertificate> {
    let mut doc = PdfDocument::open_from_bytes(template)
        .map_err(|e| CertificateError::TemplateLoad(e.to_string()))?;
    if doc.page_count() == 0 {
        return Err(CertificateError::TemplateLoad("template has no pages".to_string()));
    }

    let date = format_date(&values.date)?;

    let name_font = load_font(&mut doc, &values.name_font, &layout.fonts, source)?;
    let body_font = load_font(&mut doc, &values.body_font, &layout.fonts, source)?;

    let unit_width = doc.text_width(name_font.name(), &values.student_name, 1.0)?;
    let name_size = layout.name.fit(unit_width, values.font_size);
    debug!(
        student = %values.student_name,
        font = %name_font,
        base_size = values.font_size,
        fitted_size = name_size,
        "fitted name"
    );

    doc.set_text_color(Color::black());

    let name = &layout.name.position;
    doc.set_font(name_font.name(), f32::from(name_size))?;
    doc.insert_text(&values.student_name, TARGET_PAGE, name.x, name.y)?;

    let date_pos = &layout.date.position;
    doc.add_standard_font(PAGE_DEFAULT_FONT, StandardFont::Helvetica)?;
    doc.set_font(PAGE_DEFAULT_FONT, layout.date.size)?;
    doc.insert_text(&date, TARGET_PAGE, date_pos.x, date_pos.y)?;

    let body = &layout.body.position;
    doc.set_font(body_font.name(), layout.body.size)?;
    doc.set_line_height(layout.body.line_height);
    doc.insert_text(&values.body_text, TARGET_PAGE, body.x, body.y)?;

    let pdf = doc.to_bytes()?;
    debug!(student = %values.student_name, bytes = pdf.len(), "filled certificate");

    Ok(GeneratedCertificate {
        pdf,
        name_font_size: name_size,
    })
}

/// Resolve a font identifier and embed the font unless it already is
fn load_font<S: AssetSource + ?Sized>(
    doc: &mut PdfDocument,
    identifier: &str,
    catalog: &FontCatalog,
    source: &S,
) -> Result<FontId> {
    let font = FontId::resolve(identifier);
    if doc.has_font(font.name()) {
        return Ok(font);
    }

    let data = catalog.fetch(font, source)?;
    doc.add_font(font.name(), &data)
        .map_err(|e| CertificateError::FontLoad {
            font: font.name().to_string(),
            reason: e.to_string(),
        })?;

    Ok(font)
}

/// Fills certificates from a template and fonts held by an asset source
#[derive(Debug, Clone)]
pub struct TemplateFiller<S> {
    source: S,
    layout: CertificateLayout,
}

impl<S: AssetSource> TemplateFiller<S> {
    /// Filler using the default layout
    pub fn new(source: S) -> Self {
        Self::with_layout(source, CertificateLayout::default())
    }

    pub fn with_layout(source: S, layout: CertificateLayout) -> Self {
        Self { source, layout }
    }

    pub fn layout(&self) -> &CertificateLayout {
        &self.layout
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch the template bytes from the source
    pub fn template(&self) -> Result<Vec<u8>> {
        debug!(path = %self.layout.template, "fetching template");
        self.source
            .fetch(&self.layout.template)
            .map_err(|e| CertificateError::TemplateLoad(format!("{}: {e}", self.layout.template)))
    }

    /// Generate one certificate
    pub fn generate(&self, values: &FieldValues) -> Result<GeneratedCertificate> {
        let template = self.template()?;
        fill(&template, &self.source, &self.layout, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemorySource;

    #[test]
    fn test_fill_rejects_garbage_template() {
        let source = MemorySource::new();
        let err = fill(
            b"definitely not a pdf",
            &source,
            &CertificateLayout::default(),
            &FieldValues::new("Ana"),
        )
        .unwrap_err();
        assert!(matches!(err, CertificateError::TemplateLoad(_)));
    }

    #[test]
    fn test_filler_missing_template() {
        let filler = TemplateFiller::new(MemorySource::new());
        let err = filler.generate(&FieldValues::new("Ana")).unwrap_err();

        match err {
            CertificateError::TemplateLoad(message) => assert!(message.contains("template.pdf")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
