//! WASM bindings for certificate-filler
//!
//! This crate provides JavaScript-friendly API for:
//! - Loading the certificate template and fonts fetched by the page
//! - Generating one certificate, a preview, or a batch of certificates
//! - Date formatting and name-list parsing helpers
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { CertificateFiller } from 'certificate-wasm';
//!
//! await init();
//!
//! const filler = new CertificateFiller();
//! filler.loadTemplate(new Uint8Array(await (await fetch('/template.pdf')).arrayBuffer()));
//! for (const id of CertificateFiller.fontIdentifiers()) {
//!   filler.loadFont(id, fontBytes[id]);
//! }
//!
//! const values = { date: '2023-11-07', nameFont: 'ScriptMTBold', fontSize: 48 };
//! const preview = filler.preview('Ana,Beto,Cid', values);
//! const { certificates, failures } = filler.generateBatch('Ana,Beto,Cid', values);
//! ```

use std::collections::BTreeMap;

use certificate::{
    CertificateLayout, FieldValues, FontId, GeneratedCertificate, MemorySource,
};
use js_sys::{Array, Object, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;

// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn to_js_error(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn set(target: &Object, key: &str, value: &JsValue) -> Result<(), JsValue> {
    Reflect::set(target, &JsValue::from_str(key), value)?;
    Ok(())
}

/// Certificate generator
#[wasm_bindgen]
pub struct CertificateFiller {
    template: Option<Vec<u8>>,
    fonts: BTreeMap<FontId, Vec<u8>>,
    layout: CertificateLayout,
    /// Fonts stored under the paths of the current layout
    assets: MemorySource,
}

#[wasm_bindgen]
impl CertificateFiller {
    /// Create a filler with the default layout and nothing loaded
    #[wasm_bindgen(constructor)]
    pub fn new() -> CertificateFiller {
        CertificateFiller {
            template: None,
            fonts: BTreeMap::new(),
            layout: CertificateLayout::default(),
            assets: MemorySource::new(),
        }
    }

    /// Load the template PDF
    ///
    /// @param data - PDF file bytes (Uint8Array)
    #[wasm_bindgen(js_name = loadTemplate)]
    pub fn load_template(&mut self, data: &[u8]) {
        self.template = Some(data.to_vec());
    }

    /// Load a font
    ///
    /// @param identifier - One of `fontIdentifiers()`
    /// @param data - TTF file bytes (Uint8Array)
    #[wasm_bindgen(js_name = loadFont)]
    pub fn load_font(&mut self, identifier: &str, data: &[u8]) -> Result<(), JsValue> {
        let id = FontId::from_name(identifier)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown font identifier: {identifier}")))?;
        self.fonts.insert(id, data.to_vec());
        self.rebuild_assets();
        Ok(())
    }

    /// Replace the layout
    ///
    /// @param json - Layout JSON; omitted fields keep their defaults
    #[wasm_bindgen(js_name = setLayout)]
    pub fn set_layout(&mut self, json: &str) -> Result<(), JsValue> {
        self.layout = CertificateLayout::from_json(json).map_err(to_js_error)?;
        self.rebuild_assets();
        Ok(())
    }

    /// Generate one certificate
    ///
    /// @param values - Field values (studentName, date, bodyText, nameFont, bodyFont, fontSize)
    /// @returns PDF bytes (Uint8Array)
    pub fn generate(&self, values: JsValue) -> Result<Vec<u8>, JsValue> {
        let values = field_values(values)?;
        self.fill(&values).map(GeneratedCertificate::into_bytes)
    }

    /// Generate the certificate of the first listed name
    ///
    /// @param names - Comma-separated names
    /// @param values - Field values shared by every name
    /// @returns PDF bytes, or undefined when no name is listed
    pub fn preview(&self, names: &str, values: JsValue) -> Result<Option<Vec<u8>>, JsValue> {
        let values = field_values(values)?;
        let template = self.template()?;
        certificate::preview(names, &values, |values| {
            certificate::fill(template, &self.assets, &self.layout, values)
        })
        .map(|certificate| certificate.map(GeneratedCertificate::into_bytes))
        .map_err(to_js_error)
    }

    /// Generate one certificate per comma-separated name
    ///
    /// @param names - Comma-separated names
    /// @param values - Field values shared by every name
    /// @returns { certificates: [{ name, fileName, pdf }], failures: [{ name, error }] }
    #[wasm_bindgen(js_name = generateBatch)]
    pub fn generate_batch(&self, names: &str, values: JsValue) -> Result<JsValue, JsValue> {
        let values = field_values(values)?;
        let template = self.template()?;
        let report = certificate::generate_batch(names, &values, |values| {
            certificate::fill(template, &self.assets, &self.layout, values)
        });

        let certificates = Array::new();
        for entry in &report.certificates {
            let item = Object::new();
            set(&item, "name", &JsValue::from_str(&entry.name))?;
            set(&item, "fileName", &JsValue::from_str(&entry.file_name))?;
            set(&item, "pdf", &Uint8Array::from(entry.certificate.as_bytes()).into())?;
            certificates.push(&item);
        }

        let failures = Array::new();
        for failure in &report.failures {
            let item = Object::new();
            set(&item, "name", &JsValue::from_str(&failure.name))?;
            set(&item, "error", &JsValue::from_str(&failure.error.to_string()))?;
            failures.push(&item);
        }

        let result = Object::new();
        set(&result, "certificates", &certificates)?;
        set(&result, "failures", &failures)?;
        Ok(result.into())
    }

    /// Format an ISO date as DD/MM/YYYY
    ///
    /// @param iso - Date as YYYY-MM-DD
    #[wasm_bindgen(js_name = formatDate)]
    pub fn format_date(iso: &str) -> Result<String, JsValue> {
        certificate::format_date(iso).map_err(to_js_error)
    }

    /// Split a comma-separated list into trimmed, non-empty names
    #[wasm_bindgen(js_name = parseNames)]
    pub fn parse_names(list: &str) -> Vec<JsValue> {
        certificate::parse_names(list)
            .into_iter()
            .map(|name| JsValue::from_str(&name))
            .collect()
    }

    /// Download file name for a student's certificate
    #[wasm_bindgen(js_name = fileName)]
    pub fn file_name(name: &str) -> String {
        certificate::certificate_file_name(name)
    }

    /// Identifiers accepted by `loadFont` and the font fields
    #[wasm_bindgen(js_name = fontIdentifiers)]
    pub fn font_identifiers() -> Vec<JsValue> {
        FontId::ALL
            .iter()
            .map(|id| JsValue::from_str(id.name()))
            .collect()
    }
}

impl CertificateFiller {
    fn template(&self) -> Result<&[u8], JsValue> {
        self.template
            .as_deref()
            .ok_or_else(|| JsValue::from_str("Template not loaded. Call loadTemplate() first."))
    }

    fn fill(&self, values: &FieldValues) -> Result<GeneratedCertificate, JsValue> {
        certificate::fill(self.template()?, &self.assets, &self.layout, values).map_err(to_js_error)
    }

    /// Store every loaded font under its path in the current layout
    fn rebuild_assets(&mut self) {
        let mut assets = MemorySource::new();
        for (id, data) in &self.fonts {
            if let Some(path) = self.layout.fonts.path(*id) {
                assets.insert(path, data.clone());
            }
        }
        self.assets = assets;
    }
}

impl Default for CertificateFiller {
    fn default() -> Self {
        Self::new()
    }
}

/// Read field values from JS, defaulting anything left out
fn field_values(values: JsValue) -> Result<FieldValues, JsValue> {
    if values.is_undefined() || values.is_null() {
        return Ok(FieldValues::default());
    }
    Ok(serde_wasm_bindgen::from_value(values)?)
}
