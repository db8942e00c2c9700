//! PDF Document wrapper

use crate::font::deflate;
use crate::text::{generate_text_operators, split_lines, TextRenderContext};
use crate::{FontData, PdfError, Result, StandardFont};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, warn};

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// A font registered with the document
#[derive(Debug, Clone)]
enum PdfFont {
    /// Embedded TrueType font
    TrueType(FontData),
    /// Viewer-provided base-14 font
    Standard(StandardFont),
}

impl PdfFont {
    fn text_width_points(&self, text: &str, font_size: f32) -> f64 {
        match self {
            PdfFont::TrueType(data) => data.text_width_points(text, font_size),
            PdfFont::Standard(font) => font.text_width_points(text, font_size),
        }
    }

    fn encode(&self, text: &str) -> String {
        match self {
            PdfFont::TrueType(data) => data.encode_text_hex(text),
            PdfFont::Standard(font) => font.encode_text(text),
        }
    }

    fn add_chars(&mut self, text: &str) {
        if let PdfFont::TrueType(data) = self {
            data.add_chars(text);
        }
    }

    /// Distinct characters of `text` the font cannot draw
    fn missing_glyphs(&self, text: &str) -> BTreeSet<char> {
        text.chars()
            .filter(|c| match self {
                PdfFont::TrueType(data) => !data.has_glyph(*c),
                PdfFont::Standard(font) => !font.has_glyph(*c),
            })
            .collect()
    }
}

/// PDF Document wrapper providing high-level operations
///
/// Drawing is buffered: text operators and font resources are collected per
/// page and written into the document by [`PdfDocument::to_bytes`] or
/// [`PdfDocument::save`], once the full set of characters per font is known.
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Registered fonts (name -> font)
    fonts: BTreeMap<String, PdfFont>,
    /// Current font name
    current_font: Option<String>,
    /// Current font size
    current_font_size: f32,
    /// Current line height for multi-line text
    current_line_height: f32,
    /// Current text color
    current_text_color: Color,
    /// Embedded fonts (font name -> PDF object ID)
    embedded_fonts: BTreeMap<String, ObjectId>,
    /// Page font resources (page number -> font name -> resource name)
    page_font_resources: BTreeMap<usize, BTreeMap<String, String>>,
    /// Next font resource number
    next_font_resource: u32,
    /// Buffered content operators per page (page number -> operators)
    page_content_buffer: BTreeMap<usize, Vec<u8>>,
}

impl PdfDocument {
    fn from_document(inner: Document) -> Self {
        Self {
            inner,
            fonts: BTreeMap::new(),
            current_font: None,
            current_font_size: 12.0,
            current_line_height: 24.0,
            current_text_color: Color::default(),
            embedded_fonts: BTreeMap::new(),
            page_font_resources: BTreeMap::new(),
            next_font_resource: 1,
            page_content_buffer: BTreeMap::new(),
        }
    }

    /// Open a PDF document from a file path
    ///
    /// # Example
    /// ```ignore
    /// let doc = PdfDocument::open("template.pdf")?;
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let inner = Document::load(path).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Ok(Self::from_document(inner))
    }

    /// Open a PDF document from bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        debug!(bytes = data.len(), "opening PDF");
        let inner = Document::load_mem(data).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Ok(Self::from_document(inner))
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    fn ensure_new_font(&self, name: &str) -> Result<()> {
        if self.fonts.contains_key(name) {
            return Err(PdfError::FontAlreadyExists(name.to_string()));
        }
        Ok(())
    }

    /// Add a TrueType font to the document
    ///
    /// The font is embedded at save time, and only if text was drawn with it.
    ///
    /// # Arguments
    /// * `name` - Font identifier (used in set_font)
    /// * `ttf_data` - TrueType font file bytes
    pub fn add_font(&mut self, name: &str, ttf_data: &[u8]) -> Result<()> {
        self.ensure_new_font(name)?;

        let font_data = FontData::from_ttf(name, ttf_data)?;
        self.fonts
            .insert(name.to_string(), PdfFont::TrueType(font_data));

        Ok(())
    }

    /// Add one of the standard fonts under the given identifier
    pub fn add_standard_font(&mut self, name: &str, font: StandardFont) -> Result<()> {
        self.ensure_new_font(name)?;
        self.fonts.insert(name.to_string(), PdfFont::Standard(font));
        Ok(())
    }

    /// Check whether a font identifier has been registered
    pub fn has_font(&self, name: &str) -> bool {
        self.fonts.contains_key(name)
    }

    /// Set the current font and size
    ///
    /// # Example
    /// ```ignore
    /// doc.add_font("dejavu", &ttf_bytes)?;
    /// doc.set_font("dejavu", 48.0)?;
    /// ```
    pub fn set_font(&mut self, name: &str, size: f32) -> Result<()> {
        if !self.fonts.contains_key(name) {
            return Err(PdfError::FontNotFound(name.to_string()));
        }

        self.current_font = Some(name.to_string());
        self.current_font_size = size;

        Ok(())
    }

    /// Set only the font size (keeps current font)
    pub fn set_font_size(&mut self, size: f32) -> Result<()> {
        if self.current_font.is_none() {
            return Err(PdfError::FontNotFound("No font set".to_string()));
        }

        self.current_font_size = size;
        Ok(())
    }

    /// Set the distance between baselines of multi-line text
    pub fn set_line_height(&mut self, line_height: f32) {
        self.current_line_height = line_height;
    }

    /// Set the text color
    ///
    /// # Example
    /// ```ignore
    /// doc.set_text_color(Color::black());
    /// doc.set_text_color(Color::from_rgb(255, 128, 0)); // Orange
    /// ```
    pub fn set_text_color(&mut self, color: Color) {
        self.current_text_color = color;
    }

    fn current_font_name(&self) -> Result<String> {
        self.current_font
            .clone()
            .ok_or_else(|| PdfError::FontNotFound("No font set".to_string()))
    }

    fn get_font(&self, name: &str) -> Result<&PdfFont> {
        self.fonts
            .get(name)
            .ok_or_else(|| PdfError::FontNotFound(name.to_string()))
    }

    /// Width in points of `text` drawn with a registered font at `size`
    pub fn text_width(&self, font: &str, text: &str, size: f32) -> Result<f64> {
        Ok(self.get_font(font)?.text_width_points(text, size))
    }

    /// Width in points of `text` in the current font and size
    ///
    /// # Example
    /// ```ignore
    /// doc.set_font("dejavu", 12.0)?;
    /// let width = doc.get_text_width("Hello")?;
    /// ```
    pub fn get_text_width(&self, text: &str) -> Result<f64> {
        let font_name = self.current_font_name()?;
        self.text_width(&font_name, text, self.current_font_size)
    }

    /// Insert text at a specific position
    ///
    /// Text containing line breaks is drawn one line below the other using
    /// the current line height.
    ///
    /// # Arguments
    /// * `text` - Text to insert
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate of the first baseline, in points from the left edge
    /// * `y` - Y coordinate of the first baseline, in points from the bottom edge
    pub fn insert_text(&mut self, text: &str, page: usize, x: f64, y: f64) -> Result<()> {
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(PdfError::InvalidPage(page, page_count));
        }

        if text.is_empty() {
            return Ok(());
        }

        let font_name = self.current_font_name()?;
        let lines = split_lines(text);

        let encoded: Vec<String> = {
            let font = self
                .fonts
                .get_mut(&font_name)
                .ok_or_else(|| PdfError::FontNotFound(font_name.clone()))?;
            for line in &lines {
                font.add_chars(line);
                let missing = font.missing_glyphs(line);
                if !missing.is_empty() {
                    warn!(font = %font_name, ?missing, "font has no glyph for some characters");
                }
            }
            lines.iter().map(|line| font.encode(line)).collect()
        };

        let font_resource_name = self.get_or_create_font_ref(&font_name, page)?;

        let ctx = TextRenderContext {
            font_name: font_resource_name,
            font_size: self.current_font_size,
            line_height: self.current_line_height,
            color: self.current_text_color,
        };

        let operators = generate_text_operators(&encoded, x, y, &ctx);
        self.buffer_content(page, &operators);

        Ok(())
    }

    /// Save the document to a file
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.finalize()?;

        self.inner
            .save(path)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(())
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.finalize()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        Ok(buffer)
    }

    /// Write buffered drawing into the document
    fn finalize(&mut self) -> Result<()> {
        // 1. Flush buffered content streams to pages
        self.flush_content_buffers()?;

        // 2. Embed fonts and reference them from the pages that use them
        self.embed_fonts()?;

        Ok(())
    }

    /// Embed every font referenced by a page
    fn embed_fonts(&mut self) -> Result<()> {
        let font_names: BTreeSet<String> = self
            .page_font_resources
            .values()
            .flat_map(|fonts| fonts.keys().cloned())
            .filter(|name| !self.embedded_fonts.contains_key(name))
            .collect();

        for font_name in font_names {
            self.embed_font_object(&font_name)?;
        }

        self.finalize_page_font_resources()
    }

    /// Embed a single font object into the PDF
    fn embed_font_object(&mut self, font_name: &str) -> Result<ObjectId> {
        let font = self
            .fonts
            .get(font_name)
            .ok_or_else(|| PdfError::FontNotFound(font_name.to_string()))?;

        let font_id = match font {
            PdfFont::Standard(font) => {
                let dict = font.to_pdf_dictionary();
                self.inner.add_object(dict)
            }
            PdfFont::TrueType(font_data) => {
                debug!(
                    font = font_name,
                    glyphs = font_data.used_chars.len(),
                    bytes = font_data.ttf_data.len(),
                    "embedding TrueType font"
                );
                let font_objects = font_data.to_pdf_objects()?;

                let font_file_id = self.inner.add_object(font_objects.font_file_stream);

                let mut font_descriptor = font_objects.font_descriptor;
                font_descriptor.set("FontFile2", Object::Reference(font_file_id));
                let font_descriptor_id = self.inner.add_object(font_descriptor);

                let mut cid_font = font_objects.cid_font;
                cid_font.set("FontDescriptor", Object::Reference(font_descriptor_id));
                let cid_font_id = self.inner.add_object(cid_font);

                let tounicode_id = self.inner.add_object(font_objects.tounicode_stream);

                let mut type0_font = font_objects.type0_font;
                type0_font.set(
                    "DescendantFonts",
                    Object::Array(vec![Object::Reference(cid_font_id)]),
                );
                type0_font.set("ToUnicode", Object::Reference(tounicode_id));

                self.inner.add_object(type0_font)
            }
        };

        self.embedded_fonts.insert(font_name.to_string(), font_id);

        Ok(font_id)
    }

    /// Get or create a font reference for a specific page
    ///
    /// Returns the resource name (e.g., "F1", "F2") for use in content
    /// streams. Names already used by the page's own resources are skipped.
    pub fn get_or_create_font_ref(&mut self, font_name: &str, page: usize) -> Result<String> {
        if let Some(resource_name) = self
            .page_font_resources
            .get(&page)
            .and_then(|resources| resources.get(font_name))
        {
            return Ok(resource_name.clone());
        }

        let page_id = self.page_id(page)?;
        let existing = self.page_font_dict(page_id)?;

        let resource_name = loop {
            let candidate = format!("F{}", self.next_font_resource);
            self.next_font_resource += 1;
            if !existing.has(candidate.as_bytes()) {
                break candidate;
            }
        };

        self.page_font_resources
            .entry(page)
            .or_default()
            .insert(font_name.to_string(), resource_name.clone());

        Ok(resource_name)
    }

    /// Add the embedded fonts to each page's Resources dictionary
    fn finalize_page_font_resources(&mut self) -> Result<()> {
        let page_resources: Vec<(usize, Vec<(String, String)>)> = self
            .page_font_resources
            .iter()
            .map(|(&page, fonts)| {
                let font_list = fonts
                    .iter()
                    .map(|(font_name, resource_name)| (font_name.clone(), resource_name.clone()))
                    .collect();
                (page, font_list)
            })
            .collect();

        for (page, fonts) in page_resources {
            if !fonts.is_empty() {
                self.add_fonts_to_page_resources(page, &fonts)?;
            }
        }

        Ok(())
    }

    /// Merge font references into a page's Resources dictionary
    ///
    /// The page receives a direct Resources dictionary built from its
    /// current (possibly inherited or indirect) resources, so the template's
    /// own fonts and images stay reachable.
    fn add_fonts_to_page_resources(
        &mut self,
        page: usize,
        fonts: &[(String, String)],
    ) -> Result<()> {
        let page_id = self.page_id(page)?;

        let mut resources_dict = self.page_resources(page_id)?;
        let mut font_dict = self.page_font_dict(page_id)?;

        for (font_name, resource_name) in fonts {
            let font_ref = self
                .embedded_fonts
                .get(font_name)
                .ok_or_else(|| PdfError::FontNotFound(font_name.to_string()))?;
            font_dict.set(resource_name.as_bytes(), Object::Reference(*font_ref));
        }

        resources_dict.set("Font", Object::Dictionary(font_dict));

        let mut page_dict = self.page_dict(page_id)?.clone();
        page_dict.set("Resources", Object::Dictionary(resources_dict));
        self.inner.objects.insert(page_id, page_dict.into());

        Ok(())
    }

    /// Get a reference to the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        pages
            .get(&(page as u32))
            .copied()
            .ok_or(PdfError::InvalidPage(page, pages.len()))
    }

    fn page_dict(&self, page_id: ObjectId) -> Result<&Dictionary> {
        self.inner
            .get_object(page_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))
    }

    /// Follow a direct object or a reference to a dictionary
    fn resolve_dict(&self, object: &Object) -> Option<Dictionary> {
        match object {
            Object::Dictionary(dict) => Some(dict.clone()),
            Object::Reference(id) => self
                .inner
                .get_object(*id)
                .ok()
                .and_then(|obj| obj.as_dict().ok())
                .cloned(),
            _ => None,
        }
    }

    /// Look up a page attribute, following the parent inheritance chain
    fn get_inherited(&self, page_id: ObjectId, key: &[u8]) -> Result<Option<Object>> {
        let mut current_id = page_id;

        // Follow parent chain up to 10 levels (safety limit)
        for _ in 0..10 {
            let dict = self
                .inner
                .get_object(current_id)?
                .as_dict()
                .map_err(|_| PdfError::ParseError("Object is not a dictionary".to_string()))?;

            if let Ok(value) = dict.get(key) {
                return Ok(Some(value.clone()));
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => current_id = *parent_id,
                _ => break,
            }
        }

        Ok(None)
    }

    /// The page's effective Resources dictionary (empty if it has none)
    fn page_resources(&self, page_id: ObjectId) -> Result<Dictionary> {
        Ok(self
            .get_inherited(page_id, b"Resources")?
            .and_then(|resources| self.resolve_dict(&resources))
            .unwrap_or_else(Dictionary::new))
    }

    /// The page's effective Font resource dictionary (empty if it has none)
    fn page_font_dict(&self, page_id: ObjectId) -> Result<Dictionary> {
        let resources = self.page_resources(page_id)?;
        Ok(resources
            .get(b"Font")
            .ok()
            .and_then(|fonts| self.resolve_dict(fonts))
            .unwrap_or_else(Dictionary::new))
    }

    /// Buffer content operators for a page (written at save time)
    fn buffer_content(&mut self, page: usize, content: &[u8]) {
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(content);
    }

    /// Flush all buffered content to page streams
    fn flush_content_buffers(&mut self) -> Result<()> {
        let buffers = std::mem::take(&mut self.page_content_buffer);

        for (page, content) in buffers {
            if !content.is_empty() {
                self.append_to_content_stream(page, &content)?;
            }
        }

        Ok(())
    }

    /// Object ids of the page's existing content streams, in drawing order
    ///
    /// Streams are referenced, never decoded or re-encoded. A stream stored
    /// directly in the page dictionary is moved into its own object.
    fn existing_content_ids(&mut self, contents: &Object) -> Vec<ObjectId> {
        match contents {
            Object::Reference(id) => {
                let items = match self.inner.get_object(*id) {
                    Ok(Object::Array(items)) => items.clone(),
                    Ok(Object::Stream(_)) => return vec![*id],
                    _ => return Vec::new(),
                };
                items
                    .iter()
                    .flat_map(|item| self.existing_content_ids(item))
                    .collect()
            }
            Object::Array(items) => items
                .iter()
                .flat_map(|item| self.existing_content_ids(item))
                .collect(),
            Object::Stream(stream) => vec![self.inner.add_object(stream.clone())],
            _ => Vec::new(),
        }
    }

    /// Append content to a page's content streams
    ///
    /// The existing streams are referenced as they are and bracketed by
    /// `q`/`Q` streams, so graphics state they leave behind cannot move or
    /// recolor the appended operators.
    fn append_to_content_stream(&mut self, page: usize, content: &[u8]) -> Result<()> {
        let page_id = self.page_id(page)?;
        let mut page_dict = self.page_dict(page_id)?.clone();

        let existing = match page_dict.get(b"Contents") {
            Ok(contents) => self.existing_content_ids(contents),
            Err(_) => Vec::new(),
        };

        let mut overlay = Vec::with_capacity(content.len() + 3);
        if !existing.is_empty() {
            overlay.extend_from_slice(b"\nQ\n");
        }
        overlay.extend_from_slice(content);
        let overlay_stream =
            Stream::new(dictionary! { "Filter" => "FlateDecode" }, deflate(&overlay)?);

        let contents = if existing.is_empty() {
            Object::Reference(self.inner.add_object(overlay_stream))
        } else {
            let save_id = self.inner.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
            let overlay_id = self.inner.add_object(overlay_stream);
            let mut streams = Vec::with_capacity(existing.len() + 2);
            streams.push(Object::Reference(save_id));
            streams.extend(existing.into_iter().map(Object::Reference));
            streams.push(Object::Reference(overlay_id));
            Object::Array(streams)
        };

        page_dict.set("Contents", contents);
        self.inner.objects.insert(page_id, page_dict.into());

        Ok(())
    }
}
