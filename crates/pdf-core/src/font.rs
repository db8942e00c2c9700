//! Font handling for PDF documents

use crate::{PdfError, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Object, Stream};
use std::collections::BTreeSet;
use std::io::Write;

/// Metrics read once from the font tables when the font is loaded
#[derive(Debug, Clone, Copy)]
struct FontMetrics {
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    cap_height: i16,
    bbox: [i16; 4],
}

/// TrueType font data for embedding as a Type0/CIDFontType2 font
#[derive(Debug, Clone)]
pub struct FontData {
    /// Font name/identifier
    pub name: String,
    /// Raw TTF data
    pub ttf_data: Vec<u8>,
    /// Characters drawn with this font (drives /W and ToUnicode)
    pub used_chars: BTreeSet<char>,
    metrics: FontMetrics,
}

/// PDF objects generated for font embedding
pub struct FontObjects {
    /// Type0 font dictionary
    pub type0_font: Dictionary,
    /// CIDFont Type2 dictionary
    pub cid_font: Dictionary,
    /// Font descriptor dictionary
    pub font_descriptor: Dictionary,
    /// Font file stream (compressed TTF data)
    pub font_file_stream: Stream,
    /// ToUnicode CMap stream
    pub tounicode_stream: Stream,
}

impl FontData {
    /// Create font data from TTF bytes
    ///
    /// # Arguments
    /// * `name` - Font identifier
    /// * `ttf_data` - TrueType font file bytes
    pub fn from_ttf(name: &str, ttf_data: &[u8]) -> Result<Self> {
        let face = ttf_parser::Face::parse(ttf_data, 0)
            .map_err(|e| PdfError::FontParseError(format!("{name}: {e:?}")))?;

        let rect = face.global_bounding_box();
        let metrics = FontMetrics {
            units_per_em: face.units_per_em(),
            ascender: face.ascender(),
            descender: face.descender(),
            cap_height: face.capital_height().unwrap_or_else(|| face.ascender()),
            bbox: [rect.x_min, rect.y_min, rect.x_max, rect.y_max],
        };

        Ok(Self {
            name: name.to_string(),
            ttf_data: ttf_data.to_vec(),
            used_chars: BTreeSet::new(),
            metrics,
        })
    }

    /// Parsed view of the font tables.
    ///
    /// Parsing only reads the table directory, so it is done per lookup
    /// instead of keeping a self-referential face around.
    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.ttf_data, 0).ok()
    }

    /// Add characters to the used set
    pub fn add_chars(&mut self, text: &str) {
        self.used_chars.extend(text.chars());
    }

    /// Get glyph ID for a character
    pub fn glyph_id(&self, c: char) -> Option<u16> {
        self.face()
            .and_then(|face| face.glyph_index(c).map(|id| id.0))
    }

    /// Check if font has a glyph for the given character
    pub fn has_glyph(&self, c: char) -> bool {
        self.glyph_id(c).map(|id| id != 0).unwrap_or(false)
    }

    /// Get font units per em
    pub fn units_per_em(&self) -> u16 {
        self.metrics.units_per_em
    }

    /// Get font ascender
    pub fn ascender(&self) -> i16 {
        self.metrics.ascender
    }

    /// Get font descender
    pub fn descender(&self) -> i16 {
        self.metrics.descender
    }

    /// Calculate text width in font units
    ///
    /// Characters without a glyph are measured as `.notdef`, which is what
    /// a viewer draws for them.
    pub fn text_width(&self, text: &str) -> u32 {
        let Some(face) = self.face() else {
            return 0;
        };

        text.chars()
            .map(|c| {
                let gid = face.glyph_index(c).unwrap_or(ttf_parser::GlyphId(0));
                face.glyph_hor_advance(gid).unwrap_or(0) as u32
            })
            .sum()
    }

    /// Calculate text width in points for a given font size
    pub fn text_width_points(&self, text: &str, font_size: f32) -> f64 {
        let width = f64::from(self.text_width(text));
        width / f64::from(self.units_per_em()) * f64::from(font_size)
    }

    /// Encode text as hex string of glyph IDs for the Tj operator
    pub fn encode_text_hex(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len() * 4 + 2);
        result.push('<');
        for c in text.chars() {
            let gid = self.glyph_id(c).unwrap_or(0);
            result.push_str(&format!("{gid:04X}"));
        }
        result.push('>');
        result
    }

    /// PostScript-safe base font name
    fn base_font_name(&self) -> String {
        self.name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect()
    }

    /// Generate all PDF objects needed to embed this font
    ///
    /// Cross references between the objects are left as `(0, 0)`
    /// placeholders; the document fills them in when adding the objects.
    pub fn to_pdf_objects(&self) -> Result<FontObjects> {
        let font_name = Object::Name(self.base_font_name().into_bytes());

        let tounicode_content = self.generate_tounicode_cmap();
        let tounicode_stream = Stream::new(Dictionary::new(), tounicode_content.into_bytes());

        let compressed = deflate(&self.ttf_data)?;
        let font_file_stream = Stream::new(
            dictionary! {
                "Length1" => Object::Integer(self.ttf_data.len() as i64),
                "Filter" => "FlateDecode",
            },
            compressed,
        );

        let [x_min, y_min, x_max, y_max] = self.metrics.bbox;
        let font_bbox: Vec<Object> = [x_min, y_min, x_max, y_max]
            .into_iter()
            .map(|v| self.to_glyph_space(v as i32))
            .collect();

        let font_descriptor = dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => font_name.clone(),
            "Flags" => Object::Integer(4), // Symbolic
            "FontBBox" => font_bbox,
            "ItalicAngle" => Object::Integer(0),
            "Ascent" => self.to_glyph_space(self.metrics.ascender as i32),
            "Descent" => self.to_glyph_space(self.metrics.descender as i32),
            "CapHeight" => self.to_glyph_space(self.metrics.cap_height as i32),
            "StemV" => Object::Integer(80),
            "FontFile2" => Object::Reference((0, 0)),
        };

        let cid_system_info = dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => Object::Integer(0),
        };

        let cid_font = dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => font_name.clone(),
            "CIDSystemInfo" => cid_system_info,
            "FontDescriptor" => Object::Reference((0, 0)),
            "CIDToGIDMap" => "Identity",
            "W" => self.generate_widths_array(),
            "DW" => Object::Integer(1000),
        };

        let type0_font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => font_name,
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference((0, 0))],
            "ToUnicode" => Object::Reference((0, 0)),
        };

        Ok(FontObjects {
            type0_font,
            cid_font,
            font_descriptor,
            font_file_stream,
            tounicode_stream,
        })
    }

    /// Scale a value in font units to the 1000-unit glyph space PDF expects
    fn to_glyph_space(&self, value: i32) -> Object {
        let scaled = value as i64 * 1000 / self.units_per_em().max(1) as i64;
        Object::Integer(scaled)
    }

    /// Generate /W array for glyph widths: [gid1 [w1] gid2 [w2] ...]
    fn generate_widths_array(&self) -> Vec<Object> {
        let mut widths = Vec::new();
        let Some(face) = self.face() else {
            return widths;
        };

        let gids: BTreeSet<u16> = self
            .used_chars
            .iter()
            .map(|&c| face.glyph_index(c).map(|id| id.0).unwrap_or(0))
            .collect();

        for gid in gids {
            let advance = face
                .glyph_hor_advance(ttf_parser::GlyphId(gid))
                .unwrap_or(0);
            widths.push(Object::Integer(gid as i64));
            widths.push(vec![self.to_glyph_space(advance as i32)].into());
        }

        widths
    }

    /// Generate ToUnicode CMap stream content
    fn generate_tounicode_cmap(&self) -> String {
        let mut cmap = String::new();

        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n");
        cmap.push_str("<0000> <FFFF>\n");
        cmap.push_str("endcodespacerange\n");

        // Characters without a glyph share GID 0 and are left unmapped
        let mapped: Vec<(u16, char)> = self
            .used_chars
            .iter()
            .filter_map(|&c| self.glyph_id(c).filter(|&gid| gid != 0).map(|gid| (gid, c)))
            .collect();

        // At most 100 entries per bfchar section
        for chunk in mapped.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for (gid, c) in chunk {
                let mut utf16 = [0u16; 2];
                let hex: String = c
                    .encode_utf16(&mut utf16)
                    .iter()
                    .map(|unit| format!("{unit:04X}"))
                    .collect();
                cmap.push_str(&format!("<{gid:04X}> <{hex}>\n"));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\n");
        cmap.push_str("end\n");

        cmap
    }
}

/// The standard (base-14) fonts every PDF viewer provides without embedding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
}

/// Helvetica advance widths for U+0020..=U+007E, in 1000-unit glyph space
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

impl StandardFont {
    /// PostScript name of the font
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
        }
    }

    /// Advance width of a character in 1000-unit glyph space
    pub fn char_width(&self, c: char) -> u16 {
        match self {
            StandardFont::Helvetica => match c {
                ' '..='~' => HELVETICA_WIDTHS[c as usize - 0x20],
                _ => 556,
            },
        }
    }

    /// Calculate text width in points for a given font size
    pub fn text_width_points(&self, text: &str, font_size: f32) -> f64 {
        let width: u32 = text.chars().map(|c| u32::from(self.char_width(c))).sum();
        f64::from(width) / 1000.0 * f64::from(font_size)
    }

    /// Check if the WinAnsi encoding can represent the character
    pub fn has_glyph(&self, c: char) -> bool {
        matches!(c, ' '..='~' | '\u{a0}'..='\u{ff}')
    }

    /// Encode text as a WinAnsi literal string for the Tj operator
    ///
    /// Characters outside Latin-1 have no WinAnsi code and become `?`.
    pub fn encode_text(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len() + 2);
        result.push('(');
        for c in text.chars() {
            match c {
                '(' | ')' | '\\' => {
                    result.push('\\');
                    result.push(c);
                }
                ' '..='~' => result.push(c),
                '\u{a0}'..='\u{ff}' => result.push_str(&format!("\\{:03o}", c as u32)),
                _ => result.push('?'),
            }
        }
        result.push(')');
        result
    }

    /// Font dictionary referencing the viewer-provided font
    pub fn to_pdf_dictionary(&self) -> Dictionary {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => self.base_font(),
            "Encoding" => "WinAnsiEncoding",
        }
    }
}

/// Zlib-compress a stream body for the FlateDecode filter
pub(crate) fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DEJAVU_SANS: &[u8] = include_bytes!("../../../fonts/DejaVuSans.ttf");

    fn dejavu() -> FontData {
        FontData::from_ttf("DejaVuSans", DEJAVU_SANS).expect("Failed to parse DejaVuSans")
    }

    #[test]
    fn test_font_from_invalid_bytes() {
        let result = FontData::from_ttf("broken", &[0u8; 100]);
        assert!(matches!(result, Err(PdfError::FontParseError(_))));
    }

    #[test]
    fn test_font_metrics() {
        let font = dejavu();
        assert_eq!(font.units_per_em(), 2048);
        assert!(font.ascender() > 0);
        assert!(font.descender() < 0);
    }

    #[test]
    fn test_add_chars() {
        let mut font = dejavu();
        font.add_chars("Hello");
        assert_eq!(font.used_chars.len(), 4); // H, e, l, o
        assert!(font.used_chars.contains(&'l'));
    }

    #[test]
    fn test_text_width_empty() {
        assert_eq!(dejavu().text_width(""), 0);
    }

    #[test]
    fn test_text_width_scales_with_size() {
        let font = dejavu();
        let width_12 = font.text_width_points("Ana", 12.0);
        let width_24 = font.text_width_points("Ana", 24.0);
        assert!(width_12 > 0.0);
        assert!((width_24 - 2.0 * width_12).abs() < 1e-9);
    }

    #[test]
    fn test_text_width_points_keeps_double_precision() {
        let font = dejavu();
        let units = f64::from(font.text_width("Maria Aparecida"));
        let upem = f64::from(font.units_per_em());

        for size in [10.0_f32, 21.0, 37.0, 48.0] {
            assert_eq!(
                font.text_width_points("Maria Aparecida", size),
                units / upem * f64::from(size)
            );
        }
    }

    #[test]
    fn test_text_width_is_additive() {
        let font = dejavu();
        assert_eq!(
            font.text_width("AnaBeto"),
            font.text_width("Ana") + font.text_width("Beto")
        );
    }

    #[test]
    fn test_has_glyph() {
        let font = dejavu();
        assert!(font.has_glyph('A'));
        assert!(font.has_glyph('ç'));
        assert!(!font.has_glyph('漢'));
    }

    #[test]
    fn test_encode_text_hex() {
        let font = dejavu();
        assert_eq!(font.encode_text_hex(""), "<>");

        let gid = font.glyph_id('A').unwrap();
        assert_eq!(font.encode_text_hex("A"), format!("<{gid:04X}>"));
        assert_eq!(font.encode_text_hex("AA"), format!("<{gid:04X}{gid:04X}>"));
    }

    #[test]
    fn test_to_pdf_objects() {
        let mut font = dejavu();
        font.add_chars("Hello");

        let objects = font.to_pdf_objects().expect("Failed to generate PDF objects");

        assert!(!objects.type0_font.is_empty());
        assert!(!objects.cid_font.is_empty());
        assert!(!objects.font_descriptor.is_empty());
        assert!(objects.font_file_stream.content.len() < font.ttf_data.len());
        assert_eq!(
            objects
                .font_file_stream
                .dict
                .get(b"Length1")
                .and_then(|v| v.as_i64())
                .unwrap(),
            font.ttf_data.len() as i64
        );
        let widths = objects.cid_font.get(b"W").unwrap().as_array().unwrap();
        assert_eq!(widths.len(), 8); // 4 glyphs, gid + [width] each
    }

    #[test]
    fn test_base_font_name_is_sanitized() {
        let font = FontData::from_ttf("Deja Vu/Sans", DEJAVU_SANS).unwrap();
        assert_eq!(font.base_font_name(), "Deja-Vu-Sans");
    }

    #[test]
    fn test_generate_tounicode_cmap() {
        let mut font = dejavu();
        font.add_chars("AB");

        let cmap = font.generate_tounicode_cmap();
        let gid_a = font.glyph_id('A').unwrap();

        assert!(cmap.contains("/CIDInit"));
        assert!(cmap.contains("2 beginbfchar"));
        assert!(cmap.contains(&format!("<{gid_a:04X}> <0041>")));
        assert!(cmap.contains("endcmap"));
    }

    #[test]
    fn test_generate_tounicode_cmap_empty() {
        let cmap = dejavu().generate_tounicode_cmap();
        assert!(cmap.contains("begincmap"));
        assert!(!cmap.contains("beginbfchar"));
    }

    #[test]
    fn test_helvetica_widths() {
        let helvetica = StandardFont::Helvetica;
        assert_eq!(helvetica.char_width(' '), 278);
        assert_eq!(helvetica.char_width('0'), 556);
        assert_eq!(helvetica.char_width('@'), 1015);
        assert_eq!(helvetica.char_width('W'), 944);
        assert_eq!(helvetica.char_width('~'), 584);

        // 8 digits and 2 slashes
        let width = helvetica.text_width_points("07/11/2023", 21.0);
        assert!((width - 5.004 * 21.0).abs() < 1e-3);
    }

    #[test]
    fn test_helvetica_encode_text() {
        let helvetica = StandardFont::Helvetica;
        assert_eq!(helvetica.encode_text("07/11/2023"), "(07/11/2023)");
        assert_eq!(helvetica.encode_text("a(b)\\"), "(a\\(b\\)\\\\)");
        assert_eq!(helvetica.encode_text("é"), "(\\351)");
        assert_eq!(helvetica.encode_text("ש"), "(?)");
    }

    #[test]
    fn test_deflate_roundtrip_size() {
        let data = vec![b'a'; 4096];
        let compressed = deflate(&data).unwrap();
        assert!(compressed.len() < data.len());
    }
}
