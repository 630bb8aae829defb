//! Minimal text-only PDF writer.
//!
//! Produces PDF 1.4 documents with A4 pages. Text is drawn either with the
//! standard Helvetica font (WinAnsi, anything else becomes `?`) or with an
//! embedded TrueType font addressed by glyph id through `Identity-H`, which
//! covers whatever alphabet the font does. Embedded text carries a
//! `ToUnicode` map so it stays searchable and copyable.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::sync::Arc;

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;

const CMAP_CHUNK: usize = 100;

/// A parsed TrueType font, embedded whole into every document that uses it
#[derive(Debug)]
pub struct TrueTypeFont {
    name: String,
    data: Vec<u8>,
    units_per_em: u16,
    bbox: [i16; 4],
    ascent: i16,
    descent: i16,
    advances: Vec<u16>,
    glyphs: HashMap<char, u16>,
}

impl TrueTypeFont {
    /// Reads the metrics and the Unicode cmap out of raw `.ttf` bytes.
    /// `name` becomes the PDF font name after dropping characters PDF names
    /// cannot hold unescaped.
    pub fn parse(name: &str, data: Vec<u8>) -> Result<Self, String> {
        let head = table(&data, b"head")?;
        let hhea = table(&data, b"hhea")?;
        let maxp = table(&data, b"maxp")?;
        let hmtx = table(&data, b"hmtx")?;
        let cmap = table(&data, b"cmap")?;

        let units_per_em = read_u16(&data, head + 18)?;
        if units_per_em == 0 {
            return Err("font declares zero units per em".to_string());
        }
        let bbox = [
            read_i16(&data, head + 36)?,
            read_i16(&data, head + 38)?,
            read_i16(&data, head + 40)?,
            read_i16(&data, head + 42)?,
        ];
        let ascent = read_i16(&data, hhea + 4)?;
        let descent = read_i16(&data, hhea + 6)?;
        let long_metrics = read_u16(&data, hhea + 34)? as usize;
        let num_glyphs = read_u16(&data, maxp + 4)? as usize;

        // Glyphs past the long metrics repeat the last advance
        let mut advances: Vec<u16> = Vec::with_capacity(num_glyphs);
        for gid in 0..num_glyphs {
            let advance = if gid < long_metrics {
                read_u16(&data, hmtx + 4 * gid)?
            } else {
                advances.last().copied().unwrap_or(0)
            };
            advances.push(advance);
        }

        let glyphs = read_cmap(&data, cmap)?;

        let name: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();
        let name = if name.is_empty() {
            "EmbeddedFont".to_string()
        } else {
            name
        };

        Ok(Self {
            name,
            data,
            units_per_em,
            bbox,
            ascent,
            descent,
            advances,
            glyphs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Glyph id for `c`, 0 (`.notdef`) when the font lacks it
    pub fn glyph(&self, c: char) -> u16 {
        self.glyphs.get(&c).copied().unwrap_or(0)
    }

    /// Advance width in text space units (1/1000 em)
    pub fn width(&self, gid: u16) -> u32 {
        self.advances
            .get(gid as usize)
            .map(|&advance| advance as u32 * 1000 / self.units_per_em as u32)
            .unwrap_or(0)
    }

    fn scale(&self, value: i16) -> i32 {
        value as i32 * 1000 / self.units_per_em as i32
    }
}

#[derive(Debug, Clone, Default)]
pub enum Font {
    #[default]
    Helvetica,
    TrueType(Arc<TrueTypeFont>),
}

#[derive(Debug, Clone)]
struct TextRun {
    x: f32,
    y: f32,
    size: f32,
    text: String,
}

#[derive(Debug, Default)]
pub struct TextDocument {
    pages: Vec<Vec<TextRun>>,
    font: Font,
}

impl TextDocument {
    pub fn new() -> Self {
        Self::with_font(Font::Helvetica)
    }

    pub fn with_font(font: Font) -> Self {
        Self {
            pages: vec![Vec::new()],
            font,
        }
    }

    /// Starts a new page, subsequent text goes there
    pub fn new_page(&mut self) {
        self.pages.push(Vec::new());
    }

    /// Places `text` with its baseline at (`x`, `y`), origin bottom-left
    pub fn text(&mut self, x: f32, y: f32, size: f32, text: impl Into<String>) {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        if let Some(page) = self.pages.last_mut() {
            page.push(TextRun {
                x,
                y,
                size,
                text: text.into(),
            });
        }
    }

    pub fn render(&self) -> Vec<u8> {
        let blank = [Vec::new()];
        let pages: &[Vec<TextRun>] = if self.pages.is_empty() {
            &blank
        } else {
            &self.pages
        };

        // 1 catalog, 2 page tree, 3 font, then a (page, content) pair per
        // page, then the embedded font objects if any
        let page_obj = |i: usize| 4 + 2 * i;
        let font_objs = page_obj(pages.len());
        let kids = (0..pages.len())
            .map(|i| format!("{} 0 R", page_obj(i)))
            .collect::<Vec<_>>()
            .join(" ");

        let font_dict = match &self.font {
            Font::Helvetica => {
                "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                    .to_string()
            }
            Font::TrueType(font) => format!(
                "<< /Type /Font /Subtype /Type0 /BaseFont /{} /Encoding /Identity-H \
                 /DescendantFonts [{} 0 R] /ToUnicode {} 0 R >>",
                font.name,
                font_objs,
                font_objs + 3
            ),
        };

        let mut objects: Vec<Vec<u8>> = vec![
            b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids,
                pages.len()
            )
            .into_bytes(),
            font_dict.into_bytes(),
        ];

        for (i, runs) in pages.iter().enumerate() {
            objects.push(
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                     /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                    PAGE_WIDTH,
                    PAGE_HEIGHT,
                    page_obj(i) + 1
                )
                .into_bytes(),
            );
            objects.push(stream(&content_stream(runs, &self.font)));
        }

        if let Font::TrueType(font) = &self.font {
            let used: BTreeMap<u16, char> = pages
                .iter()
                .flatten()
                .flat_map(|run| run.text.chars())
                .map(|c| (font.glyph(c), c))
                .filter(|(gid, _)| *gid != 0)
                .collect();
            objects.extend(embedded_font_objects(font, &used, font_objs));
        }

        let mut out: Vec<u8> = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            // Writing into a Vec cannot fail
            let _ = writeln!(out, "{} 0 obj", i + 1);
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_offset = out.len();
        let _ = writeln!(out, "xref\n0 {}\n0000000000 65535 f ", objects.len() + 1);
        for offset in offsets {
            let _ = writeln!(out, "{:010} 00000 n ", offset);
        }
        let _ = writeln!(
            out,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF",
            objects.len() + 1,
            xref_offset
        );

        out
    }
}

fn stream(content: &[u8]) -> Vec<u8> {
    let mut out = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
    out.extend_from_slice(content);
    out.extend_from_slice(b"\nendstream");
    out
}

fn content_stream(runs: &[TextRun], font: &Font) -> Vec<u8> {
    let mut content = Vec::new();
    for run in runs {
        let _ = write!(content, "BT /F1 {} Tf {} {} Td ", run.size, run.x, run.y);
        match font {
            Font::Helvetica => {
                content.push(b'(');
                content.extend_from_slice(&encode_text(&run.text));
                content.push(b')');
            }
            Font::TrueType(font) => {
                content.push(b'<');
                for c in run.text.chars() {
                    let _ = write!(content, "{:04X}", font.glyph(c));
                }
                content.push(b'>');
            }
        }
        content.extend_from_slice(b" Tj ET\n");
    }
    content
}

/// WinAnsi bytes with PDF string escapes applied
fn encode_text(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                bytes.push(b'\\');
                bytes.push(c as u8);
            }
            ' '..='~' => bytes.push(c as u8),
            '\u{A0}'..='\u{FF}' => bytes.push(c as u32 as u8),
            _ => bytes.push(b'?'),
        }
    }
    bytes
}

/// CIDFont, descriptor, font file and ToUnicode map, numbered from `first`
fn embedded_font_objects(
    font: &TrueTypeFont,
    used: &BTreeMap<u16, char>,
    first: usize,
) -> Vec<Vec<u8>> {
    let widths = used
        .keys()
        .map(|gid| format!("{} [{}]", gid, font.width(*gid)))
        .collect::<Vec<_>>()
        .join(" ");
    let cid_font = format!(
        "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{} \
         /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
         /FontDescriptor {} 0 R /DW 1000 /W [{}] /CIDToGIDMap /Identity >>",
        font.name,
        first + 1,
        widths
    );

    let [x_min, y_min, x_max, y_max] = font.bbox.map(|v| font.scale(v));
    let descriptor = format!(
        "<< /Type /FontDescriptor /FontName /{} /Flags 32 /FontBBox [{} {} {} {}] \
         /ItalicAngle 0 /Ascent {} /Descent {} /CapHeight {} /StemV 80 /FontFile2 {} 0 R >>",
        font.name,
        x_min,
        y_min,
        x_max,
        y_max,
        font.scale(font.ascent),
        font.scale(font.descent),
        font.scale(font.ascent),
        first + 2
    );

    let mut file = format!(
        "<< /Length {0} /Length1 {0} >>\nstream\n",
        font.data.len()
    )
    .into_bytes();
    file.extend_from_slice(&font.data);
    file.extend_from_slice(b"\nendstream");

    vec![
        cid_font.into_bytes(),
        descriptor.into_bytes(),
        file,
        stream(to_unicode_cmap(used).as_bytes()),
    ]
}

fn to_unicode_cmap(used: &BTreeMap<u16, char>) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );

    let entries: Vec<(&u16, &char)> = used.iter().collect();
    for chunk in entries.chunks(CMAP_CHUNK) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (gid, c) in chunk {
            let mut units = [0u16; 2];
            let unicode: String = c
                .encode_utf16(&mut units)
                .iter()
                .map(|unit| format!("{:04X}", unit))
                .collect();
            cmap.push_str(&format!("<{:04X}> <{}>\n", gid, unicode));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend");
    cmap
}

fn read_u16(data: &[u8], at: usize) -> Result<u16, String> {
    data.get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| format!("font truncated at offset {}", at))
}

fn read_i16(data: &[u8], at: usize) -> Result<i16, String> {
    read_u16(data, at).map(|v| v as i16)
}

fn read_u32(data: &[u8], at: usize) -> Result<u32, String> {
    data.get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| format!("font truncated at offset {}", at))
}

/// Offset of the table tagged `tag`
fn table(data: &[u8], tag: &[u8; 4]) -> Result<usize, String> {
    let count = read_u16(data, 4)? as usize;
    for i in 0..count {
        let record = 12 + 16 * i;
        if data.get(record..record + 4) == Some(&tag[..]) {
            return Ok(read_u32(data, record + 8)? as usize);
        }
    }
    Err(format!(
        "font has no {} table",
        String::from_utf8_lossy(tag)
    ))
}

/// Unicode to glyph id, from the full-range subtable when the font has one
fn read_cmap(data: &[u8], cmap: usize) -> Result<HashMap<char, u16>, String> {
    let count = read_u16(data, cmap + 2)? as usize;
    let mut segmented = None;
    let mut full_range = None;
    for i in 0..count {
        let record = cmap + 4 + 8 * i;
        let platform = read_u16(data, record)?;
        let encoding = read_u16(data, record + 2)?;
        let subtable = cmap + read_u32(data, record + 4)? as usize;
        match (platform, encoding, read_u16(data, subtable)?) {
            (3, 10, 12) | (0, 4, 12) => full_range = Some(subtable),
            (3, 1, 4) | (0, 3, 4) => segmented = Some(subtable),
            _ => {}
        }
    }

    match (full_range, segmented) {
        (Some(subtable), _) => read_cmap_format12(data, subtable),
        (None, Some(subtable)) => read_cmap_format4(data, subtable),
        (None, None) => Err("font has no Unicode cmap".to_string()),
    }
}

fn read_cmap_format4(data: &[u8], subtable: usize) -> Result<HashMap<char, u16>, String> {
    let seg_bytes = read_u16(data, subtable + 6)? as usize;
    let ends = subtable + 14;
    let starts = ends + seg_bytes + 2;
    let deltas = starts + seg_bytes;
    let ranges = deltas + seg_bytes;

    let mut glyphs = HashMap::new();
    for seg in (0..seg_bytes).step_by(2) {
        let end = read_u16(data, ends + seg)?;
        let start = read_u16(data, starts + seg)?;
        let delta = read_u16(data, deltas + seg)?;
        let range = read_u16(data, ranges + seg)? as usize;
        if start > end {
            continue;
        }

        for code in start..=end {
            if code == 0xFFFF {
                break;
            }
            let gid = if range == 0 {
                code.wrapping_add(delta)
            } else {
                let at = ranges + seg + range + 2 * (code - start) as usize;
                match read_u16(data, at)? {
                    0 => 0,
                    gid => gid.wrapping_add(delta),
                }
            };
            if gid != 0 {
                if let Some(c) = char::from_u32(code as u32) {
                    glyphs.insert(c, gid);
                }
            }
        }
    }
    Ok(glyphs)
}

fn read_cmap_format12(data: &[u8], subtable: usize) -> Result<HashMap<char, u16>, String> {
    let groups = read_u32(data, subtable + 12)? as usize;

    let mut glyphs = HashMap::new();
    for i in 0..groups {
        let group = subtable + 16 + 12 * i;
        let start = read_u32(data, group)?;
        let end = read_u32(data, group + 4)?.min(char::MAX as u32);
        let first_gid = read_u32(data, group + 8)?;
        if start > end {
            continue;
        }

        for code in start..=end {
            let Ok(gid) = u16::try_from(first_gid + (code - start)) else {
                break;
            };
            if gid == 0 {
                continue;
            }
            if let Some(c) = char::from_u32(code) {
                glyphs.insert(c, gid);
            }
        }
    }
    Ok(glyphs)
}
