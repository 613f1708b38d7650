//! Page layout on top of printpdf.
//!
//! Positions are in millimetres from the bottom-left corner of an A4 page.
//! Every page gets the report header and a `Page n` footer when it is created.

use crate::error::{ReportError, Result};
use printpdf::image_crate::codecs::png::PngDecoder;
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point,
};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

pub(crate) const PAGE_WIDTH: f32 = 210.0;
pub(crate) const PAGE_HEIGHT: f32 = 297.0;
pub(crate) const MARGIN: f32 = 15.0;
pub(crate) const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const HEADER_TEXT: &str = "Data Processing Report";
const HEADER_SIZE: f32 = 12.0;
const FOOTER_SIZE: f32 = 9.0;
/// Top of the writable area, below the header.
const CONTENT_TOP: f32 = PAGE_HEIGHT - MARGIN - 12.0;
/// Bottom of the writable area, above the footer.
const CONTENT_BOTTOM: f32 = MARGIN + 8.0;
const IMAGE_DPI: f32 = 150.0;
const PT_TO_MM: f32 = 0.3528;

/// Approximate Helvetica glyph width in millimetres.
pub(crate) fn char_width_mm(font_size: f32) -> f32 {
    font_size * 0.5 * PT_TO_MM
}

fn line_height_mm(font_size: f32) -> f32 {
    font_size * PT_TO_MM * 1.45
}

/// Characters of `font_size` text that fit in `width_mm`.
pub(crate) fn chars_per_width(width_mm: f32, font_size: f32) -> usize {
    ((width_mm / char_width_mm(font_size)).floor() as usize).max(1)
}

/// Greedy word wrap; words longer than a line are split.
pub(crate) fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let word: String = word.into_iter().collect();
        let needed = current.chars().count() + word.chars().count() + usize::from(!current.is_empty());
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn pdf_error(e: impl std::fmt::Debug) -> ReportError {
    ReportError::Pdf(format!("{e:?}"))
}

#[derive(Clone)]
struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

/// Text style for a line of output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Style {
    Regular,
    Bold,
    Italic,
}

/// A paginated PDF being written top to bottom.
pub(crate) struct ReportDocument {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    fonts: Fonts,
    cursor: f32,
    pages: usize,
}

impl ReportDocument {
    pub(crate) fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let fonts = Fonts {
            regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
            bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?,
            italic: doc
                .add_builtin_font(BuiltinFont::HelveticaOblique)
                .map_err(pdf_error)?,
        };
        let layer = doc.get_page(page).get_layer(layer);

        let mut document = Self {
            doc,
            layer,
            fonts,
            cursor: CONTENT_TOP,
            pages: 1,
        };
        document.decorate_page();
        Ok(document)
    }

    pub(crate) fn page_count(&self) -> usize {
        self.pages
    }

    /// Start a new page and move the cursor to its top.
    pub(crate) fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.pages += 1;
        self.cursor = CONTENT_TOP;
        self.decorate_page();
    }

    /// Break the page when less than `height` millimetres remain.
    pub(crate) fn ensure_space(&mut self, height: f32) {
        if self.cursor - height < CONTENT_BOTTOM {
            self.new_page();
        }
    }

    fn decorate_page(&mut self) {
        self.centered(HEADER_TEXT, HEADER_SIZE, PAGE_HEIGHT - MARGIN, Style::Bold);
        let footer = format!("Page {}", self.pages);
        self.centered(&footer, FOOTER_SIZE, MARGIN - 5.0, Style::Regular);
    }

    fn font(&self, style: Style) -> &IndirectFontRef {
        match style {
            Style::Regular => &self.fonts.regular,
            Style::Bold => &self.fonts.bold,
            Style::Italic => &self.fonts.italic,
        }
    }

    fn centered(&self, text: &str, size: f32, y: f32, style: Style) {
        let width = text.chars().count() as f32 * char_width_mm(size);
        let x = ((PAGE_WIDTH - width) / 2.0).max(MARGIN);
        self.layer
            .use_text(text, size, Mm(x), Mm(y), self.font(style));
    }

    /// Section title with some space around it.
    pub(crate) fn heading(&mut self, text: &str) {
        let size = 14.0;
        self.ensure_space(line_height_mm(size) * 2.0);
        self.cursor -= 3.0;
        self.text_at(text, size, MARGIN, Style::Bold);
        self.cursor -= 1.5;
    }

    /// Wrapped paragraph at the left margin.
    pub(crate) fn paragraph(&mut self, text: &str, size: f32, style: Style) {
        self.indented(text, size, 0.0, style);
    }

    /// Wrapped paragraph starting `indent` millimetres right of the margin.
    pub(crate) fn indented(&mut self, text: &str, size: f32, indent: f32, style: Style) {
        let max_chars = chars_per_width(CONTENT_WIDTH - indent, size);
        for line in wrap_text(text, max_chars) {
            self.text_at(&line, size, MARGIN + indent, style);
        }
    }

    pub(crate) fn spacer(&mut self, height: f32) {
        self.cursor -= height;
    }

    fn text_at(&mut self, text: &str, size: f32, x: f32, style: Style) {
        let height = line_height_mm(size);
        self.ensure_space(height);
        self.cursor -= height;
        self.layer
            .use_text(text, size, Mm(x), Mm(self.cursor), self.font(style));
    }

    /// One table row of equally wide bordered cells.
    pub(crate) fn table_row(&mut self, cells: &[String], size: f32, style: Style) {
        if cells.is_empty() {
            return;
        }
        let height = line_height_mm(size) + 2.0;
        let width = CONTENT_WIDTH / cells.len() as f32;
        self.ensure_space(height);

        let top = self.cursor;
        let bottom = top - height;
        for (idx, cell) in cells.iter().enumerate() {
            let left = MARGIN + idx as f32 * width;
            self.rectangle(left, bottom, left + width, top);
            self.layer.use_text(
                cell.as_str(),
                size,
                Mm(left + 1.5),
                Mm(bottom + 1.8),
                self.font(style),
            );
        }
        self.cursor = bottom;
    }

    fn rectangle(&self, left: f32, bottom: f32, right: f32, top: f32) {
        let corners = [(left, bottom), (right, bottom), (right, top), (left, top)];
        let outline = Line {
            points: corners
                .iter()
                .map(|&(x, y)| (Point::new(Mm(x), Mm(y)), false))
                .collect(),
            is_closed: true,
        };
        self.layer.add_line(outline);
    }

    /// Place a PNG at full content width, starting a new page if it does not fit.
    pub(crate) fn image(&mut self, path: &Path) -> Result<()> {
        let reader = BufReader::new(File::open(path)?);
        let decoder = PngDecoder::new(reader).map_err(pdf_error)?;
        let image = Image::try_from(decoder).map_err(pdf_error)?;

        let px_width = image.image.width.0 as f32;
        let px_height = image.image.height.0 as f32;
        let natural_width = px_width / IMAGE_DPI * 25.4;
        let scale = CONTENT_WIDTH / natural_width;
        let height = px_height / IMAGE_DPI * 25.4 * scale;

        self.ensure_space(height + 4.0);
        self.cursor -= height + 2.0;
        image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN)),
                translate_y: Some(Mm(self.cursor)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
        self.cursor -= 2.0;
        Ok(())
    }

    pub(crate) fn save(self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.doc.save(&mut writer).map_err(pdf_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_wrap_text() {
        assert_eq!(
            wrap_text("one two three four", 9),
            vec!["one two", "three", "four"]
        );
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn test_chars_per_width() {
        assert!(chars_per_width(CONTENT_WIDTH, 10.0) > 90);
        assert_eq!(chars_per_width(0.1, 10.0), 1);
    }

    #[test]
    fn test_pages_break_when_full() {
        let dir = TempDir::new().unwrap();
        let mut doc = ReportDocument::new("test").unwrap();
        for i in 0..200 {
            doc.paragraph(&format!("line {i}"), 10.0, Style::Regular);
        }
        assert!(doc.page_count() > 1);

        let path = dir.path().join("test.pdf");
        doc.save(&path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
