//! Format renderers
//!
//! Each renderer writes one file to the given path. Packaging happens in
//! [`crate::documents::package`].

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use chrono::NaiveDateTime;
use docx_rs::{Docx, Paragraph, Run};
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{ImageFormat, Rgb, RgbImage};
use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::error::{DocumentError, Result};

/// A4 page layout for PDF output, in millimetres
const PDF_PAGE_WIDTH: f32 = 210.0;
const PDF_PAGE_HEIGHT: f32 = 297.0;
const PDF_MARGIN: f32 = 10.0;
const PDF_LINE_HEIGHT: f32 = 10.0;
const PDF_FONT_SIZE: f32 = 12.0;
const PDF_LINE_CHARS: usize = 90;

/// PNG canvas layout, in pixels
const PNG_WIDTH: u32 = 800;
const PNG_HEIGHT: u32 = 400;
const PNG_ORIGIN: (i32, i32) = (50, 50);
const PNG_FONT_SIZE: f32 = 20.0;
const PNG_LINE_HEIGHT: i32 = 24;

/// Bitmap fallback glyphs are 8x8, drawn at this scale
const BITMAP_SCALE: i32 = 2;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> DocumentError {
    let path = path.display().to_string();
    move |source| DocumentError::Io { path, source }
}

fn render_error(format: &str, message: impl ToString) -> DocumentError {
    DocumentError::Render {
        format: format.to_string(),
        message: message.to_string(),
    }
}

/// Split text into lines of at most `width` characters, breaking on whitespace.
///
/// Existing line breaks are kept; words longer than `width` are split.
pub fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            while word.len() > width {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let extra = if current_len == 0 { 0 } else { 1 };
            if current_len + extra + word.len() > width {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current_len += word.len();
            current.extend(word);
        }

        lines.push(current);
    }

    lines
}

/// Render plain text onto A4 pages
pub fn write_pdf(path: &Path, content: &str) -> Result<()> {
    let (doc, page, layer) = PdfDocument::new(
        "Report",
        Mm(PDF_PAGE_WIDTH),
        Mm(PDF_PAGE_HEIGHT),
        "Layer 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| render_error("PDF document", e))?;

    let top = PDF_PAGE_HEIGHT - PDF_MARGIN - PDF_LINE_HEIGHT;
    let mut current_layer = doc.get_page(page).get_layer(layer);
    let mut y = top;

    for line in wrap_lines(content, PDF_LINE_CHARS) {
        if y < PDF_MARGIN {
            let (page, layer) =
                doc.add_page(Mm(PDF_PAGE_WIDTH), Mm(PDF_PAGE_HEIGHT), "Layer 1");
            current_layer = doc.get_page(page).get_layer(layer);
            y = top;
        }
        current_layer.use_text(line, PDF_FONT_SIZE, Mm(PDF_MARGIN), Mm(y), &font);
        y -= PDF_LINE_HEIGHT;
    }

    let file = File::create(path).map_err(io_error(path))?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| render_error("PDF document", e))?;

    Ok(())
}

/// Render plain text as a Word document, one paragraph per line
pub fn write_docx(path: &Path, content: &str) -> Result<()> {
    let docx = content.lines().fold(Docx::new(), |docx, line| {
        docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)))
    });

    let file = File::create(path).map_err(io_error(path))?;
    docx.build()
        .pack(file)
        .map_err(|e| render_error("DOCX document", e))?;

    Ok(())
}

/// Render text onto a fixed white canvas.
///
/// Any failure, including I/O, is reported as a single render error.
pub fn write_png(path: &Path, content: &str, font_paths: &[PathBuf]) -> Result<()> {
    render_png(path, content, font_paths).map_err(|e| render_error("PNG image", e))?;
    Ok(())
}

fn render_png(
    path: &Path,
    content: &str,
    font_paths: &[PathBuf],
) -> std::result::Result<(), image::ImageError> {
    let mut img = RgbImage::from_pixel(PNG_WIDTH, PNG_HEIGHT, Rgb([255, 255, 255]));
    let black = Rgb([0, 0, 0]);

    match load_font(font_paths) {
        Some(font) => {
            let scale = PxScale::from(PNG_FONT_SIZE);
            let mut y = PNG_ORIGIN.1;
            for line in content.lines() {
                imageproc::drawing::draw_text_mut(
                    &mut img,
                    black,
                    PNG_ORIGIN.0,
                    y,
                    scale,
                    &font,
                    line,
                );
                y += PNG_LINE_HEIGHT;
            }
        }
        None => {
            tracing::debug!("No truetype font available, using bitmap font");
            draw_bitmap_text(&mut img, black, PNG_ORIGIN, content);
        }
    }

    img.save_with_format(path, ImageFormat::Png)
}

/// First font in `paths` that can be read and parsed
fn load_font(paths: &[PathBuf]) -> Option<FontVec> {
    paths.iter().find_map(|path| {
        let bytes = std::fs::read(path).ok()?;
        match FontVec::try_from_vec(bytes) {
            Ok(font) => Some(font),
            Err(e) => {
                tracing::debug!(path = %path.display(), "Skipping unreadable font: {}", e);
                None
            }
        }
    })
}

/// Draw text with the built-in 8x8 bitmap font, clipping at the canvas edge
fn draw_bitmap_text(img: &mut RgbImage, color: Rgb<u8>, origin: (i32, i32), text: &str) {
    let advance = 8 * BITMAP_SCALE;
    let line_height = 10 * BITMAP_SCALE;
    let (width, height) = (img.width() as i32, img.height() as i32);

    for (row, line) in text.lines().enumerate() {
        let top = origin.1 + row as i32 * line_height;
        for (col, c) in line.chars().enumerate() {
            let left = origin.0 + col as i32 * advance;
            let Some(glyph) = BASIC_FONTS.get(c).or_else(|| BASIC_FONTS.get('?')) else {
                continue;
            };

            for (gy, bits) in glyph.iter().enumerate() {
                for gx in 0..8 {
                    if bits & (1u8 << gx) == 0 {
                        continue;
                    }
                    for dy in 0..BITMAP_SCALE {
                        for dx in 0..BITMAP_SCALE {
                            let x = left + gx * BITMAP_SCALE + dx;
                            let y = top + gy as i32 * BITMAP_SCALE + dy;
                            if (0..width).contains(&x) && (0..height).contains(&y) {
                                img.put_pixel(x as u32, y as u32, color);
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Write the content below a generated heading
pub fn write_markdown(path: &Path, content: &str, now: NaiveDateTime) -> Result<()> {
    let text = format!(
        "# Report Generated on {}\n\n{}",
        now.format("%Y-%m-%d %H:%M:%S"),
        content
    );
    std::fs::write(path, text).map_err(io_error(path))?;
    Ok(())
}
