//! In-process placeholder artwork for when no generated image is available.

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};
use std::path::Path;
use trendcast_core::{CoreError, ImageError};

pub const IMAGE_SIZE: u32 = 1024;
pub const WATERMARK: &str = "[ PLACEHOLDER ]";
pub const WATERMARK_KEYWORD: &str = "Comment";

const MAX_PROMPT_CHARS: usize = 200;
const WRAP_WIDTH: usize = 40;
const MAX_LINES: usize = 6;
const LINE_HEIGHT: u32 = 30;
const GLYPH_SIZE: u32 = 8;
const GLYPH_SCALE: u32 = 2;
const WATERMARK_OFFSET: u32 = 60;

const TEXT_COLOUR: Rgb<u8> = Rgb([200, 200, 220]);
const WATERMARK_COLOUR: Rgb<u8> = Rgb([100, 100, 120]);

/// Background colour of row `y`, a dark blue fading lighter towards the
/// bottom.
pub fn gradient_colour(y: u32, height: u32) -> Rgb<u8> {
    let t = if height > 1 {
        y as f32 / (height - 1) as f32
    } else {
        0.0
    };
    Rgb([
        (20.0 + t * 30.0) as u8,
        (30.0 + t * 40.0) as u8,
        (80.0 + t * 60.0) as u8,
    ])
}

/// Greedy word wrap of the first 200 characters of `text`, capped at six
/// lines. Words longer than the wrap width get a line of their own.
pub fn wrap_text(text: &str) -> Vec<String> {
    let truncated: String = text.chars().take(MAX_PROMPT_CHARS).collect();
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in truncated.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() > WRAP_WIDTH {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        } else {
            current.push(' ');
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.truncate(MAX_LINES);
    lines
}

pub fn render(prompt: &str) -> RgbImage {
    let mut canvas = RgbImage::new(IMAGE_SIZE, IMAGE_SIZE);

    for (y, row) in canvas.rows_mut().enumerate() {
        let colour = gradient_colour(y as u32, IMAGE_SIZE);
        for pixel in row {
            *pixel = colour;
        }
    }

    let lines = wrap_text(prompt);
    let block_height = lines.len() as u32 * (LINE_HEIGHT / 2);
    let mut y = (IMAGE_SIZE / 2).saturating_sub(block_height);
    for line in &lines {
        draw_centered(&mut canvas, line, y, TEXT_COLOUR);
        y += LINE_HEIGHT;
    }

    draw_centered(
        &mut canvas,
        WATERMARK,
        IMAGE_SIZE - WATERMARK_OFFSET,
        WATERMARK_COLOUR,
    );

    canvas
}

fn text_width(text: &str) -> u32 {
    text.chars().count() as u32 * GLYPH_SIZE * GLYPH_SCALE
}

fn draw_centered(canvas: &mut RgbImage, text: &str, y: u32, colour: Rgb<u8>) {
    let x = canvas.width().saturating_sub(text_width(text)) / 2;
    draw_text(canvas, text, x, y, colour);
}

fn draw_text(canvas: &mut RgbImage, text: &str, x: u32, y: u32, colour: Rgb<u8>) {
    let advance = GLYPH_SIZE * GLYPH_SCALE;

    for (i, c) in text.chars().enumerate() {
        let glyph = BASIC_FONTS
            .get(c)
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; 8]);
        let origin_x = x + i as u32 * advance;

        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                if bits & (1 << col) == 0 {
                    continue;
                }
                for dy in 0..GLYPH_SCALE {
                    for dx in 0..GLYPH_SCALE {
                        let px = origin_x + col * GLYPH_SCALE + dx;
                        let py = y + row as u32 * GLYPH_SCALE + dy;
                        if px < canvas.width() && py < canvas.height() {
                            canvas.put_pixel(px, py, colour);
                        }
                    }
                }
            }
        }
    }
}

/// PNG-encodes the canvas with the watermark also stored as a `tEXt` chunk.
pub fn encode_png(canvas: &RgbImage) -> Result<Vec<u8>, ImageError> {
    let encoding = |e: png::EncodingError| ImageError::Encoding {
        reason: e.to_string(),
    };

    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, canvas.width(), canvas.height());
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        encoder
            .add_text_chunk(WATERMARK_KEYWORD.to_string(), WATERMARK.to_string())
            .map_err(encoding)?;

        let mut writer = encoder.write_header().map_err(encoding)?;
        writer
            .write_image_data(canvas.as_raw())
            .map_err(encoding)?;
        writer.finish().map_err(encoding)?;
    }
    Ok(bytes)
}

/// Renders and writes a placeholder for `prompt` to `path`.
pub async fn write_placeholder(prompt: &str, path: &Path) -> Result<(), CoreError> {
    let bytes = encode_png(&render(prompt))?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}
