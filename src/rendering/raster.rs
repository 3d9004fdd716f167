/// Executes paint commands into an RGBA buffer

use super::layout::{CHAR_WIDTH, LINE_HEIGHT};
use super::paint::{PaintCommand, CANVAS_COLOR};
use crate::capture::RasterImage;

/// Paint `commands` into `target`, scaling layout units by `scale`.
///
/// Text is drawn as one solid block per non-space character.
pub fn paint(commands: &[PaintCommand], target: &mut RasterImage, scale: f64) {
    target.fill(CANVAS_COLOR);
    for cmd in commands {
        match cmd {
            PaintCommand::SolidRect {
                x,
                y,
                width,
                height,
                rgba,
            } => fill_scaled(target, *x, *y, *width, *height, *rgba, scale),
            PaintCommand::Text {
                x,
                y,
                text,
                scale: text_scale,
                rgba,
            } => {
                let advance = CHAR_WIDTH * text_scale;
                let line = LINE_HEIGHT * text_scale;
                for (row, line_text) in text.lines().enumerate() {
                    let top = y + row as f64 * line;
                    for (col, ch) in line_text.chars().enumerate() {
                        if ch.is_whitespace() {
                            continue;
                        }
                        let left = x + col as f64 * advance;
                        fill_scaled(
                            target,
                            left + text_scale,
                            top + 3.0 * text_scale,
                            advance - 2.0 * text_scale,
                            line - 6.0 * text_scale,
                            *rgba,
                            scale,
                        );
                    }
                }
            }
        }
    }
}

fn fill_scaled(
    target: &mut RasterImage,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    rgba: [u8; 4],
    scale: f64,
) {
    let x0 = (x * scale).round();
    let y0 = (y * scale).round();
    let x1 = ((x + width) * scale).round();
    let y1 = ((y + height) * scale).round();
    if x1 <= x0 || y1 <= y0 {
        return;
    }
    target.fill_rect(
        x0 as i64,
        y0 as i64,
        (x1 - x0) as u32,
        (y1 - y0) as u32,
        rgba,
    );
}
