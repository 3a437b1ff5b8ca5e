//! Render surface abstraction.
//!
//! The engine only talks to [`RenderAdapter`]. Coordinates passed to an
//! adapter are logical screen pixels with the origin at the top-left and y
//! pointing down; world-to-screen conversion happens in the engine.

use glam::Vec2;
use image::{ImageFormat, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};

use crate::assets::TextureHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parses `#RRGGBB`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub fn to_pixel(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }

    pub fn rgb_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Top-left corner plus size.
    Rect { x: f32, y: f32, w: f32, h: f32 },
    Circle { x: f32, y: f32, radius: f32 },
}

pub trait RenderAdapter {
    fn logical_size(&self) -> Vec2;
    fn begin_frame(&mut self, clear: Rgba);
    /// Draws `texture` centred on `(x, y)`. A negative `scale.x` mirrors it.
    fn draw_sprite(&mut self, texture: &TextureHandle, x: f32, y: f32, scale: Vec2, alpha: f32);
    fn draw_shape(&mut self, shape: Shape, color: Rgba);
    /// `(x, y)` is the top-left of the first glyph; `size` is the glyph height.
    fn draw_text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Rgba);
    fn end_frame(&mut self);
    /// Post-processing filter ids from the spec. Adapters without filter
    /// support ignore them.
    fn set_filters(&mut self, _filters: &[String]) {}
    /// Release the surface. Later draw calls are ignored.
    fn detach(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Rgba),
    Sprite {
        key: String,
        texture_id: u32,
        x: f32,
        y: f32,
        scale: Vec2,
        alpha: f32,
    },
    Shape {
        shape: Shape,
        color: Rgba,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        color: Rgba,
    },
}

/// Records draw calls instead of rasterizing them.
#[derive(Debug, Clone, Default)]
pub struct CommandRecorder {
    size: Vec2,
    pending: Vec<DrawCommand>,
    last_frame: Vec<DrawCommand>,
    frames: u64,
    filters: Vec<String>,
    detached: bool,
}

impl CommandRecorder {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            ..Self::default()
        }
    }

    /// Commands of the most recently finished frame.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.last_frame
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub fn texts(&self) -> Vec<&str> {
        self.last_frame
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn record(&mut self, command: DrawCommand) {
        if !self.detached {
            self.pending.push(command);
        }
    }
}

impl RenderAdapter for CommandRecorder {
    fn logical_size(&self) -> Vec2 {
        self.size
    }

    fn begin_frame(&mut self, clear: Rgba) {
        self.pending.clear();
        self.record(DrawCommand::Clear(clear));
    }

    fn draw_sprite(&mut self, texture: &TextureHandle, x: f32, y: f32, scale: Vec2, alpha: f32) {
        self.record(DrawCommand::Sprite {
            key: texture.key.to_string(),
            texture_id: texture.id,
            x,
            y,
            scale,
            alpha,
        });
    }

    fn draw_shape(&mut self, shape: Shape, color: Rgba) {
        self.record(DrawCommand::Shape { shape, color });
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Rgba) {
        self.record(DrawCommand::Text {
            text: text.to_string(),
            x,
            y,
            size,
            color,
        });
    }

    fn end_frame(&mut self) {
        if self.detached {
            return;
        }
        self.last_frame = std::mem::take(&mut self.pending);
        self.frames += 1;
    }

    fn set_filters(&mut self, filters: &[String]) {
        self.filters = filters.to_vec();
    }

    fn detach(&mut self) {
        self.detached = true;
        self.pending.clear();
    }
}

/// Software rasterizer into an RGBA canvas.
#[derive(Debug, Clone)]
pub struct ImageRenderer {
    canvas: RgbaImage,
    detached: bool,
}

impl ImageRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: RgbaImage::new(width, height),
            detached: false,
        }
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Writes the canvas as PNG via a temporary sibling file.
    pub fn save_png(&self, path: &Path) -> Result<(), String> {
        let tmp = temporary_output_path(path);
        self.canvas
            .save_with_format(&tmp, ImageFormat::Png)
            .map_err(|e| format!("Failed to write '{}': {e}", tmp.display()))?;
        if path.exists() {
            fs::remove_file(path).map_err(|e| {
                format!("Failed to replace existing output '{}': {e}", path.display())
            })?;
        }
        fs::rename(&tmp, path).map_err(|e| {
            format!(
                "Failed to move temporary output '{}' -> '{}': {e}",
                tmp.display(),
                path.display()
            )
        })
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgba, alpha: f32) {
        if x < 0 || y < 0 || x >= self.canvas.width() as i64 || y >= self.canvas.height() as i64 {
            return;
        }
        let a = (color.a as f32 / 255.0) * alpha.clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let dst = self.canvas.get_pixel_mut(x as u32, y as u32);
        let mix = |s: u8, d: u8| (s as f32 * a + d as f32 * (1.0 - a)).round() as u8;
        dst.0 = [
            mix(color.r, dst.0[0]),
            mix(color.g, dst.0[1]),
            mix(color.b, dst.0[2]),
            dst.0[3].max((a * 255.0).round() as u8),
        ];
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        let x0 = x.round() as i64;
        let y0 = y.round() as i64;
        let x1 = (x + w).round() as i64;
        let y1 = (y + h).round() as i64;
        for py in y0.max(0)..y1.min(self.canvas.height() as i64) {
            for px in x0.max(0)..x1.min(self.canvas.width() as i64) {
                self.blend(px, py, color, 1.0);
            }
        }
    }
}

impl RenderAdapter for ImageRenderer {
    fn logical_size(&self) -> Vec2 {
        Vec2::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    fn begin_frame(&mut self, clear: Rgba) {
        if self.detached {
            return;
        }
        let pixel = clear.to_pixel();
        for p in self.canvas.pixels_mut() {
            *p = pixel;
        }
    }

    fn draw_sprite(&mut self, texture: &TextureHandle, x: f32, y: f32, scale: Vec2, alpha: f32) {
        if self.detached || scale.x == 0.0 || scale.y == 0.0 {
            return;
        }
        let src = &texture.image;
        let (sw, sh) = src.dimensions();
        if sw == 0 || sh == 0 {
            return;
        }
        let mirrored = scale.x < 0.0;
        let dw = sw as f32 * scale.x.abs();
        let dh = sh as f32 * scale.y.abs();
        let left = (x - dw * 0.5).round() as i64;
        let top = (y - dh * 0.5).round() as i64;
        let (w, h) = (dw.round() as i64, dh.round() as i64);
        for dy in 0..h {
            for dx in 0..w {
                let mut sx = ((dx as f32 + 0.5) / scale.x.abs()) as u32;
                let sy = ((dy as f32 + 0.5) / scale.y.abs()) as u32;
                sx = sx.min(sw - 1);
                if mirrored {
                    sx = sw - 1 - sx;
                }
                let p = src.get_pixel(sx, sy.min(sh - 1)).0;
                let color = Rgba {
                    r: p[0],
                    g: p[1],
                    b: p[2],
                    a: p[3],
                };
                self.blend(left + dx, top + dy, color, alpha);
            }
        }
    }

    fn draw_shape(&mut self, shape: Shape, color: Rgba) {
        if self.detached {
            return;
        }
        match shape {
            Shape::Rect { x, y, w, h } => self.fill_rect(x, y, w, h, color),
            Shape::Circle { x, y, radius } => {
                let r = radius.max(0.0);
                let (x0, x1) = ((x - r).floor() as i64, (x + r).ceil() as i64);
                let (y0, y1) = ((y - r).floor() as i64, (y + r).ceil() as i64);
                for py in y0..=y1 {
                    for px in x0..=x1 {
                        let d = Vec2::new(px as f32 + 0.5 - x, py as f32 + 0.5 - y);
                        if d.length_squared() <= r * r {
                            self.blend(px, py, color, 1.0);
                        }
                    }
                }
            }
        }
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Rgba) {
        if self.detached {
            return;
        }
        let cell = glyph_scale(size);
        let mut cursor = x;
        for ch in text.chars() {
            let rows = glyph(ch);
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..3 {
                    if bits & (0b100 >> col) != 0 {
                        self.fill_rect(
                            cursor + col as f32 * cell,
                            y + row as f32 * cell,
                            cell,
                            cell,
                            color,
                        );
                    }
                }
            }
            cursor += GLYPH_ADVANCE * cell;
        }
    }

    fn end_frame(&mut self) {}

    fn detach(&mut self) {
        self.detached = true;
    }
}

const GLYPH_ADVANCE: f32 = 4.0;

fn glyph_scale(size: f32) -> f32 {
    (size / 5.0).floor().max(1.0)
}

/// Width in pixels of `text` drawn at glyph height `size`.
pub fn text_width(text: &str, size: f32) -> f32 {
    let n = text.chars().count() as f32;
    if n == 0.0 {
        return 0.0;
    }
    (n * GLYPH_ADVANCE - 1.0) * glyph_scale(size)
}

/// 3x5 bitmap font; bit 2 is the left column.
fn glyph(ch: char) -> [u8; 5] {
    match ch.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        ' ' => [0; 5],
        _ => [0b111, 0b001, 0b010, 0b000, 0b010],
    }
}

fn temporary_output_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("snapshot");
    path.with_file_name(format!("{file_name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "pf_render_test_{}_{}_{}.png",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn solid_texture(color: Rgba) -> TextureHandle {
        TextureHandle {
            id: 1,
            key: Arc::from("solid"),
            image: Arc::new(RgbaImage::from_pixel(4, 4, color.to_pixel())),
        }
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(Rgba::from_hex("#FF8000"), Some(Rgba::rgb(255, 128, 0)));
        assert_eq!(Rgba::from_hex("FF8000"), None);
        assert_eq!(Rgba::from_hex("#FF80"), None);
        assert_eq!(Rgba::from_hex("#GG8000"), None);
    }

    #[test]
    fn recorder_keeps_last_finished_frame() {
        let mut r = CommandRecorder::new(800.0, 600.0);
        r.begin_frame(Rgba::BLACK);
        r.draw_text("SCORE 1", 8.0, 8.0, 10.0, Rgba::WHITE);
        r.end_frame();
        r.begin_frame(Rgba::BLACK);
        r.draw_text("SCORE 2", 8.0, 8.0, 10.0, Rgba::WHITE);
        assert_eq!(r.texts(), vec!["SCORE 1"]);
        r.end_frame();
        assert_eq!(r.texts(), vec!["SCORE 2"]);
        assert_eq!(r.frames(), 2);
    }

    #[test]
    fn detached_recorder_ignores_frames() {
        let mut r = CommandRecorder::new(800.0, 600.0);
        r.detach();
        r.begin_frame(Rgba::BLACK);
        r.draw_shape(Shape::Circle { x: 1.0, y: 1.0, radius: 1.0 }, Rgba::WHITE);
        r.end_frame();
        assert_eq!(r.frames(), 0);
        assert!(r.commands().is_empty());
    }

    #[test]
    fn image_renderer_clears_and_fills() {
        let mut r = ImageRenderer::new(16, 16);
        r.begin_frame(Rgba::rgb(10, 20, 30));
        r.draw_shape(Shape::Rect { x: 4.0, y: 4.0, w: 4.0, h: 4.0 }, Rgba::WHITE);
        assert_eq!(r.canvas().get_pixel(0, 0).0, [10, 20, 30, 255]);
        assert_eq!(r.canvas().get_pixel(5, 5).0, [255, 255, 255, 255]);
        assert_eq!(r.canvas().get_pixel(8, 8).0, [10, 20, 30, 255]);
    }

    #[test]
    fn sprites_are_scaled_around_their_centre() {
        let mut r = ImageRenderer::new(32, 32);
        r.begin_frame(Rgba::BLACK);
        r.draw_sprite(&solid_texture(Rgba::rgb(255, 0, 0)), 16.0, 16.0, Vec2::splat(2.0), 1.0);
        assert_eq!(r.canvas().get_pixel(12, 12).0, [255, 0, 0, 255]);
        assert_eq!(r.canvas().get_pixel(19, 19).0, [255, 0, 0, 255]);
        assert_eq!(r.canvas().get_pixel(20, 20).0, [0, 0, 0, 255]);
    }

    #[test]
    fn half_alpha_blends() {
        let mut r = ImageRenderer::new(8, 8);
        r.begin_frame(Rgba::BLACK);
        r.draw_sprite(&solid_texture(Rgba::WHITE), 4.0, 4.0, Vec2::ONE, 0.5);
        let p = r.canvas().get_pixel(4, 4).0;
        assert!((127..=128).contains(&p[0]));
    }

    #[test]
    fn text_sets_pixels_inside_its_width() {
        let mut r = ImageRenderer::new(64, 16);
        r.begin_frame(Rgba::BLACK);
        r.draw_text("10", 0.0, 0.0, 5.0, Rgba::WHITE);
        let lit = r.canvas().pixels().filter(|p| p.0[0] == 255).count();
        assert!(lit > 0);
        let width = text_width("10", 5.0) as u32;
        assert_eq!(width, 7);
        for y in 0..16 {
            for x in width..64 {
                assert_eq!(r.canvas().get_pixel(x, y).0[0], 0);
            }
        }
    }

    #[test]
    fn snapshot_writes_png() {
        let mut r = ImageRenderer::new(8, 8);
        r.begin_frame(Rgba::rgb(1, 2, 3));
        let path = temp_file_path("snapshot");
        r.save_png(&path).expect("snapshot should save");
        let loaded = image::open(&path).expect("png should load").to_rgba8();
        assert_eq!(loaded.get_pixel(3, 3).0, [1, 2, 3, 255]);
        let _ = fs::remove_file(path);
    }
}
