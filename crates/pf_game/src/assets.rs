//! Texture lookup that never fails.
//!
//! Resolution order for a key: textures inserted in memory, `shape:` keys
//! drawn procedurally, `<asset_dir>/<key>.png`, and finally a placeholder
//! drawn for the entity category in palette colors. Handles are cached per
//! key and category.

use glam::Vec2;
use image::RgbaImage;
use pf_spec::{Palette, ShapeKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::entity::EntityKind;
use crate::render::Rgba;

/// Edge length of procedurally drawn textures.
pub const PLACEHOLDER_SIZE: u32 = 32;

#[derive(Debug, Clone)]
pub struct TextureHandle {
    pub id: u32,
    pub key: Arc<str>,
    pub image: Arc<RgbaImage>,
}

impl TextureHandle {
    pub fn size(&self) -> Vec2 {
        let (w, h) = self.image.dimensions();
        Vec2::new(w as f32, h as f32)
    }
}

impl PartialEq for TextureHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.key == other.key
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlaceholderColors {
    primary: Rgba,
    secondary: Rgba,
    accent: Rgba,
}

#[derive(Debug)]
pub struct AssetRegistry {
    asset_dir: Option<PathBuf>,
    colors: PlaceholderColors,
    memory: HashMap<String, Arc<RgbaImage>>,
    cache: HashMap<(String, EntityKind), TextureHandle>,
    next_id: u32,
}

impl AssetRegistry {
    pub fn new(palette: &Palette) -> Self {
        let color = |hex: &str, fallback: Rgba| Rgba::from_hex(hex).unwrap_or(fallback);
        Self {
            asset_dir: None,
            colors: PlaceholderColors {
                primary: color(&palette.primary, Rgba::rgb(0x4C, 0xC9, 0xF0)),
                secondary: color(&palette.secondary, Rgba::rgb(0xF7, 0x25, 0x85)),
                accent: color(&palette.accent, Rgba::rgb(0xFF, 0xD1, 0x66)),
            },
            memory: HashMap::new(),
            cache: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn with_asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = Some(dir.into());
        self
    }

    pub fn asset_dir(&self) -> Option<&Path> {
        self.asset_dir.as_deref()
    }

    /// Registers an already decoded texture. Replaces cached handles for `key`.
    pub fn insert(&mut self, key: &str, image: RgbaImage) {
        self.memory.insert(key.to_string(), Arc::new(image));
        self.cache.retain(|(cached, _), _| cached != key);
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn texture(&mut self, key: &str, category: EntityKind) -> TextureHandle {
        let cache_key = (key.to_string(), category);
        if let Some(handle) = self.cache.get(&cache_key) {
            return handle.clone();
        }
        let image = self.resolve(key, category);
        let handle = TextureHandle {
            id: self.next_id,
            key: Arc::from(key),
            image,
        };
        self.next_id += 1;
        self.cache.insert(cache_key, handle.clone());
        handle
    }

    fn resolve(&self, key: &str, category: EntityKind) -> Arc<RgbaImage> {
        if let Some(image) = self.memory.get(key) {
            return Arc::clone(image);
        }
        if let Some((shape, color)) = parse_shape_key(key) {
            return Arc::new(draw_shape_texture(shape, color, PLACEHOLDER_SIZE));
        }
        if let Some(image) = self.load_from_dir(key) {
            return Arc::new(image);
        }
        log::debug!("Using {} placeholder for '{}'", category.as_str(), key);
        Arc::new(self.placeholder(key, category))
    }

    fn load_from_dir(&self, key: &str) -> Option<RgbaImage> {
        let dir = self.asset_dir.as_ref()?;
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return None;
        }
        let path = dir.join(format!("{key}.png"));
        if !path.is_file() {
            return None;
        }
        match load_texture_from_path(&path) {
            Ok(image) => Some(image),
            Err(err) => {
                log::warn!("{err}; falling back to placeholder");
                None
            }
        }
    }

    fn placeholder(&self, key: &str, category: EntityKind) -> RgbaImage {
        let c = self.colors;
        match category {
            EntityKind::Player => {
                draw_shape_texture(ShapeKind::Circle, c.primary, PLACEHOLDER_SIZE)
            }
            EntityKind::Enemy => {
                draw_shape_texture(ShapeKind::Triangle, c.secondary, PLACEHOLDER_SIZE)
            }
            EntityKind::Collectible if key.contains("star") => {
                draw_shape_texture(ShapeKind::Star, c.accent, PLACEHOLDER_SIZE)
            }
            EntityKind::Collectible => {
                draw_shape_texture(ShapeKind::Diamond, c.accent, PLACEHOLDER_SIZE)
            }
            EntityKind::Platform => {
                draw_shape_texture(ShapeKind::Square, c.secondary, PLACEHOLDER_SIZE)
            }
            EntityKind::Goal => draw_flag(c.primary, c.accent, PLACEHOLDER_SIZE),
        }
    }
}

pub fn load_texture_from_path(path: &Path) -> Result<RgbaImage, String> {
    let image = image::open(path)
        .map_err(|e| format!("Failed to open '{}': {e}", path.display()))?
        .to_rgba8();
    if image.width() == 0 || image.height() == 0 {
        return Err(format!("Texture '{}' is empty", path.display()));
    }
    Ok(image)
}

/// `shape:<kind>:<#rrggbb>` as produced by `SpriteDescriptor::key`.
fn parse_shape_key(key: &str) -> Option<(ShapeKind, Rgba)> {
    let rest = key.strip_prefix("shape:")?;
    let (name, hex) = rest.split_once(':')?;
    let kind = [
        ShapeKind::Circle,
        ShapeKind::Square,
        ShapeKind::Triangle,
        ShapeKind::Star,
        ShapeKind::Diamond,
    ]
    .into_iter()
    .find(|k| k.as_str() == name)?;
    Some((kind, Rgba::from_hex(hex)?))
}

/// Rasterizes a filled shape into a transparent square texture.
pub fn draw_shape_texture(kind: ShapeKind, color: Rgba, size: u32) -> RgbaImage {
    let outline = shape_outline(kind);
    let mut image = RgbaImage::new(size, size);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let p = normalized(x, y, size);
        let inside = match kind {
            ShapeKind::Circle => p.length_squared() <= 0.9 * 0.9,
            ShapeKind::Square => p.x.abs() <= 0.85 && p.y.abs() <= 0.85,
            _ => point_in_polygon(p, &outline),
        };
        if inside {
            *pixel = color.to_pixel();
        }
    }
    image
}

fn draw_flag(pole: Rgba, cloth: Rgba, size: u32) -> RgbaImage {
    let banner = [Vec2::new(-0.6, -0.9), Vec2::new(0.85, -0.55), Vec2::new(-0.6, -0.2)];
    let mut image = RgbaImage::new(size, size);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let p = normalized(x, y, size);
        if (-0.8..=-0.6).contains(&p.x) {
            *pixel = pole.to_pixel();
        } else if point_in_polygon(p, &banner) {
            *pixel = cloth.to_pixel();
        }
    }
    image
}

/// Pixel centre mapped to [-1, 1] with y pointing down.
fn normalized(x: u32, y: u32, size: u32) -> Vec2 {
    let s = size.max(1) as f32;
    Vec2::new((x as f32 + 0.5) / s * 2.0 - 1.0, (y as f32 + 0.5) / s * 2.0 - 1.0)
}

fn shape_outline(kind: ShapeKind) -> Vec<Vec2> {
    match kind {
        ShapeKind::Triangle => vec![
            Vec2::new(0.0, -0.85),
            Vec2::new(0.9, 0.85),
            Vec2::new(-0.9, 0.85),
        ],
        ShapeKind::Diamond => vec![
            Vec2::new(0.0, -0.95),
            Vec2::new(0.75, 0.0),
            Vec2::new(0.0, 0.95),
            Vec2::new(-0.75, 0.0),
        ],
        ShapeKind::Star => (0..10)
            .map(|i| {
                let radius = if i % 2 == 0 { 0.95 } else { 0.4 };
                let angle = -std::f32::consts::FRAC_PI_2 + i as f32 * std::f32::consts::PI / 5.0;
                Vec2::new(angle.cos(), angle.sin()) * radius
            })
            .collect(),
        ShapeKind::Circle | ShapeKind::Square => Vec::new(),
    }
}

/// Even-odd rule.
fn point_in_polygon(p: Vec2, polygon: &[Vec2]) -> bool {
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "pf_assets_test_{}_{}_{}",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn palette() -> Palette {
        Palette {
            primary: "#112233".to_string(),
            secondary: "#445566".to_string(),
            background: "#000000".to_string(),
            accent: "#FFD166".to_string(),
        }
    }

    fn centre(handle: &TextureHandle) -> [u8; 4] {
        let (w, h) = handle.image.dimensions();
        handle.image.get_pixel(w / 2, h / 2).0
    }

    #[test]
    fn unknown_keys_fall_back_to_category_placeholders() {
        let mut assets = AssetRegistry::new(&palette());
        let player = assets.texture("astronaut", EntityKind::Player);
        assert_eq!(centre(&player), [0x11, 0x22, 0x33, 255]);
        assert_eq!(player.image.get_pixel(0, 0).0[3], 0);

        for kind in [
            EntityKind::Enemy,
            EntityKind::Collectible,
            EntityKind::Platform,
            EntityKind::Goal,
        ] {
            let handle = assets.texture("missing-thing", kind);
            assert_eq!(handle.size(), Vec2::splat(PLACEHOLDER_SIZE as f32));
            assert!(handle.image.pixels().any(|p| p.0[3] == 255));
        }
    }

    #[test]
    fn handles_are_cached() {
        let mut assets = AssetRegistry::new(&palette());
        let a = assets.texture("coin", EntityKind::Collectible);
        let b = assets.texture("coin", EntityKind::Collectible);
        assert_eq!(a, b);
        assert!(Arc::ptr_eq(&a.image, &b.image));
        assert_eq!(assets.cached_len(), 1);
    }

    #[test]
    fn shape_keys_are_drawn_in_their_color() {
        let mut assets = AssetRegistry::new(&palette());
        let handle = assets.texture("shape:diamond:#ff00ff", EntityKind::Collectible);
        assert_eq!(centre(&handle), [255, 0, 255, 255]);
        assert_eq!(handle.image.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn memory_textures_win_over_placeholders() {
        let mut assets = AssetRegistry::new(&palette());
        let first = assets.texture("hero", EntityKind::Player);
        assets.insert("hero", RgbaImage::from_pixel(2, 2, image::Rgba([9, 9, 9, 255])));
        let second = assets.texture("hero", EntityKind::Player);
        assert_ne!(first.id, second.id);
        assert_eq!(second.size(), Vec2::new(2.0, 2.0));
    }

    #[test]
    fn png_files_load_from_asset_dir() {
        let dir = temp_dir_path("load");
        fs::create_dir_all(&dir).expect("create asset dir");
        RgbaImage::from_pixel(3, 5, image::Rgba([1, 2, 3, 255]))
            .save_with_format(dir.join("crate-box.png"), image::ImageFormat::Png)
            .expect("write png");
        fs::write(dir.join("broken.png"), b"not a png").expect("write broken file");

        let mut assets = AssetRegistry::new(&palette()).with_asset_dir(&dir);
        let loaded = assets.texture("crate-box", EntityKind::Platform);
        assert_eq!(loaded.size(), Vec2::new(3.0, 5.0));

        let broken = assets.texture("broken", EntityKind::Enemy);
        assert_eq!(broken.size(), Vec2::splat(PLACEHOLDER_SIZE as f32));

        let escaped = assets.texture("../crate-box", EntityKind::Platform);
        assert_eq!(escaped.size(), Vec2::splat(PLACEHOLDER_SIZE as f32));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn star_outline_contains_centre_but_not_corners() {
        let star = shape_outline(ShapeKind::Star);
        assert!(point_in_polygon(Vec2::ZERO, &star));
        assert!(!point_in_polygon(Vec2::new(0.9, 0.9), &star));
    }
}
