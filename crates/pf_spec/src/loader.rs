//! Spec text and file loading.
//!
//! Loading never fails on content: unparseable text is repaired into a valid
//! specification. Only I/O errors surface. Also hosts the stable fingerprint
//! used to seed per-spec randomness.

use std::fs;
use std::path::Path;

use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::repair::repair;
use crate::schema::GameSpecification;

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to read spec file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize spec: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Parse model-style text: surrounding prose and markdown fences are
/// tolerated, and the outermost `{...}` span is taken as the document.
/// Text with no parseable object repairs from nothing.
pub fn parse_spec_text(text: &str) -> GameSpecification {
    match extract_json_object(text) {
        Some(value) => repair(&value),
        None => {
            log::warn!("No JSON object found in spec text; generating defaults");
            repair(&Value::Null)
        }
    }
}

fn extract_json_object(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        return Some(value);
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&text[start..=end]).ok()
}

/// Only I/O fails; anything readable becomes a valid specification.
pub fn load_spec_from_path(path: impl AsRef<Path>) -> Result<GameSpecification, SpecError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| SpecError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let spec = parse_spec_text(&text);
    log::info!(
        "Loaded spec '{}' ({} / {}) from {}",
        spec.title,
        spec.template,
        spec.theme_pack,
        path.display()
    );
    Ok(spec)
}

/// Hex SHA-256 of the canonical JSON encoding. Struct fields serialize in
/// declaration order and maps are sorted, so equal specs hash equally.
pub fn fingerprint(spec: &GameSpecification) -> Result<String, SpecError> {
    let bytes = serde_json::to_vec(spec)?;
    let digest = Sha256::digest(&bytes);
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

/// First eight bytes of the fingerprint, for seeding deterministic RNGs.
pub fn fingerprint_seed(spec: &GameSpecification) -> u64 {
    let bytes = serde_json::to_vec(spec).unwrap_or_default();
    let digest = Sha256::digest(&bytes);
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{validate, Template, ThemePack};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "pf_spec_{name_hint}_{}_{}.json",
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn parses_fenced_json_with_prose() {
        let text = "Sure! Here is your game:\n```json\n\
                    {\"title\": \"Rocket Run\", \"template\": \"runner\"}\n```\nHave fun!";
        let spec = parse_spec_text(text);
        assert_eq!(spec.title, "Rocket Run");
        assert_eq!(spec.template, Template::EndlessRunner);
        assert_eq!(spec.theme_pack, ThemePack::Space);
    }

    #[test]
    fn garbage_text_still_produces_valid_spec() {
        let spec = parse_spec_text("no braces here at all");
        let value = serde_json::to_value(&spec).expect("serializes");
        assert!(validate(&value).is_some());
    }

    #[test]
    fn truncated_json_falls_back_to_defaults() {
        let spec = parse_spec_text("{\"title\": \"Half");
        assert!(!spec.title.is_empty());
    }

    #[test]
    fn loads_spec_from_file() {
        let path = temp_file_path("load");
        fs::write(&path, r#"{"title": "Ocean Dive", "themePack": "ocean"}"#)
            .expect("write temp spec");
        let spec = load_spec_from_path(&path).expect("spec should load");
        let _ = fs::remove_file(&path);
        assert_eq!(spec.title, "Ocean Dive");
        assert_eq!(spec.theme_pack, ThemePack::Ocean);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = temp_file_path("missing");
        let err = load_spec_from_path(&path).expect_err("missing file must fail");
        assert!(matches!(err, SpecError::Io { .. }));
        assert!(err.to_string().contains("failed to read spec file"));
    }

    #[test]
    fn fingerprint_is_stable_and_sensitive() {
        let a = parse_spec_text(r#"{"title": "One"}"#);
        let b = parse_spec_text(r#"{"title": "One"}"#);
        let c = parse_spec_text(r#"{"title": "Two"}"#);
        let fa = fingerprint(&a).expect("fingerprint");
        assert_eq!(fa.len(), 64);
        assert_eq!(fa, fingerprint(&b).expect("fingerprint"));
        assert_ne!(fa, fingerprint(&c).expect("fingerprint"));
        assert_eq!(fingerprint_seed(&a), fingerprint_seed(&b));
    }
}
