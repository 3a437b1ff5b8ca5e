use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Runtime tuning that is not part of a game specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    /// Step used by replays and the headless host.
    #[serde(default = "default_fixed_dt")]
    pub fixed_dt: f32,
    #[serde(default = "default_max_delta")]
    pub max_delta: f32,
    #[serde(default = "default_invulnerability")]
    pub invulnerability_secs: f32,
    #[serde(default = "default_damage")]
    pub damage_per_hit: u32,
    #[serde(default = "default_chase_deadzone")]
    pub chase_deadzone: f32,
    #[serde(default = "default_patrol_range")]
    pub patrol_range: f32,
    #[serde(default = "default_weather_particles")]
    pub weather_particles: usize,
    #[serde(default = "default_fps_window")]
    pub fps_window: usize,
    #[serde(default = "default_dash_multiplier")]
    pub dash_multiplier: f32,
    #[serde(default = "default_dash_secs")]
    pub dash_secs: f32,
    #[serde(default = "default_dash_cooldown")]
    pub dash_cooldown_secs: f32,
    /// Fail engine construction when a real audio device was requested but
    /// cannot be opened, instead of falling back to silence.
    #[serde(default)]
    pub require_audio: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fixed_dt: default_fixed_dt(),
            max_delta: default_max_delta(),
            invulnerability_secs: default_invulnerability(),
            damage_per_hit: default_damage(),
            chase_deadzone: default_chase_deadzone(),
            patrol_range: default_patrol_range(),
            weather_particles: default_weather_particles(),
            fps_window: default_fps_window(),
            dash_multiplier: default_dash_multiplier(),
            dash_secs: default_dash_secs(),
            dash_cooldown_secs: default_dash_cooldown(),
            require_audio: false,
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<EngineConfig, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let config: EngineConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse engine config JSON {}: {e}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &EngineConfig) -> Result<(), String> {
    let positive = [
        ("fixed_dt", config.fixed_dt),
        ("max_delta", config.max_delta),
        ("dash_multiplier", config.dash_multiplier),
    ];
    for (name, value) in positive {
        if !(value.is_finite() && value > 0.0) {
            return Err(format!("Engine config validation failed: {name} must be > 0"));
        }
    }
    let non_negative = [
        ("invulnerability_secs", config.invulnerability_secs),
        ("chase_deadzone", config.chase_deadzone),
        ("patrol_range", config.patrol_range),
        ("dash_secs", config.dash_secs),
        ("dash_cooldown_secs", config.dash_cooldown_secs),
    ];
    for (name, value) in non_negative {
        if !(value.is_finite() && value >= 0.0) {
            return Err(format!("Engine config validation failed: {name} must be >= 0"));
        }
    }
    if !(config.width.is_finite() && config.height.is_finite()) {
        return Err("Engine config validation failed: width/height must be finite".to_string());
    }
    if config.fps_window == 0 {
        return Err("Engine config validation failed: fps_window must be >= 1".to_string());
    }
    Ok(())
}

const fn default_width() -> f32 {
    800.0
}

const fn default_height() -> f32 {
    600.0
}

const fn default_fixed_dt() -> f32 {
    1.0 / 60.0
}

const fn default_max_delta() -> f32 {
    0.1
}

const fn default_invulnerability() -> f32 {
    1.0
}

const fn default_damage() -> u32 {
    1
}

const fn default_chase_deadzone() -> f32 {
    8.0
}

const fn default_patrol_range() -> f32 {
    160.0
}

const fn default_weather_particles() -> usize {
    60
}

const fn default_fps_window() -> usize {
    60
}

const fn default_dash_multiplier() -> f32 {
    2.2
}

const fn default_dash_secs() -> f32 {
    0.18
}

const fn default_dash_cooldown() -> f32 {
    0.8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "pf_config_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn empty_object_uses_defaults() {
        let path = temp_file_path("defaults");
        fs::write(&path, "{}").expect("write config file");
        let config = load_config_from_path(&path).expect("config should load");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.width, 800.0);
        assert_eq!(config.max_delta, 0.1);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn partial_config_overrides_fields() {
        let path = temp_file_path("partial");
        fs::write(&path, r#"{ "width": 320, "patrol_range": 40.5 }"#).expect("write config file");
        let config = load_config_from_path(&path).expect("config should load");
        assert_eq!(config.width, 320.0);
        assert_eq!(config.patrol_range, 40.5);
        assert_eq!(config.height, 600.0);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn non_positive_step_is_rejected() {
        let path = temp_file_path("bad_dt");
        fs::write(&path, r#"{ "fixed_dt": 0 }"#).expect("write config file");
        let err = load_config_from_path(&path).expect_err("zero fixed_dt must fail");
        assert!(err.contains("fixed_dt"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn malformed_json_reports_path() {
        let path = temp_file_path("malformed");
        fs::write(&path, "{ not json").expect("write config file");
        let err = load_config_from_path(&path).expect_err("malformed config must fail");
        assert!(err.contains("Failed to parse engine config JSON"));
        let _ = fs::remove_file(path);
    }
}
