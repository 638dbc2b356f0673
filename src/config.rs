use std::env;
use std::path::PathBuf;

use tracing::warn;

pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 720;

/// Startup configuration, read once from `LUMEN_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// OBJ model; the built-in box when unset
    pub model_path: Option<PathBuf>,
    pub diffuse_path: Option<PathBuf>,
    pub specular_path: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            diffuse_path: None,
            specular_path: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        let dimension = |key: &str, default: u32| match lookup(key) {
            None => default,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(v) if v > 0 => v,
                _ => {
                    warn!(key, value = %raw, default, "invalid window dimension, using default");
                    default
                }
            },
        };

        Self {
            model_path: path("LUMEN_MODEL"),
            diffuse_path: path("LUMEN_DIFFUSE"),
            specular_path: path("LUMEN_SPECULAR"),
            width: dimension("LUMEN_WIDTH", DEFAULT_WIDTH),
            height: dimension("LUMEN_HEIGHT", DEFAULT_HEIGHT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(AppConfig::from_lookup(lookup(&[])), AppConfig::default());
    }

    #[test]
    fn reads_paths_and_size() {
        let config = AppConfig::from_lookup(lookup(&[
            ("LUMEN_MODEL", "assets/backpack.obj"),
            ("LUMEN_DIFFUSE", " assets/diffuse.jpg "),
            ("LUMEN_WIDTH", "800"),
            ("LUMEN_HEIGHT", "600"),
        ]));
        assert_eq!(config.model_path, Some(PathBuf::from("assets/backpack.obj")));
        assert_eq!(config.diffuse_path, Some(PathBuf::from("assets/diffuse.jpg")));
        assert_eq!(config.specular_path, None);
        assert_eq!((config.width, config.height), (800, 600));
    }

    #[test]
    fn bad_dimensions_fall_back() {
        let config = AppConfig::from_lookup(lookup(&[("LUMEN_WIDTH", "0"), ("LUMEN_HEIGHT", "tall")]));
        assert_eq!((config.width, config.height), (DEFAULT_WIDTH, DEFAULT_HEIGHT));
    }

    #[test]
    fn blank_path_is_unset() {
        let config = AppConfig::from_lookup(lookup(&[("LUMEN_MODEL", "  ")]));
        assert_eq!(config.model_path, None);
    }
}
