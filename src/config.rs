//! Configuration loading with multi-source merging.

use crate::model::DEFAULT_MAX_TOKENS;
use crate::render::RenderOptions;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "mbtiverse-panel";
const PROJECT_FILE: &str = "mbtiverse.toml";
const ENV_PREFIX: &str = "MBTIVERSE_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Base URL of the analysis service; `/full_pipeline` is resolved against it.
    pub base_url: String,
    pub max_tokens: u32,
    /// Whole-request timeout handed to the HTTP client.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Log structured meta reviews that fail to parse before falling back to narrative.
    pub log_parse_failures: bool,
    /// Nesting depth after which structured dumps are elided.
    pub max_render_depth: usize,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(120),
            log_parse_failures: false,
            max_render_depth: 8,
        }
    }
}

impl PanelConfig {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            max_depth: self.max_render_depth.clamp(1, 32),
            report_parse_failures: self.log_parse_failures,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. `MBTIVERSE_*` environment variables
    /// 2. Explicit config path (if provided)
    /// 3. Project file: `./mbtiverse.toml`
    /// 4. Global file: `$XDG_CONFIG_HOME/mbtiverse-panel/config.toml`
    /// 5. Default values
    ///
    /// CLI flags are applied on top by the caller.
    pub fn load(explicit: Option<&Path>) -> Result<PanelConfig, Box<figment::Error>> {
        Self::figment(explicit, Path::new("."))
            .extract()
            .map_err(Box::new)
    }

    fn figment(explicit: Option<&Path>, project_root: &Path) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(PanelConfig::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(&global_path));
            }
        }

        let project_path = project_root.join(PROJECT_FILE);
        if project_path.exists() {
            figment = figment.merge(Toml::file(&project_path));
        }

        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PanelConfig::default();
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.base_url, "http://localhost:8000");
        assert!(!config.log_parse_failures);
    }

    #[test]
    fn test_project_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PROJECT_FILE),
            "base_url = \"http://panel.internal:9000\"\ntimeout = \"30s\"\n",
        )
        .unwrap();

        let config: PanelConfig = ConfigLoader::figment(None, dir.path()).extract().unwrap();
        assert_eq!(config.base_url, "http://panel.internal:9000");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_tokens, 512);
    }

    #[test]
    fn test_explicit_file_beats_project_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROJECT_FILE), "max_render_depth = 3\n").unwrap();
        let explicit = dir.path().join("custom.toml");
        std::fs::write(&explicit, "max_render_depth = 5\nlog_parse_failures = true\n").unwrap();

        let config: PanelConfig = ConfigLoader::figment(Some(&explicit), dir.path())
            .extract()
            .unwrap();
        assert_eq!(config.max_render_depth, 5);
        assert!(config.log_parse_failures);
    }

    #[test]
    fn test_render_depth_is_clamped() {
        let config = PanelConfig {
            max_render_depth: 0,
            ..Default::default()
        };
        assert_eq!(config.render_options().max_depth, 1);

        let config = PanelConfig {
            max_render_depth: 500,
            ..Default::default()
        };
        assert_eq!(config.render_options().max_depth, 32);
    }

    #[test]
    fn test_global_config_path_mentions_app() {
        if let Some(path) = ConfigLoader::global_config_path() {
            assert!(path.to_string_lossy().contains(APP_DIR));
        }
    }
}
