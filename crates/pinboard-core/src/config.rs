use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Project-level settings from `.pinboard/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub join: JoinConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_file_name")]
    pub file_name: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_true")]
    pub public: bool,
    /// Request timeout. Unset means the transport's own behavior.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            file_name: default_file_name(),
            description: default_description(),
            public: default_true(),
            timeout_secs: None,
        }
    }
}

impl RemoteConfig {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl PollConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Directory holding `pending-events.json`.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoinConfig {
    /// Participant page that join links point at.
    #[serde(default)]
    pub base_url: Option<String>,
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".pinboard/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Pick the fallback data directory.
///
/// Precedence (highest wins): explicit flag, `PINBOARD_DATA_DIR`, project
/// config, then the platform's local data dir.
#[must_use]
pub fn resolve_data_dir(
    flag: Option<&Path>,
    env_dir: Option<PathBuf>,
    config: &FallbackConfig,
    project_root: &Path,
) -> PathBuf {
    if let Some(dir) = flag {
        return dir.to_path_buf();
    }
    if let Some(dir) = env_dir.filter(|d| !d.as_os_str().is_empty()) {
        return dir;
    }
    if let Some(dir) = &config.dir {
        return if dir.is_absolute() {
            dir.clone()
        } else {
            project_root.join(dir)
        };
    }
    dirs::data_local_dir()
        .map(|d| d.join("pinboard"))
        .unwrap_or_else(|| project_root.join(".pinboard"))
}

const fn default_true() -> bool {
    true
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_file_name() -> String {
    "events.json".to_string()
}

fn default_description() -> String {
    "Pinboard events".to_string()
}

const fn default_interval_ms() -> u64 {
    3000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().expect("temp dir");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.remote.api_base, "https://api.github.com");
        assert_eq!(cfg.remote.file_name, "events.json");
        assert!(cfg.remote.public);
        assert!(cfg.remote.timeout().is_none());
        assert_eq!(cfg.poll.interval(), Duration::from_millis(3000));
        assert!(cfg.fallback.dir.is_none());
        assert!(cfg.join.base_url.is_none());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let root = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir_all(root.path().join(".pinboard")).expect("mkdir");
        std::fs::write(
            root.path().join(".pinboard/config.toml"),
            r#"
[poll]
interval_ms = 500

[remote]
timeout_secs = 10

[join]
base_url = "https://example.org/mobile.html"
"#,
        )
        .expect("write config");

        let cfg = load_project_config(root.path()).expect("load");
        assert_eq!(cfg.poll.interval_ms, 500);
        assert_eq!(cfg.remote.timeout(), Some(Duration::from_secs(10)));
        assert_eq!(cfg.remote.file_name, "events.json");
        assert_eq!(
            cfg.join.base_url.as_deref(),
            Some("https://example.org/mobile.html")
        );
    }

    #[test]
    fn broken_config_reports_path() {
        let root = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir_all(root.path().join(".pinboard")).expect("mkdir");
        std::fs::write(root.path().join(".pinboard/config.toml"), "[poll\n").expect("write");

        let err = load_project_config(root.path()).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn data_dir_precedence() {
        let root = Path::new("/project");
        let cfg = FallbackConfig {
            dir: Some(PathBuf::from("state")),
        };

        let flag = resolve_data_dir(
            Some(Path::new("/flag")),
            Some(PathBuf::from("/env")),
            &cfg,
            root,
        );
        assert_eq!(flag, PathBuf::from("/flag"));

        let env = resolve_data_dir(None, Some(PathBuf::from("/env")), &cfg, root);
        assert_eq!(env, PathBuf::from("/env"));

        let configured = resolve_data_dir(None, None, &cfg, root);
        assert_eq!(configured, PathBuf::from("/project/state"));

        let empty_env = resolve_data_dir(None, Some(PathBuf::new()), &cfg, root);
        assert_eq!(empty_env, PathBuf::from("/project/state"));
    }

    #[test]
    fn zero_interval_is_clamped() {
        let poll = PollConfig { interval_ms: 0 };
        assert_eq!(poll.interval(), Duration::from_millis(1));
    }
}
