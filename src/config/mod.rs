pub mod model;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub use model::*;

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kiosk-pin")
        .join("config.toml")
}

/// Load the config at `path`, or the default location. A missing file yields
/// the defaults.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}

pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }
    let contents = toml::to_string_pretty(config).with_context(|| "Failed to serialize config")?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    Ok(())
}

/// Expand a leading `~/` against the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::policy::CertPolicyKind;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kiosk-pin-config-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = temp_dir("missing");
        let cfg = load_config(Some(&dir.join("nope.toml"))).unwrap();
        assert_eq!(cfg.surface.timeout_ms, 15_000);
        assert_eq!(cfg.gesture.region_width, 8);
        assert_eq!(cfg.gesture.region_height, 3);
        assert_eq!(cfg.tls.policy, CertPolicyKind::TrustAll);
        assert!(cfg.control.enabled);
        assert!(!cfg.network.assume_online);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = temp_dir("partial");
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            "[tls]\npolicy = \"verify-strict\"\n\n[surface]\nviewer_command = [\"cog\"]\n",
        )
        .unwrap();

        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.tls.policy, CertPolicyKind::VerifyStrict);
        assert_eq!(cfg.surface.viewer_command, vec!["cog".to_string()]);
        assert_eq!(cfg.surface.timeout_ms, 15_000);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_save_then_load() {
        let dir = temp_dir("save");
        let path = dir.join("sub").join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.network.assume_online = true;
        cfg.gesture.region_width = 12;
        save_config(&cfg, &path).unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert!(loaded.network.assume_online);
        assert_eq!(loaded.gesture.region_width, 12);
    }

    #[test]
    fn test_bad_file_is_an_error() {
        let dir = temp_dir("bad");
        let path = dir.join("config.toml");
        std::fs::write(&path, "[gesture]\nregion_width = \"wide\"\n").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/var/log/k.log"), PathBuf::from("/var/log/k.log"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/k.log"), home.join("k.log"));
        }
    }
}
