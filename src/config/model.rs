//! Configuration data model.
//!
//! All structs derive `Serialize`/`Deserialize` for TOML persistence.
//! Every field has a sensible default so a kiosk boots without a config file.

use crate::surface::policy::CertPolicyKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub surface: SurfaceConfig,
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub wake_lock: WakeLockConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the configured URL is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

/// Render surface: page probe and optional viewer process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// Upper bound for one navigation, connect to status line.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Prefix of the user agent; ` KioskBrowser/1.0` is always appended.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Program plus arguments shown while a page is displayed, URL appended.
    /// Empty disables the viewer.
    #[serde(default)]
    pub viewer_command: Vec<String>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
            viewer_command: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub policy: CertPolicyKind,
    #[serde(default = "default_ca_bundle")]
    pub ca_bundle: PathBuf,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            policy: CertPolicyKind::default(),
            ca_bundle: default_ca_bundle(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,
    /// Skip the sysfs check and treat the network as always available.
    #[serde(default)]
    pub assume_online: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            sysfs_root: default_sysfs_root(),
            assume_online: false,
        }
    }
}

/// Size of the unlock region in terminal cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureConfig {
    #[serde(default = "default_region_width")]
    pub region_width: u16,
    #[serde(default = "default_region_height")]
    pub region_height: u16,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            region_width: default_region_width(),
            region_height: default_region_height(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            socket_path: default_socket_path(),
        }
    }
}

/// Inhibitor process kept alive while the kiosk runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WakeLockConfig {
    #[serde(default = "default_wake_command")]
    pub command: Vec<String>,
}

impl Default for WakeLockConfig {
    fn default() -> Self {
        Self {
            command: default_wake_command(),
        }
    }
}

/// Diagnostic log output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_file")]
    pub file: String,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kiosk-pin")
        .join("settings.toml")
}
fn default_timeout_ms() -> u64 {
    15_000
}
fn default_user_agent() -> String {
    format!("kiosk-pin/{}", env!("CARGO_PKG_VERSION"))
}
fn default_ca_bundle() -> PathBuf {
    PathBuf::from("/etc/ssl/certs/ca-certificates.crt")
}
fn default_sysfs_root() -> PathBuf {
    PathBuf::from("/sys/class/net")
}
fn default_region_width() -> u16 {
    8
}
fn default_region_height() -> u16 {
    3
}
fn default_socket_path() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("kiosk-pin.sock")
}
fn default_wake_command() -> Vec<String> {
    [
        "systemd-inhibit",
        "--what=idle:sleep",
        "--who=kiosk-pin",
        "--why=Kiosk display",
        "--mode=block",
        "sleep",
        "infinity",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_log_file() -> String {
    "~/.local/share/kiosk-pin/kiosk.log".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
