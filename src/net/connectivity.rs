//! Connectivity oracle and the gate built on top of it.
//!
//! The production oracle walks `/sys/class/net`, the same place `ip link`
//! gets its data from, and classifies every interface that is up by its
//! link-layer transport. Only Wi-Fi, Ethernet and Cellular count as a viable
//! path to the kiosk destination.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

// ARPHRD_* values from linux/if_arp.h
const ARPHRD_ETHER: u32 = 1;
const ARPHRD_PPP: u32 = 512;
const ARPHRD_RAWIP: u32 = 519;
const ARPHRD_LOOPBACK: u32 = 772;

const VIRTUAL_PREFIXES: &[&str] = &["veth", "docker", "virbr", "br-", "tailscale", "wg", "zt"];
const CELLULAR_PREFIXES: &[&str] = &["wwan", "rmnet", "ppp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Transport {
    Wifi,
    Ethernet,
    Cellular,
    Loopback,
    Virtual,
}

impl Transport {
    /// Whether this transport can carry the kiosk to its destination.
    pub fn is_viable(self) -> bool {
        matches!(self, Transport::Wifi | Transport::Ethernet | Transport::Cellular)
    }
}

/// Platform service reporting the transports of currently active networks.
pub trait ConnectivityOracle: Send {
    fn active_transports(&self) -> BTreeSet<Transport>;
}

/// Oracle with a fixed answer. Backs `network.assume_online` and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticOracle {
    transports: BTreeSet<Transport>,
}

impl StaticOracle {
    pub fn new(transports: impl IntoIterator<Item = Transport>) -> Self {
        Self {
            transports: transports.into_iter().collect(),
        }
    }

    #[cfg(test)]
    pub fn offline() -> Self {
        Self::default()
    }
}

impl ConnectivityOracle for StaticOracle {
    fn active_transports(&self) -> BTreeSet<Transport> {
        self.transports.clone()
    }
}

/// Reads interface state from a sysfs `class/net` directory.
#[derive(Debug, Clone)]
pub struct SysfsOracle {
    root: PathBuf,
}

impl SysfsOracle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ConnectivityOracle for SysfsOracle {
    fn active_transports(&self) -> BTreeSet<Transport> {
        let mut found = BTreeSet::new();
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!("Cannot read {}: {}", self.root.display(), err);
                return found;
            }
        };

        for entry in entries.flatten() {
            let iface = entry.file_name().to_string_lossy().to_string();
            let base = self.root.join(&iface);
            if !is_active(&base) {
                continue;
            }
            let transport = classify(&iface, &base);
            tracing::trace!(iface = %iface, ?transport, "active interface");
            found.insert(transport);
        }
        found
    }
}

fn read_trim(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|v| v.trim().to_string())
}

fn is_active(base: &Path) -> bool {
    match read_trim(&base.join("operstate")).as_deref() {
        Some("up") => true,
        // tun and most modem drivers never report "up"
        Some("unknown") => read_trim(&base.join("carrier")).as_deref() == Some("1"),
        _ => false,
    }
}

fn classify(iface: &str, base: &Path) -> Transport {
    let link_type = read_trim(&base.join("type")).and_then(|t| t.parse::<u32>().ok());

    if iface == "lo" || link_type == Some(ARPHRD_LOOPBACK) {
        return Transport::Loopback;
    }
    if base.join("wireless").exists() || base.join("phy80211").exists() {
        return Transport::Wifi;
    }
    if base.join("bridge").exists()
        || base.join("tun_flags").exists()
        || VIRTUAL_PREFIXES.iter().any(|p| iface.starts_with(p))
    {
        return Transport::Virtual;
    }
    if matches!(link_type, Some(ARPHRD_PPP) | Some(ARPHRD_RAWIP))
        || CELLULAR_PREFIXES.iter().any(|p| iface.starts_with(p))
    {
        return Transport::Cellular;
    }
    if link_type == Some(ARPHRD_ETHER) {
        Transport::Ethernet
    } else {
        Transport::Virtual
    }
}

/// Answers "can a load be attempted right now". Never caches.
pub struct ConnectivityGate {
    oracle: Box<dyn ConnectivityOracle>,
}

impl ConnectivityGate {
    pub fn new(oracle: Box<dyn ConnectivityOracle>) -> Self {
        Self { oracle }
    }

    pub fn is_reachable(&self) -> bool {
        self.oracle
            .active_transports()
            .into_iter()
            .any(Transport::is_viable)
    }
}
