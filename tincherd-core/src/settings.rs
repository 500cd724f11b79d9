//! Local node settings.
//!
//! The bootstrap settings file is YAML. Optional fields default to the
//! historical paths; `peerid` and `networkname` are the only hard
//! requirements and are checked by [`LocalSettings::validate`], never by
//! serde (so a half-written file still produces a readable error).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::ExclusionSet;

/// Placeholder substituted with the subnet value in route command
/// templates. Templates are plain strings; they are never evaluated.
pub const SUBNET_PLACEHOLDER: &str = "{subnet}";

/// This node's identity and policy, loaded once and immutable for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSettings {
    /// Our own peer name; must match an entry in the fetched registry.
    #[serde(default)]
    pub peerid: String,
    /// Mesh network name, passed to the daemon as `-n <networkname>`.
    #[serde(default)]
    pub networkname: String,

    /// Local VPN addresses; empty means the family is not configured.
    #[serde(default)]
    pub vpn_ip: String,
    #[serde(default)]
    pub vpn_ip6: String,

    #[serde(default = "default_tincd_bin")]
    pub tincd_bin: PathBuf,
    /// Control utility for tinc >= 1.1; optional.
    #[serde(default)]
    pub tincctl_bin: Option<PathBuf>,
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,
    #[serde(default = "default_pidfile")]
    pub pidfile: PathBuf,
    #[serde(default = "default_master_url")]
    pub master_url: String,

    /// Optional `Interface=` / `Device=` lines for the daemon config.
    #[serde(default)]
    pub tincd_interface: String,
    #[serde(default)]
    pub tincd_device: String,
    #[serde(default)]
    pub tincd_graphdumpfile: String,

    /// Interface bring-up commands, emitted verbatim into tinc-up.
    #[serde(default)]
    pub ifconfig: String,
    #[serde(default)]
    pub ifconfig6: String,

    /// Route command templates with one `{subnet}` placeholder.
    #[serde(default)]
    pub routeadd: String,
    #[serde(default)]
    pub routedel: String,
    #[serde(default)]
    pub routeadd6: String,
    #[serde(default)]
    pub routedel6: String,

    /// Free-text snippet appended to tinc-up after the routes.
    #[serde(default)]
    pub postup: String,

    /// Peer names excluded from all topology decisions.
    #[serde(default)]
    pub exclude: ExclusionSet,

    #[serde(default)]
    pub use_dynamic_routes: bool,
    #[serde(default)]
    pub connect_only_to_primary_nodes: bool,
    #[serde(default)]
    pub run_ifdown: bool,

    /// Seconds to wait before restarting an unexpectedly dead daemon.
    #[serde(default = "default_restart_delay")]
    pub restart_delay: u64,
    /// Graceful-shutdown window in seconds before SIGKILL escalation.
    #[serde(default = "default_stop_grace")]
    pub stop_grace: u64,

    /// Daemon version override. When absent the daemon is probed with
    /// `--version`; when that fails too, version-gated features are off.
    #[serde(default)]
    pub tincd_version: Option<String>,
}

fn default_tincd_bin() -> PathBuf {
    PathBuf::from("/usr/sbin/tincd")
}

fn default_base_path() -> PathBuf {
    PathBuf::from("/etc/tinc")
}

fn default_pidfile() -> PathBuf {
    PathBuf::from("/var/run/tinc.pid")
}

fn default_master_url() -> String {
    "https://www.vpn.hamburg.ccc.de/tinc-chaosvpn.txt".to_string()
}

fn default_restart_delay() -> u64 {
    15
}

fn default_stop_grace() -> u64 {
    5
}

impl Default for LocalSettings {
    fn default() -> Self {
        // serde_yaml on an empty mapping would fail; route through the
        // field defaults directly instead.
        Self {
            peerid: String::new(),
            networkname: String::new(),
            vpn_ip: String::new(),
            vpn_ip6: String::new(),
            tincd_bin: default_tincd_bin(),
            tincctl_bin: None,
            base_path: default_base_path(),
            pidfile: default_pidfile(),
            master_url: default_master_url(),
            tincd_interface: String::new(),
            tincd_device: String::new(),
            tincd_graphdumpfile: String::new(),
            ifconfig: String::new(),
            ifconfig6: String::new(),
            routeadd: String::new(),
            routedel: String::new(),
            routeadd6: String::new(),
            routedel6: String::new(),
            postup: String::new(),
            exclude: ExclusionSet::default(),
            use_dynamic_routes: false,
            connect_only_to_primary_nodes: false,
            run_ifdown: false,
            restart_delay: default_restart_delay(),
            stop_grace: default_stop_grace(),
            tincd_version: None,
        }
    }
}

impl LocalSettings {
    /// Load settings from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let settings: Self =
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Yaml {
                path: path.to_path_buf(),
                source: e,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check the hard requirements. Everything else has a usable default.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.peerid.is_empty() {
            return Err(ConfigError::MissingField("peerid"));
        }
        if self.networkname.is_empty() {
            return Err(ConfigError::MissingField("networkname"));
        }
        Ok(())
    }

    /// Registry URL with our peer id attached, as the master expects it.
    pub fn registry_url(&self) -> String {
        format!("{}?id={}", self.master_url, self.peerid)
    }

    /// Per-network artifact directory, `<base_path>/<networkname>`. Every
    /// generated file lives under this, including the shutdown hook.
    pub fn network_base(&self) -> PathBuf {
        self.base_path.join(&self.networkname)
    }
}

/// Substitute the subnet value into a route command template.
///
/// Plain string replacement of `{subnet}`; templates are never evaluated
/// as code. A template without the placeholder comes back unchanged.
pub fn apply_route_template(template: &str, subnet: &str) -> String {
    template.replace(SUBNET_PLACEHOLDER, subnet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_settings(yaml: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().expect("tempfile");
        f.write_all(yaml.as_bytes()).expect("write");
        f
    }

    #[test]
    fn minimal_settings_load_with_defaults() {
        let f = write_settings("peerid: bob\nnetworkname: chaos\n");
        let s = LocalSettings::load(f.path()).expect("load");
        assert_eq!(s.peerid, "bob");
        assert_eq!(s.networkname, "chaos");
        assert_eq!(s.tincd_bin, PathBuf::from("/usr/sbin/tincd"));
        assert_eq!(s.base_path, PathBuf::from("/etc/tinc"));
        assert_eq!(s.restart_delay, 15);
        assert_eq!(s.stop_grace, 5);
        assert!(!s.use_dynamic_routes);
        assert!(s.tincd_version.is_none());
    }

    #[test]
    fn missing_peerid_is_a_config_error() {
        let f = write_settings("networkname: chaos\n");
        let err = LocalSettings::load(f.path()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("peerid")));
    }

    #[test]
    fn missing_networkname_is_a_config_error() {
        let f = write_settings("peerid: bob\n");
        let err = LocalSettings::load(f.path()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("networkname")));
    }

    #[test]
    fn malformed_yaml_reports_path() {
        let f = write_settings("peerid: [unclosed\n");
        let err = LocalSettings::load(f.path()).unwrap_err();
        match err {
            ConfigError::Yaml { path, .. } => assert_eq!(path, f.path()),
            other => panic!("expected Yaml error, got {other:?}"),
        }
    }

    #[test]
    fn exclude_list_parses_into_exclusion_set() {
        let f = write_settings("peerid: bob\nnetworkname: chaos\nexclude: [Eve, mallory]\n");
        let s = LocalSettings::load(f.path()).expect("load");
        assert!(s.exclude.contains("eve"));
        assert!(s.exclude.contains("MALLORY"));
        assert!(!s.exclude.contains("bob"));
    }

    #[test]
    fn registry_url_appends_peer_id() {
        let s = LocalSettings {
            peerid: "bob".to_string(),
            master_url: "https://example.net/mesh.txt".to_string(),
            ..Default::default()
        };
        assert_eq!(s.registry_url(), "https://example.net/mesh.txt?id=bob");
    }

    #[test]
    fn network_base_nests_under_the_base_path() {
        let s = LocalSettings {
            networkname: "chaos".to_string(),
            ..Default::default()
        };
        assert_eq!(s.network_base(), PathBuf::from("/etc/tinc/chaos"));
    }

    #[test]
    fn route_template_substitution() {
        assert_eq!(
            apply_route_template("/sbin/ip route add {subnet} dev vpn", "10.0.1.0/24"),
            "/sbin/ip route add 10.0.1.0/24 dev vpn"
        );
        assert_eq!(apply_route_template("no placeholder", "10.0.1.0/24"), "no placeholder");
    }
}
