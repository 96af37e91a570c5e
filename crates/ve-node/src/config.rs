//! Node configuration, loadable from TOML and overridable from the command line.

use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use ve_canbus::policy::default_read_list;
use ve_canbus::{GatewayPolicy, monitor, scheduler};
use ve_protocol::EcuRole;

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "ve-node")]
#[command(about = "Virtual ECU node on a CAN FD bus")]
#[command(version)]
pub struct Cli {
    /// ECU role: powertrain, chassis, body, gateway or observer
    pub role: EcuRole,

    /// Configuration file path (TOML format)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Inner CAN FD interface
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Outer CAN FD interface (gateway only)
    #[arg(long)]
    pub outer_interface: Option<String>,

    /// Serial device of the GUI link (e.g. /dev/pts/3)
    #[arg(short, long)]
    pub serial: Option<String>,

    /// Shared bus key: 64 hex characters or a passphrase of at least 32 bytes
    #[arg(long, env = "VE_NODE_KEY", hide_env_values = true)]
    pub key: Option<String>,
}

/// Top-level configuration for one ECU node.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    /// Inner CAN FD interface.
    #[serde(default = "default_interface")]
    pub interface: String,
    /// Outer CAN FD interface, only opened by the gateway.
    #[serde(default = "default_outer_interface")]
    pub outer_interface: String,
    /// Serial device of the GUI link. None runs headless.
    #[serde(default)]
    pub serial_port: Option<String>,
    /// Shared bus key. None sends plaintext frames.
    #[serde(default)]
    pub key: Option<String>,
    /// Upper bound on one bus poll, in microseconds.
    #[serde(default = "default_poll_timeout_us")]
    pub poll_timeout_us: u64,
    /// Resend every telemetry field after this much GUI silence.
    #[serde(default = "default_telemetry_refresh_ms")]
    pub telemetry_refresh_ms: u64,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub observer: ObserverConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// How early a message may fire before its period elapses.
    #[serde(default = "default_early_fire_us")]
    pub early_fire_us: u64,
    /// Pause after each periodic frame.
    #[serde(default = "default_spacing_us")]
    pub spacing_us: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObserverConfig {
    #[serde(default = "default_tolerance_us")]
    pub tolerance_us: u64,
    #[serde(default = "default_reset_window_ms")]
    pub reset_window_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Ids forwarded inner → outer.
    #[serde(default = "default_read_list")]
    pub read_allow: Vec<u32>,
    /// Ids forwarded outer → inner.
    #[serde(default)]
    pub write_allow: Vec<u32>,
}

fn default_interface() -> String {
    "vcan0".to_string()
}

fn default_outer_interface() -> String {
    "vcan1".to_string()
}

fn default_poll_timeout_us() -> u64 {
    100
}

fn default_telemetry_refresh_ms() -> u64 {
    100
}

fn default_early_fire_us() -> u64 {
    scheduler::DEFAULT_EARLY_FIRE_US
}

fn default_spacing_us() -> u64 {
    scheduler::DEFAULT_SPACING.as_micros() as u64
}

fn default_tolerance_us() -> u64 {
    monitor::DEFAULT_TOLERANCE_US
}

fn default_reset_window_ms() -> u64 {
    monitor::DEFAULT_RESET_WINDOW_US / 1000
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            outer_interface: default_outer_interface(),
            serial_port: None,
            key: None,
            poll_timeout_us: default_poll_timeout_us(),
            telemetry_refresh_ms: default_telemetry_refresh_ms(),
            scheduler: SchedulerConfig::default(),
            observer: ObserverConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            early_fire_us: default_early_fire_us(),
            spacing_us: default_spacing_us(),
        }
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            tolerance_us: default_tolerance_us(),
            reset_window_ms: default_reset_window_ms(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            read_allow: default_read_list(),
            write_allow: Vec::new(),
        }
    }
}

impl NodeConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// File config (or defaults) with command-line overrides applied.
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)
                .map_err(|e| anyhow::anyhow!("failed to load config {path}: {e}"))?,
            None => Self::default(),
        };
        config.apply_overrides(cli);
        Ok(config)
    }

    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(interface) = &cli.interface {
            self.interface = interface.clone();
        }
        if let Some(outer) = &cli.outer_interface {
            self.outer_interface = outer.clone();
        }
        if cli.serial.is_some() {
            self.serial_port = cli.serial.clone();
        }
        if cli.key.is_some() {
            self.key = cli.key.clone();
        }
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_micros(self.poll_timeout_us)
    }

    pub fn spacing(&self) -> Duration {
        Duration::from_micros(self.scheduler.spacing_us)
    }

    pub fn gateway_policy(&self) -> GatewayPolicy {
        GatewayPolicy::new(
            self.gateway.read_allow.iter().copied(),
            self.gateway.write_allow.iter().copied(),
        )
    }

    /// Whether this role opens the outer segment.
    pub fn needs_outer(role: EcuRole) -> bool {
        role == EcuRole::Gateway
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_empty_config() {
        let config: NodeConfig = toml::from_str("").unwrap();
        assert_eq!(config.interface, "vcan0");
        assert_eq!(config.outer_interface, "vcan1");
        assert!(config.serial_port.is_none());
        assert!(config.key.is_none());
        assert_eq!(config.poll_timeout_us, 100);
        assert_eq!(config.telemetry_refresh_ms, 100);
        assert_eq!(config.scheduler.early_fire_us, 300);
        assert_eq!(config.scheduler.spacing_us, 10);
        assert_eq!(config.observer.tolerance_us, 6000);
        assert_eq!(config.observer.reset_window_ms, 1000);
        assert!(!config.gateway.read_allow.contains(&0x24));
        assert!(config.gateway.read_allow.contains(&0x43));
        assert!(config.gateway.write_allow.is_empty());
    }

    #[test]
    fn deserialize_full_config() {
        let toml = r#"
interface = "can0"
outer_interface = "can1"
serial_port = "/dev/pts/4"
poll_timeout_us = 250
telemetry_refresh_ms = 200

[scheduler]
early_fire_us = 500
spacing_us = 0

[observer]
tolerance_us = 3000
reset_window_ms = 2000

[gateway]
read_allow = [0x43, 0x77]
write_allow = [0x1a]
"#;
        let config: NodeConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.interface, "can0");
        assert_eq!(config.serial_port.as_deref(), Some("/dev/pts/4"));
        assert_eq!(config.poll_timeout(), Duration::from_micros(250));
        assert_eq!(config.spacing(), Duration::ZERO);
        assert_eq!(config.observer.tolerance_us, 3000);

        let policy = config.gateway_policy();
        assert!(policy.read_allowed(0x77));
        assert!(!policy.read_allowed(0x62));
        assert!(policy.write_allowed(0x1a));
    }

    #[test]
    fn cli_overrides_file_values() {
        let cli = Cli::parse_from([
            "ve-node",
            "gateway",
            "--interface",
            "vcan5",
            "--outer-interface",
            "vcan6",
            "--serial",
            "/dev/pts/9",
        ]);
        assert_eq!(cli.role, EcuRole::Gateway);

        let mut config: NodeConfig = toml::from_str("interface = \"can0\"").unwrap();
        config.apply_overrides(&cli);
        assert_eq!(config.interface, "vcan5");
        assert_eq!(config.outer_interface, "vcan6");
        assert_eq!(config.serial_port.as_deref(), Some("/dev/pts/9"));
    }

    #[test]
    fn cli_rejects_unknown_role() {
        assert!(Cli::try_parse_from(["ve-node", "radio"]).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let cli = Cli::parse_from(["ve-node", "body", "--config", "/nonexistent/ve-node.toml"]);
        assert!(NodeConfig::load(&cli).is_err());
    }
}
