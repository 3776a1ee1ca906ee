//! Server controller configuration structs and defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerSettings,
    pub console: ConsoleSettings,
    pub timing: TimingSettings,
    pub service: ServiceSettings,
    pub backup: BackupSettings,
    pub logging: LoggingSettings,
    pub paths: PathSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub name: String,
    pub server_dir: PathBuf,
    pub launch_command: String,
    pub session_name: String,
    pub owner_user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    pub rcon_binary: PathBuf,
    pub rcon_config: PathBuf,
    pub status_command: String,
    pub warning_message: String,
    pub save_command: String,
    pub stop_command: String,
    pub gametime_command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub grace_secs: u64,
    pub settle_secs: u64,
    pub poll_interval_secs: u64,
    pub max_attempts: u32,
    pub poll_timeout_secs: Option<u64>, // None = bounded by max_attempts only
}

impl TimingSettings {
    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn poll_timeout(&self) -> Option<Duration> {
        self.poll_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    pub unit: String,
    pub systemctl_path: PathBuf,
    pub use_sudo: bool,
}

/// What the backup controller does with the service after archiving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartPolicy {
    /// Start the service unconditionally, even if it was stopped beforehand.
    Always,
    /// Only start the service if it was active when the backup began.
    IfWasRunning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupSettings {
    pub backups_dir: PathBuf,
    pub tar_binary: PathBuf,
    pub include_gametime: bool,
    pub restart_policy: RestartPolicy,
    pub tiers: BackupTiers,
}

/// Each tier falls back field by field to its own defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "PartialTiers")]
pub struct BackupTiers {
    pub daily: TierSettings,
    pub weekly: TierSettings,
    pub monthly: TierSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierSettings {
    /// Subdirectory of `backups_dir`
    pub dir: String,
    pub interval_hours: u64,
    pub retention_hours: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialTier {
    dir: Option<String>,
    interval_hours: Option<u64>,
    retention_hours: Option<u64>,
}

impl PartialTier {
    fn over(self, base: TierSettings) -> TierSettings {
        TierSettings {
            dir: self.dir.unwrap_or(base.dir),
            interval_hours: self.interval_hours.unwrap_or(base.interval_hours),
            retention_hours: self.retention_hours.unwrap_or(base.retention_hours),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialTiers {
    daily: PartialTier,
    weekly: PartialTier,
    monthly: PartialTier,
}

impl From<PartialTiers> for BackupTiers {
    fn from(partial: PartialTiers) -> Self {
        let base = BackupTiers::default();
        Self {
            daily: partial.daily.over(base.daily),
            weekly: partial.weekly.over(base.weekly),
            monthly: partial.monthly.over(base.monthly),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub lock_file: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            name: "Minecraft".to_string(),
            server_dir: PathBuf::from("/srv/minecraft/current"),
            launch_command: "/srv/minecraft/current/start.sh".to_string(),
            session_name: "minecraft-server".to_string(),
            owner_user: "minecraft".to_string(),
        }
    }
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            rcon_binary: PathBuf::from("/srv/minecraft/scripts/rcon"),
            rcon_config: PathBuf::from("/srv/minecraft/scripts/rcon.yaml"),
            status_command: "list".to_string(),
            warning_message: "say Server shutting down in 10 seconds!".to_string(),
            save_command: "save-all".to_string(),
            stop_command: "stop".to_string(),
            gametime_command: "time query gametime".to_string(),
        }
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            grace_secs: 10,
            settle_secs: 5,
            poll_interval_secs: 2,
            max_attempts: 30,
            poll_timeout_secs: None,
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            unit: "minecraft-server.service".to_string(),
            systemctl_path: PathBuf::from("/usr/bin/systemctl"),
            use_sudo: true,
        }
    }
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            backups_dir: PathBuf::from("/srv/minecraft/backups"),
            tar_binary: PathBuf::from("tar"),
            include_gametime: false,
            restart_policy: RestartPolicy::Always,
            tiers: BackupTiers::default(),
        }
    }
}

impl Default for BackupTiers {
    fn default() -> Self {
        Self {
            daily: TierSettings { dir: "daily".to_string(), interval_hours: 24, retention_hours: 4 * 24 },
            weekly: TierSettings { dir: "weekly".to_string(), interval_hours: 7 * 24, retention_hours: 21 * 24 },
            monthly: TierSettings { dir: "monthly".to_string(), interval_hours: 30 * 24, retention_hours: 60 * 24 },
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
            log_dir: None,
        }
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            lock_file: PathBuf::from("/srv/minecraft/run/lifecycle.lock"),
        }
    }
}
