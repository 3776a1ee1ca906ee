//! Daily / weekly / monthly backup rotation.
//!
//! Meant for a daily timer, but safe to run by hand: a tier only gets a new
//! archive once its newest one is older than the tier interval (less 30
//! minutes of slack for timer jitter), and old archives are pruned per tier.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local};
use tracing::{error, info, warn};

use crate::backup::controller::BackupController;
use crate::config::types::{BackupSettings, TierSettings};

/// Slack allowed because the timer fires slightly before a full interval has passed.
const SCHEDULE_SLACK_MINUTES: i64 = 30;

/// An archive that exists on the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    pub path: PathBuf,
}

impl BackupFile {
    /// Last-modified time. Renames keep mtime, and archives are never edited,
    /// so it stands in for creation time.
    pub fn mtime(&self) -> Result<DateTime<Local>> {
        let modified = std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .with_context(|| format!("Failed to stat {:?}", self.path))?;
        Ok(DateTime::<Local>::from(modified))
    }

    pub fn is_older_than(&self, when: DateTime<Local>) -> Result<bool> {
        Ok(self.mtime()? < when)
    }

    /// Age check against `now - |delta|`; the sign of `delta` is ignored.
    pub fn is_older_than_delta(&self, delta: Duration, now: DateTime<Local>) -> Result<bool> {
        self.is_older_than(now - delta.abs())
    }
}

/// All `*.tar.gz` files under `root`, recursively.
pub fn find_backups(root: &Path) -> Vec<BackupFile> {
    let pattern = format!("{}/**/*.tar.gz", glob::Pattern::escape(&root.to_string_lossy()));
    match glob::glob(&pattern) {
        Ok(paths) => paths
            .filter_map(|p| p.ok())
            .filter(|p| p.is_file())
            .map(|path| BackupFile { path })
            .collect(),
        Err(e) => {
            warn!("Invalid backup search pattern {}: {}", pattern, e);
            Vec::new()
        }
    }
}

/// Most recently modified archive under `root`.
pub fn newest_backup(root: &Path) -> Option<(BackupFile, DateTime<Local>)> {
    find_backups(root)
        .into_iter()
        .filter_map(|b| b.mtime().ok().map(|t| (b, t)))
        .max_by_key(|(_, t)| *t)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Daily,
    Weekly,
    Monthly,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Daily, Tier::Weekly, Tier::Monthly];

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Daily => "daily",
            Tier::Weekly => "weekly",
            Tier::Monthly => "monthly",
        }
    }

    pub fn settings<'a>(&self, settings: &'a BackupSettings) -> &'a TierSettings {
        match self {
            Tier::Daily => &settings.tiers.daily,
            Tier::Weekly => &settings.tiers.weekly,
            Tier::Monthly => &settings.tiers.monthly,
        }
    }
}

pub fn tier_dir(settings: &BackupSettings, tier: Tier) -> PathBuf {
    settings.backups_dir.join(&tier.settings(settings).dir)
}

/// True when every archive in `dir` is older than `interval` less the slack.
/// Unreadable archives are ignored; an empty tier always needs a backup.
pub fn needs_backup(dir: &Path, interval: Duration, now: DateTime<Local>) -> bool {
    let max_age = interval - Duration::minutes(SCHEDULE_SLACK_MINUTES);
    find_backups(dir).iter().all(|backup| match backup.is_older_than_delta(max_age, now) {
        Ok(older) => older,
        Err(e) => {
            warn!("{:#}", e);
            true
        }
    })
}

/// Delete archives in `dir` older than `retention`. Returns the deleted paths.
pub fn prune(dir: &Path, retention: Duration, now: DateTime<Local>) -> Vec<PathBuf> {
    let mut deleted = Vec::new();
    for backup in find_backups(dir) {
        let mtime = match backup.mtime() {
            Ok(t) => t,
            Err(e) => {
                warn!("{:#}", e);
                continue;
            }
        };
        if mtime >= now - retention.abs() {
            continue;
        }
        info!(
            "Deleting old backup {} (mtime {} is older than {}h)",
            backup.path.display(),
            mtime.format("%Y-%m-%d %H:%M:%S"),
            retention.num_hours()
        );
        match std::fs::remove_file(&backup.path) {
            Ok(()) => deleted.push(backup.path),
            Err(e) => warn!("Failed to delete {}: {}", backup.path.display(), e),
        }
    }
    deleted
}

#[derive(Debug, Clone, Default)]
pub struct ManageReport {
    pub created: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
    pub failed_tiers: Vec<&'static str>,
}

impl ManageReport {
    pub fn success(&self) -> bool {
        self.failed_tiers.is_empty()
    }
}

/// Create whichever tier backups are due, then prune every tier.
pub async fn manage_backups(controller: &BackupController) -> ManageReport {
    let settings = controller.config().backup.clone();
    let mut report = ManageReport::default();

    for tier in Tier::ALL {
        let dir = tier_dir(&settings, tier);
        let interval = Duration::hours(tier.settings(&settings).interval_hours as i64);

        if !needs_backup(&dir, interval, Local::now()) {
            info!("No {} backup needed.", tier.label());
            continue;
        }

        info!("Creating {} backup in {}", tier.label(), dir.display());
        match controller.backup_into(&dir).await {
            Ok(backup) => match backup.archive {
                Some(path) => report.created.push(path),
                None => report.failed_tiers.push(tier.label()),
            },
            Err(e) => {
                error!("{} backup failed: {:#}", tier.label(), e);
                report.failed_tiers.push(tier.label());
            }
        }
    }

    for tier in Tier::ALL {
        let retention = Duration::hours(tier.settings(&settings).retention_hours as i64);
        report
            .deleted
            .extend(prune(&tier_dir(&settings, tier), retention, Local::now()));
    }

    report
}
