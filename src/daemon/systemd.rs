use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{anyhow, Context, Result};

use crate::config::types::ServerConfig;
use crate::daemon::{BACKUP_SERVICE_TEMPLATE, BACKUP_TIMER_TEMPLATE, SYSTEMD_SERVICE_TEMPLATE, SYSTEMD_UNIT_DIR};
use crate::server::identity::is_root;

/// Check if systemd is available on this system
pub fn has_systemd() -> bool {
    Path::new("/run/systemd/system").exists()
}

/// `minecraft-server.service` -> (`minecraft-server-backup.service`, `minecraft-server-backup.timer`)
pub fn backup_unit_names(unit: &str) -> (String, String) {
    let base = unit.strip_suffix(".service").unwrap_or(unit);
    (format!("{}-backup.service", base), format!("{}-backup.timer", base))
}

fn fill(template: &str, config: &ServerConfig, exe_path: &Path, config_path: &Path) -> String {
    let timing = &config.timing;
    // Worst case: stop a stale session, settle, then the whole poll budget
    let start_timeout = timing.poll_timeout_secs.unwrap_or(
        timing.poll_interval_secs * u64::from(timing.max_attempts.saturating_sub(1)),
    ) + timing.grace_secs
        + timing.settle_secs
        + 30;

    template
        .replace("{{NAME}}", &config.server.name)
        .replace("{{SESSION}}", &config.server.session_name)
        .replace("{{USER}}", &config.server.owner_user)
        .replace("{{WORK_DIR}}", &config.server.server_dir.to_string_lossy())
        .replace("{{EXEC_PATH}}", &exe_path.to_string_lossy())
        .replace("{{CONFIG}}", &config_path.to_string_lossy())
        .replace("{{UNIT}}", &config.service.unit)
        .replace("{{START_TIMEOUT}}", &start_timeout.to_string())
}

/// Unit files to install: the server service, plus the backup service and
/// timer when requested.
pub fn render_units(
    config: &ServerConfig,
    exe_path: &Path,
    config_path: &Path,
    unit_dir: &Path,
    with_backup_timer: bool,
) -> Vec<(PathBuf, String)> {
    let mut units = vec![(
        unit_dir.join(&config.service.unit),
        fill(SYSTEMD_SERVICE_TEMPLATE, config, exe_path, config_path),
    )];

    if with_backup_timer {
        let (service, timer) = backup_unit_names(&config.service.unit);
        units.push((unit_dir.join(service), fill(BACKUP_SERVICE_TEMPLATE, config, exe_path, config_path)));
        units.push((unit_dir.join(timer), fill(BACKUP_TIMER_TEMPLATE, config, exe_path, config_path)));
    }

    units
}

/// Write `content` unless the file already holds exactly that. Returns whether it wrote.
pub fn write_if_changed(path: &Path, content: &str) -> Result<bool> {
    if let Ok(existing) = fs::read_to_string(path) {
        if existing == content {
            return Ok(false);
        }
    }
    fs::write(path, content).with_context(|| format!("Failed to write unit file {:?}", path))?;
    Ok(true)
}

fn systemctl(args: &[&str]) -> bool {
    process::Command::new("systemctl")
        .args(args)
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Install or repair the server unit (and optionally the backup timer). Idempotent.
pub fn install_systemd_service(config: &ServerConfig, config_path: &Path, with_backup_timer: bool) -> Result<()> {
    if !is_root() {
        return Err(anyhow!("Root privileges required. Run with: sudo mcserver-ctl install-service"));
    }

    if !has_systemd() {
        println!("❌ systemd not detected on this system.");
        println!("   Use `mcserver-ctl start` / `mcserver-ctl stop` directly instead.");
        return Ok(());
    }

    let exe_path = std::env::current_exe()?;
    let units = render_units(config, &exe_path, config_path, Path::new(SYSTEMD_UNIT_DIR), with_backup_timer);

    let mut changed = false;
    for (path, content) in &units {
        if write_if_changed(path, content)? {
            println!("✓ Unit file written: {}", path.display());
            changed = true;
        } else {
            println!("✓ Unit file up-to-date: {}", path.display());
        }
    }

    if changed {
        if systemctl(&["daemon-reload"]) {
            println!("✓ Systemd daemon reloaded");
        } else {
            println!("⚠ Failed to reload systemd daemon (run: systemctl daemon-reload)");
        }
    }

    if systemctl(&["enable", &config.service.unit]) {
        println!("✓ {} enabled (will start on boot)", config.service.unit);
    } else {
        println!("⚠ Failed to enable service (run: systemctl enable {})", config.service.unit);
    }

    if with_backup_timer {
        let (_, timer) = backup_unit_names(&config.service.unit);
        if systemctl(&["enable", "--now", &timer]) {
            println!("✓ {} enabled", timer);
        } else {
            println!("⚠ Failed to enable timer (run: systemctl enable --now {})", timer);
        }
    }

    println!();
    println!("Start now with: sudo systemctl start {}", config.service.unit);
    Ok(())
}

/// Stop, disable and remove the server unit and any backup timer.
pub fn uninstall_systemd_service(config: &ServerConfig) -> Result<()> {
    if !is_root() {
        return Err(anyhow!("Root privileges required. Run with: sudo mcserver-ctl uninstall-service"));
    }

    if !has_systemd() {
        println!("❌ systemd not detected on this system.");
        return Ok(());
    }

    let (backup_service, backup_timer) = backup_unit_names(&config.service.unit);
    let unit_dir = Path::new(SYSTEMD_UNIT_DIR);
    let mut removed_any = false;

    for unit in [backup_timer.as_str(), backup_service.as_str(), config.service.unit.as_str()] {
        let path = unit_dir.join(unit);
        if !path.exists() {
            continue;
        }
        systemctl(&["stop", unit]);
        systemctl(&["disable", unit]);
        fs::remove_file(&path)?;
        println!("✓ Removed {}", path.display());
        removed_any = true;
    }

    if removed_any {
        systemctl(&["daemon-reload"]);
        println!("✓ Systemd daemon reloaded");
    } else {
        println!("✓ Service is not installed");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_units_derive_from_service_name() {
        assert_eq!(
            backup_unit_names("minecraft-server.service"),
            ("minecraft-server-backup.service".to_string(), "minecraft-server-backup.timer".to_string())
        );
        assert_eq!(backup_unit_names("mc").0, "mc-backup.service");
    }

    #[test]
    fn service_unit_runs_start_and_stop_as_owner() {
        let config = ServerConfig::default();
        let units = render_units(
            &config,
            Path::new("/opt/mc/mcserver-ctl"),
            Path::new("/opt/mc/config.json"),
            Path::new("/tmp/units"),
            false,
        );

        assert_eq!(units.len(), 1);
        let (path, content) = &units[0];
        assert_eq!(path, &PathBuf::from("/tmp/units/minecraft-server.service"));
        assert!(content.contains("Type=forking\n"));
        assert!(content.contains("User=minecraft\n"));
        assert!(content.contains("ExecStart=/opt/mc/mcserver-ctl --config /opt/mc/config.json start\n"));
        assert!(content.contains("ExecStop=/opt/mc/mcserver-ctl --config /opt/mc/config.json stop\n"));
        assert!(content.contains("WorkingDirectory=/srv/minecraft/current\n"));
        // 29 * 2 + 10 + 5 + 30
        assert!(content.contains("TimeoutStartSec=103\n"));
        assert!(!content.contains("{{"));
    }

    #[test]
    fn backup_timer_units_are_optional() {
        let config = ServerConfig::default();
        let units = render_units(&config, Path::new("/x"), Path::new("/c.json"), Path::new("/u"), true);

        assert_eq!(units.len(), 3);
        assert!(units[1].1.contains("ExecStart=/x --config /c.json manage-backups"));
        assert!(units[1].1.contains("After=minecraft-server.service"));
        assert!(units[2].1.contains("OnCalendar=daily"));
    }

    #[test]
    fn unchanged_unit_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.service");

        assert!(write_if_changed(&path, "one").unwrap());
        assert!(!write_if_changed(&path, "one").unwrap());
        assert!(write_if_changed(&path, "two").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "two");
    }
}
