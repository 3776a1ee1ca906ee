use std::path::Path;

use anyhow::Result;

use crate::backup::tiers::newest_backup;
use crate::config::persistence::validate;
use crate::config::types::ServerConfig;
use crate::daemon::liveness::is_running;
use crate::daemon::systemd::{backup_unit_names, has_systemd};
use crate::daemon::SYSTEMD_UNIT_DIR;
use crate::server::tmux::tmux_available;
use crate::server::Backends;

fn banner() {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    println!("\x1b[32mmcserver-ctl v{} ({}) on {}\x1b[0m", env!("CARGO_PKG_VERSION"), std::env::consts::ARCH, host);
}

pub async fn show_status(config: &ServerConfig, backends: &Backends) -> Result<()> {
    banner();
    println!("================================");

    let session = &config.server.session_name;
    match backends.sessions.exists(session).await {
        Ok(true) => println!("Session:  '{}' present", session),
        Ok(false) => println!("Session:  '{}' absent", session),
        Err(e) => println!("Session:  unknown ({:#})", e),
    }

    if is_running(backends.console.as_ref(), &config.console.status_command).await {
        println!("Console:  answering");
    } else {
        println!("Console:  not answering");
    }

    match backends.service.is_active().await {
        Ok(true) => println!("Service:  {} active", backends.service.unit()),
        Ok(false) => println!("Service:  {} inactive", backends.service.unit()),
        Err(e) => println!("Service:  unknown ({:#})", e),
    }

    println!("\nBackups ({}):", config.backup.backups_dir.display());
    match newest_backup(&config.backup.backups_dir) {
        Some((backup, mtime)) => {
            println!("   Latest: {}", backup.path.display());
            println!("   Taken:  {}", mtime.format("%Y-%m-%d %H:%M:%S"));
        }
        None => println!("   No backups found"),
    }

    Ok(())
}

/// Verify the installation. Returns false when a hard requirement is missing.
pub fn run_health_check(config: &ServerConfig) -> bool {
    banner();
    println!("Health Check");
    println!("============\n");

    let mut all_ok = true;

    match validate(config) {
        Ok(()) => println!("✓ Config: valid"),
        Err(e) => {
            println!("✗ Config: {}", e);
            all_ok = false;
        }
    }

    let required: [(&str, &Path); 3] = [
        ("rcon binary", &config.console.rcon_binary),
        ("rcon config", &config.console.rcon_config),
        ("Server dir", &config.server.server_dir),
    ];
    for (label, path) in required {
        if path.exists() {
            println!("✓ {}: {}", label, path.display());
        } else {
            println!("✗ {}: NOT FOUND ({})", label, path.display());
            all_ok = false;
        }
    }

    if tmux_available() {
        println!("✓ tmux: available");
    } else {
        println!("✗ tmux: not installed or not runnable");
        all_ok = false;
    }

    if config.backup.backups_dir.exists() {
        println!("✓ Backups dir: {}", config.backup.backups_dir.display());
    } else {
        println!("⚠ Backups dir: Not created (will be created on first backup)");
    }

    #[cfg(target_os = "linux")]
    {
        if has_systemd() {
            let unit_dir = Path::new(SYSTEMD_UNIT_DIR);
            if unit_dir.join(&config.service.unit).exists() {
                println!("✓ Systemd service: {} installed", config.service.unit);
            } else {
                println!("⚠ Systemd service: {} not installed", config.service.unit);
                println!("  Run: sudo mcserver-ctl install-service");
            }
            let (_, timer) = backup_unit_names(&config.service.unit);
            if unit_dir.join(&timer).exists() {
                println!("✓ Backup timer: {} installed", timer);
            } else {
                println!("⚠ Backup timer: not installed (use install-service --backup-timer)");
            }
        } else {
            println!("- Systemd: Not available on this system");
        }
    }

    println!();
    if all_ok {
        println!("\x1b[32m✓ All checks passed!\x1b[0m");
    } else {
        println!("\x1b[33m⚠ Some issues found - see above\x1b[0m");
    }

    all_ok
}
