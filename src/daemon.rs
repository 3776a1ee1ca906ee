//! Server lifecycle: liveness, startup polling, stop/start control, status,
//! and the systemd units that wrap them.

pub mod control;
pub mod liveness;
pub mod lock;
pub mod poll;
pub mod status;
pub mod systemd;

pub const SYSTEMD_UNIT_DIR: &str = "/etc/systemd/system";

pub const SYSTEMD_SERVICE_TEMPLATE: &str = r#"[Unit]
Description={{NAME}} server (tmux session {{SESSION}})
After=network.target

[Service]
Type=forking
User={{USER}}
WorkingDirectory={{WORK_DIR}}
ExecStart={{EXEC_PATH}} --config {{CONFIG}} start
ExecStop={{EXEC_PATH}} --config {{CONFIG}} stop
TimeoutStartSec={{START_TIMEOUT}}
StandardOutput=journal
StandardError=journal

[Install]
WantedBy=multi-user.target
"#;

pub const BACKUP_SERVICE_TEMPLATE: &str = r#"[Unit]
Description={{NAME}} tiered backups
After={{UNIT}}

[Service]
Type=oneshot
ExecStart={{EXEC_PATH}} --config {{CONFIG}} manage-backups
"#;

pub const BACKUP_TIMER_TEMPLATE: &str = r#"[Unit]
Description=Daily {{NAME}} backups

[Timer]
OnCalendar=daily
Persistent=true

[Install]
WantedBy=timers.target
"#;
