//! Managed service control through systemctl.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use crate::config::types::ServiceSettings;
use crate::server::ServiceManager;
use crate::system::executor::{run_captured, run_checked};

pub struct SystemdService {
    unit: String,
    systemctl: PathBuf,
    use_sudo: bool,
}

impl SystemdService {
    pub fn new(settings: &ServiceSettings) -> Self {
        Self {
            unit: settings.unit.clone(),
            systemctl: settings.systemctl_path.clone(),
            use_sudo: settings.use_sudo,
        }
    }

    /// `[sudo] <systemctl> <action> <unit>`; state-changing actions need privilege.
    pub fn build_command(&self, action: &str) -> std::process::Command {
        let mut cmd = if self.use_sudo {
            let mut c = std::process::Command::new("sudo");
            c.arg(&self.systemctl);
            c
        } else {
            std::process::Command::new(&self.systemctl)
        };
        cmd.args([action, self.unit.as_str()]);
        cmd
    }
}

#[async_trait]
impl ServiceManager for SystemdService {
    fn unit(&self) -> &str {
        &self.unit
    }

    async fn stop(&self) -> Result<()> {
        info!("Stopping {}", self.unit);
        run_checked(self.build_command("stop")).await?;
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        info!("Starting {}", self.unit);
        run_checked(self.build_command("start")).await?;
        Ok(())
    }

    async fn is_active(&self) -> Result<bool> {
        // Read-only query; no sudo needed
        let mut cmd = std::process::Command::new(&self.systemctl);
        cmd.args(["is-active", "--quiet", self.unit.as_str()]);
        Ok(run_captured(cmd).await?.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(cmd: &std::process::Command) -> Vec<String> {
        std::iter::once(cmd.get_program())
            .chain(cmd.get_args())
            .map(|a| a.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn sudo_wraps_systemctl() {
        let service = SystemdService::new(&ServiceSettings::default());
        assert_eq!(
            args(&service.build_command("stop")),
            vec!["sudo", "/usr/bin/systemctl", "stop", "minecraft-server.service"]
        );
    }

    #[test]
    fn direct_systemctl_without_sudo() {
        let settings = ServiceSettings {
            use_sudo: false,
            ..ServiceSettings::default()
        };
        let service = SystemdService::new(&settings);
        assert_eq!(
            args(&service.build_command("start")),
            vec!["/usr/bin/systemctl", "start", "minecraft-server.service"]
        );
    }
}
