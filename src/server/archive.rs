//! tar-based archiver and backup artifact naming.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone};
use std::path::{Path, PathBuf};

use crate::server::Archiver;
use crate::system::executor::run_checked;

pub struct TarArchiver {
    binary: PathBuf,
}

impl TarArchiver {
    pub fn new(binary: &Path) -> Self {
        Self {
            binary: binary.to_path_buf(),
        }
    }

    /// `tar -czhf <dest> <source>`: gzip, follow symlinks (the server dir is usually one).
    pub fn build_command(&self, source: &Path, dest: &Path) -> std::process::Command {
        let mut cmd = std::process::Command::new(&self.binary);
        cmd.arg("-czhf").arg(dest).arg(source);
        cmd
    }
}

#[async_trait]
impl Archiver for TarArchiver {
    async fn archive(&self, source: &Path, dest: &Path) -> Result<()> {
        run_checked(self.build_command(source, dest)).await?;
        Ok(())
    }
}

/// `backup-YYYYMMDD-HHMMSS.tar.gz`, or `backup-YYYYMMDD-HHMMSS-g<gametime>.tar.gz`.
pub fn backup_file_name<Tz>(now: &DateTime<Tz>, gametime: Option<&str>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let stamp = now.format("%Y%m%d-%H%M%S");
    match gametime {
        Some(g) => format!("backup-{}-g{}.tar.gz", stamp, g),
        None => format!("backup-{}.tar.gz", stamp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn noon() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn name_without_gametime() {
        assert_eq!(backup_file_name(&noon(), None), "backup-20230101-120000.tar.gz");
    }

    #[test]
    fn name_with_gametime() {
        assert_eq!(backup_file_name(&noon(), Some("12345")), "backup-20230101-120000-g12345.tar.gz");
    }

    #[test]
    fn tar_arguments() {
        let archiver = TarArchiver::new(Path::new("tar"));
        let cmd = archiver.build_command(Path::new("/srv/minecraft/current"), Path::new("/b/x.tar.gz"));
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().to_string()).collect();
        assert_eq!(args, vec!["-czhf", "/b/x.tar.gz", "/srv/minecraft/current"]);
    }

    #[tokio::test]
    async fn archives_a_real_directory() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("world");
        std::fs::create_dir(&source).unwrap();
        std::fs::write(source.join("level.dat"), b"data").unwrap();
        let dest = dir.path().join("out.tar.gz");

        TarArchiver::new(Path::new("tar")).archive(&source, &dest).await.unwrap();
        assert!(std::fs::metadata(&dest).unwrap().len() > 0);
    }

    #[tokio::test]
    async fn missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = TarArchiver::new(Path::new("tar"))
            .archive(&dir.path().join("absent"), &dir.path().join("out.tar.gz"))
            .await;
        assert!(result.is_err());
    }
}
