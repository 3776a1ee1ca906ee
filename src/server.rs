//! Traits for the external collaborators the controllers drive, plus the
//! concrete implementations that shell out to the real tools.

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub mod archive;
pub mod identity;
pub mod rcon;
pub mod service;
pub mod tmux;

#[cfg(test)]
pub mod fake;

pub use archive::TarArchiver;
pub use identity::SystemIdentity;
pub use rcon::RconConsole;
pub use service::SystemdService;
pub use tmux::TmuxSessions;

use crate::config::types::ServerConfig;
use crate::system::executor::CommandOutput;

#[async_trait]
pub trait Console: Send + Sync {
    /// Send one command line to the server console and return the client's result
    async fn send(&self, command: &str) -> Result<CommandOutput>;
}

/// Result of an atomic create-or-fail session request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// A session with this name already existed; nothing was started
    AlreadyExists,
    /// The multiplexer refused for another reason
    Failed(String),
}

#[async_trait]
pub trait SessionHost: Send + Sync {
    async fn exists(&self, name: &str) -> Result<bool>;

    async fn create(&self, name: &str, workdir: &Path, command: &str) -> Result<CreateOutcome>;

    async fn kill(&self, name: &str) -> Result<()>;
}

#[async_trait]
pub trait ServiceManager: Send + Sync {
    fn unit(&self) -> &str;

    async fn stop(&self) -> Result<()>;

    async fn start(&self) -> Result<()>;

    async fn is_active(&self) -> Result<bool>;
}

#[async_trait]
pub trait Archiver: Send + Sync {
    /// Write a compressed archive of `source` to `dest`
    async fn archive(&self, source: &Path, dest: &Path) -> Result<()>;
}

pub trait Identity: Send + Sync {
    /// Name of the effective user running this process
    fn current_user(&self) -> Result<String>;
}

/// The set of collaborators one controller invocation works against.
#[derive(Clone)]
pub struct Backends {
    pub console: Arc<dyn Console>,
    pub sessions: Arc<dyn SessionHost>,
    pub service: Arc<dyn ServiceManager>,
    pub archiver: Arc<dyn Archiver>,
    pub identity: Arc<dyn Identity>,
}

impl Backends {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            console: Arc::new(RconConsole::new(&config.console)),
            sessions: Arc::new(TmuxSessions::new()),
            service: Arc::new(SystemdService::new(&config.service)),
            archiver: Arc::new(TarArchiver::new(&config.backup.tar_binary)),
            identity: Arc::new(SystemIdentity),
        }
    }
}
