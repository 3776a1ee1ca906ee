//! Stop and start controllers for the tmux-hosted server.
//!
//! Per-step failure policy:
//! - identity mismatch, lock contention: abort before any side effect
//! - console requests during stop: logged, sequence continues
//! - session kill failure: logged
//! - session create lost to an existing session: abort with `SessionRace`
//! - session create failing otherwise: logged, poll still runs its full budget
//! - poll exhaustion, timeout, cancellation: propagated as errors

use std::future::Future;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::config::types::ServerConfig;
use crate::daemon::liveness::is_running;
use crate::daemon::lock::ControllerLock;
use crate::daemon::poll::{poll_until_live, PollOutcome, PollPolicy};
use crate::error::LifecycleError;
use crate::server::identity::require_owner;
use crate::server::{Backends, CreateOutcome};

pub struct Lifecycle {
    config: ServerConfig,
    backends: Backends,
}

impl Lifecycle {
    pub fn new(config: ServerConfig, backends: Backends) -> Self {
        Self { config, backends }
    }

    fn session(&self) -> &str {
        &self.config.server.session_name
    }

    fn acquire(&self) -> Result<ControllerLock> {
        require_owner(self.backends.identity.as_ref(), &self.config.server.owner_user)?;
        ControllerLock::acquire(&self.config.paths.lock_file)
    }

    /// Warn players, save, stop the server, then tear down the hosting session.
    pub async fn stop(&self) -> Result<()> {
        let _lock = self.acquire()?;
        self.stop_sequence().await;
        Ok(())
    }

    /// Replace any existing session with a fresh one and wait for the server
    /// to answer the status command. Returns the number of probes it took.
    pub async fn start<C>(&self, cancel: C) -> Result<u32>
    where
        C: Future<Output = ()>,
    {
        let _lock = self.acquire()?;
        let session = self.session();

        if self.session_exists().await {
            info!("Session '{}' already exists, stopping it first", session);
            self.stop_sequence().await;
        }

        info!("Starting {} in session '{}'", self.config.server.name, session);
        let created = self
            .backends
            .sessions
            .create(session, &self.config.server.server_dir, &self.config.server.launch_command)
            .await;

        match created {
            Ok(CreateOutcome::Created) => info!("Session '{}' created", session),
            Ok(CreateOutcome::AlreadyExists) => {
                error!("Session '{}' reappeared before it could be created", session);
                return Err(LifecycleError::SessionRace {
                    session: session.to_string(),
                }
                .into());
            }
            Ok(CreateOutcome::Failed(detail)) => {
                error!("Failed to create session '{}': {}", session, detail);
            }
            Err(e) => error!("Failed to create session '{}': {:#}", session, e),
        }

        tokio::time::sleep(self.config.timing.settle()).await;

        let policy = PollPolicy::from_timing(&self.config.timing);
        let console = self.backends.console.as_ref();
        let status_command = self.config.console.status_command.as_str();
        let outcome = poll_until_live(&policy, || is_running(console, status_command), cancel).await;

        match outcome {
            PollOutcome::Live { attempts } => {
                info!("Server is up after {} attempt(s)", attempts);
                Ok(attempts)
            }
            PollOutcome::Exhausted { attempts } => {
                error!("Server failed to start after {} attempts", attempts);
                Err(LifecycleError::PollExhausted { attempts }.into())
            }
            PollOutcome::TimedOut { attempts, elapsed } => {
                error!("Server failed to start within {:?}", elapsed);
                Err(LifecycleError::PollTimedOut { attempts, elapsed }.into())
            }
            PollOutcome::Cancelled { attempts } => {
                warn!("Startup poll cancelled after {} attempt(s)", attempts);
                Err(LifecycleError::PollCancelled { attempts }.into())
            }
        }
    }

    async fn stop_sequence(&self) {
        let console = &self.config.console;

        info!("Stopping {}", self.config.server.name);
        self.console_step("warning broadcast", &console.warning_message).await;
        self.console_step("save", &console.save_command).await;

        info!("Waiting {}s for the save to settle", self.config.timing.grace_secs);
        tokio::time::sleep(self.config.timing.grace()).await;

        self.console_step("stop", &console.stop_command).await;

        let session = self.session();
        if self.session_exists().await {
            match self.backends.sessions.kill(session).await {
                Ok(()) => info!("Session '{}' terminated", session),
                Err(e) => warn!("Failed to terminate session '{}': {:#}", session, e),
            }
        } else {
            info!("No session '{}' to terminate", session);
        }
    }

    async fn console_step(&self, label: &str, command: &str) {
        match self.backends.console.send(command).await {
            Ok(reply) if reply.success() => info!("Sent {}: {}", label, command),
            Ok(reply) => warn!("Console {} returned {:?}: {}", label, reply.code, reply.stderr.trim()),
            Err(e) => warn!("Console {} failed: {:#}", label, e),
        }
    }

    async fn session_exists(&self) -> bool {
        match self.backends.sessions.exists(self.session()).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!("Could not query session '{}': {:#}", self.session(), e);
                false
            }
        }
    }
}
