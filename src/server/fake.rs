//! In-memory backends for controller tests. All fakes append to one shared
//! journal so tests can assert on cross-backend ordering.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::server::{Archiver, Backends, Console, CreateOutcome, Identity, ServiceManager, SessionHost};
use crate::system::executor::CommandOutput;

pub type Journal = Arc<Mutex<Vec<String>>>;

fn record(journal: &Journal, entry: impl Into<String>) {
    journal.lock().unwrap().push(entry.into());
}

pub struct FakeConsole {
    journal: Journal,
    status_command: String,
    /// Results for successive status probes; exhausted queue answers `down`
    probes: Mutex<VecDeque<bool>>,
    pub fail_all: Mutex<bool>,
    pub reply_text: Mutex<String>,
}

#[async_trait]
impl Console for FakeConsole {
    async fn send(&self, command: &str) -> Result<CommandOutput> {
        record(&self.journal, format!("console:{}", command));
        if *self.fail_all.lock().unwrap() {
            return Err(anyhow!("rcon unreachable"));
        }
        let up = if command == self.status_command {
            self.probes.lock().unwrap().pop_front().unwrap_or(false)
        } else {
            true
        };
        Ok(CommandOutput {
            code: Some(if up { 0 } else { 1 }),
            stdout: self.reply_text.lock().unwrap().clone(),
            stderr: String::new(),
        })
    }
}

pub struct FakeSessions {
    journal: Journal,
    pub live: Mutex<HashSet<String>>,
    pub create_result: Mutex<Option<CreateOutcome>>,
}

#[async_trait]
impl SessionHost for FakeSessions {
    async fn exists(&self, name: &str) -> Result<bool> {
        record(&self.journal, format!("session:exists:{}", name));
        Ok(self.live.lock().unwrap().contains(name))
    }

    async fn create(&self, name: &str, _workdir: &Path, command: &str) -> Result<CreateOutcome> {
        record(&self.journal, format!("session:create:{}:{}", name, command));
        if let Some(forced) = self.create_result.lock().unwrap().clone() {
            return Ok(forced);
        }
        let mut live = self.live.lock().unwrap();
        if live.contains(name) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        live.insert(name.to_string());
        Ok(CreateOutcome::Created)
    }

    async fn kill(&self, name: &str) -> Result<()> {
        record(&self.journal, format!("session:kill:{}", name));
        self.live.lock().unwrap().remove(name);
        Ok(())
    }
}

pub struct FakeService {
    journal: Journal,
    pub active: Mutex<bool>,
    pub fail_stop: Mutex<bool>,
    pub fail_start: Mutex<bool>,
}

#[async_trait]
impl ServiceManager for FakeService {
    fn unit(&self) -> &str {
        "minecraft-server.service"
    }

    async fn stop(&self) -> Result<()> {
        record(&self.journal, "service:stop");
        if *self.fail_stop.lock().unwrap() {
            return Err(anyhow!("systemctl stop failed"));
        }
        *self.active.lock().unwrap() = false;
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        record(&self.journal, "service:start");
        if *self.fail_start.lock().unwrap() {
            return Err(anyhow!("systemctl start failed"));
        }
        *self.active.lock().unwrap() = true;
        Ok(())
    }

    async fn is_active(&self) -> Result<bool> {
        Ok(*self.active.lock().unwrap())
    }
}

pub struct FakeArchiver {
    journal: Journal,
    pub fail: Mutex<bool>,
}

#[async_trait]
impl Archiver for FakeArchiver {
    async fn archive(&self, source: &Path, dest: &Path) -> Result<()> {
        record(&self.journal, format!("archive:{}", source.display()));
        if *self.fail.lock().unwrap() {
            return Err(anyhow!("tar exited 2"));
        }
        std::fs::write(dest, b"archive")?;
        Ok(())
    }
}

pub struct FakeIdentity(pub Mutex<String>);

impl Identity for FakeIdentity {
    fn current_user(&self) -> Result<String> {
        Ok(self.0.lock().unwrap().clone())
    }
}

/// Handles to every fake plus the `Backends` that wraps them.
pub struct FakeWorld {
    pub journal: Journal,
    pub console: Arc<FakeConsole>,
    pub sessions: Arc<FakeSessions>,
    pub service: Arc<FakeService>,
    pub archiver: Arc<FakeArchiver>,
    pub identity: Arc<FakeIdentity>,
}

impl FakeWorld {
    pub fn new(status_command: &str, owner: &str) -> Self {
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        Self {
            console: Arc::new(FakeConsole {
                journal: journal.clone(),
                status_command: status_command.to_string(),
                probes: Mutex::new(VecDeque::new()),
                fail_all: Mutex::new(false),
                reply_text: Mutex::new(String::new()),
            }),
            sessions: Arc::new(FakeSessions {
                journal: journal.clone(),
                live: Mutex::new(HashSet::new()),
                create_result: Mutex::new(None),
            }),
            service: Arc::new(FakeService {
                journal: journal.clone(),
                active: Mutex::new(true),
                fail_stop: Mutex::new(false),
                fail_start: Mutex::new(false),
            }),
            archiver: Arc::new(FakeArchiver {
                journal: journal.clone(),
                fail: Mutex::new(false),
            }),
            identity: Arc::new(FakeIdentity(Mutex::new(owner.to_string()))),
            journal,
        }
    }

    pub fn backends(&self) -> Backends {
        Backends {
            console: self.console.clone(),
            sessions: self.sessions.clone(),
            service: self.service.clone(),
            archiver: self.archiver.clone(),
            identity: self.identity.clone(),
        }
    }

    /// Queue status-probe answers, oldest first.
    pub fn script_probes(&self, answers: &[bool]) {
        self.console.probes.lock().unwrap().extend(answers.iter().copied());
    }

    pub fn entries(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.entries().iter().position(|e| e.starts_with(prefix))
    }
}
