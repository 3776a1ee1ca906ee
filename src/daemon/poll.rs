//! Bounded liveness polling.
//!
//! Probes run back to back with `interval` between failed attempts, so a probe
//! that never succeeds is called exactly `max_attempts` times and the loop
//! takes `(max_attempts - 1) * interval` plus probe time. An optional overall
//! deadline and a caller-supplied cancel future can cut the loop short.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

use crate::config::types::TimingSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub timeout: Option<Duration>,
}

impl PollPolicy {
    pub fn from_timing(timing: &TimingSettings) -> Self {
        Self {
            interval: timing.poll_interval(),
            max_attempts: timing.max_attempts,
            timeout: timing.poll_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Live { attempts: u32 },
    Exhausted { attempts: u32 },
    TimedOut { attempts: u32, elapsed: Duration },
    Cancelled { attempts: u32 },
}

enum Finish {
    Live,
    Exhausted,
    TimedOut,
    Cancelled,
}

pub async fn poll_until_live<P, Fut, C>(policy: &PollPolicy, mut probe: P, cancel: C) -> PollOutcome
where
    P: FnMut() -> Fut,
    Fut: Future<Output = bool>,
    C: Future<Output = ()>,
{
    let started = Instant::now();
    let mut attempts = 0u32;

    let finish = {
        let run = async {
            loop {
                attempts += 1;
                info!("Waiting for server... (attempt {}/{})", attempts, policy.max_attempts);
                if probe().await {
                    return true;
                }
                if attempts >= policy.max_attempts {
                    return false;
                }
                tokio::time::sleep(policy.interval).await;
            }
        };
        let deadline = async {
            match policy.timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(run, deadline, cancel);

        tokio::select! {
            biased;
            live = &mut run => if live { Finish::Live } else { Finish::Exhausted },
            _ = &mut cancel => Finish::Cancelled,
            _ = &mut deadline => Finish::TimedOut,
        }
    };

    match finish {
        Finish::Live => PollOutcome::Live { attempts },
        Finish::Exhausted => PollOutcome::Exhausted { attempts },
        Finish::TimedOut => PollOutcome::TimedOut {
            attempts,
            elapsed: started.elapsed(),
        },
        Finish::Cancelled => PollOutcome::Cancelled { attempts },
    }
}
