//! Idle session sweeper.
//!
//! Runs on an interval. Each pass walks every session slot, locking one at
//! a time, so a sweep never races a message handler for the same sender.
//! Failure on one session is logged and the pass moves on.

use crate::replies;
use chrono::{DateTime, Duration, Utc};
use parkline_conversation::{SessionPhase, SessionStore};
use parkline_transport::Transport;
use std::sync::Arc;

/// Idle-timeout thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    /// Idle time before the still-there prompt.
    pub pending_after: Duration,
    /// Further silence after the prompt before closing.
    pub close_after: Duration,
    /// Absolute session age after which state is reset outright.
    pub stale_after: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            pending_after: Duration::minutes(5),
            close_after: Duration::minutes(2),
            stale_after: Duration::hours(6),
        }
    }
}

/// Counters from one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Sessions that got the still-there prompt.
    pub prompted: usize,
    /// Sessions closed, with or without a notice.
    pub closed: usize,
    /// Stale sessions reset to identification.
    pub reset: usize,
    /// Empty slots reclaimed.
    pub pruned: usize,
}

/// Periodic reaper of idle conversations.
pub struct IdleSweeper {
    sessions: Arc<SessionStore>,
    transport: Arc<dyn Transport>,
    config: SweepConfig,
}

impl IdleSweeper {
    /// Creates a sweeper over the shared session store.
    #[must_use]
    pub fn new(
        sessions: Arc<SessionStore>,
        transport: Arc<dyn Transport>,
        config: SweepConfig,
    ) -> Self {
        Self {
            sessions,
            transport,
            config,
        }
    }

    /// Runs one sweep pass at `now`.
    ///
    /// State transitions happen before the corresponding notification is
    /// sent; a failed send is logged and never repeated for the same
    /// transition.
    pub async fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();

        for sender in self.sessions.senders() {
            let Some(slot) = self.sessions.peek(&sender) else {
                continue;
            };
            let mut guard = slot.lock().await;
            let Some(session) = guard.as_mut() else {
                continue;
            };

            if now - session.created_at >= self.config.stale_after {
                tracing::warn!(sender = %sender, "resetting stale session");
                session.force_reset(now);
                report.reset += 1;
                continue;
            }

            match session.phase {
                SessionPhase::AwaitingIdentification => {
                    // Nothing worth keeping; close silently once fully idle.
                    if session.idle_for(now) >= self.config.pending_after + self.config.close_after
                    {
                        *guard = None;
                        report.closed += 1;
                    }
                }
                SessionPhase::Active => {
                    if session.idle_for(now) >= self.config.pending_after {
                        let language = session.language;
                        session.mark_pending_close(now);
                        report.prompted += 1;
                        drop(guard);
                        if let Err(e) = self
                            .transport
                            .send_message(&sender, replies::still_there_prompt(language))
                            .await
                        {
                            tracing::warn!(sender = %sender, error = %e, "still-there prompt failed");
                        }
                    }
                }
                SessionPhase::PendingClose => {
                    let due = session
                        .pending_close_at
                        .is_some_and(|at| now - at >= self.config.close_after);
                    if due {
                        let language = session.language;
                        *guard = None;
                        report.closed += 1;
                        drop(guard);
                        if let Err(e) = self
                            .transport
                            .send_message(&sender, replies::closed_notice(language))
                            .await
                        {
                            tracing::warn!(sender = %sender, error = %e, "close notice failed");
                        }
                    }
                }
            }
        }

        report.pruned = self.sessions.prune();
        report
    }
}
