use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::{sync::watch, task::JoinHandle, time::timeout};

use crate::{
    config::MonitorConfig,
    domain::{Snapshot, Target},
    infrastructure::shutdown::{Shutdown, StopCause},
    tasks::{
        monitor::{CycleObserver, CycleSummary, Monitor, MonitorDeps},
        store::StateStore,
    },
};

const STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Stopped,
    Failed,
}

#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub state: SessionState,
    pub last_error: Option<String>,
    pub cycles_completed: u64,
    pub reports_written: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub tracked_targets: usize,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a monitoring session is already running; stop it first")]
    AlreadyRunning,
}

#[derive(Debug)]
struct Progress {
    state: SessionState,
    last_error: Option<String>,
    cycles_completed: u64,
    reports_written: u64,
    last_cycle_at: Option<DateTime<Utc>>,
}

impl Progress {
    fn idle() -> Self {
        Self {
            state: SessionState::Idle,
            last_error: None,
            cycles_completed: 0,
            reports_written: 0,
            last_cycle_at: None,
        }
    }

    fn record_cycle(&mut self, summary: &CycleSummary) {
        self.cycles_completed += 1;
        self.reports_written += summary.reports_written() as u64;
        self.last_cycle_at = Some(summary.finished_at);
    }

    fn fail(&mut self, message: String) {
        self.state = SessionState::Failed;
        self.last_error = Some(message);
    }
}

struct RunningTask {
    shutdown: Shutdown,
    handle: JoinHandle<()>,
    done: watch::Receiver<bool>,
}

/// Caller-owned handle over at most one background monitoring task.
pub struct MonitorSession {
    store: StateStore,
    progress: Arc<Mutex<Progress>>,
    running: Option<RunningTask>,
}

impl Default for MonitorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorSession {
    pub fn new() -> Self {
        Self {
            store: StateStore::new(),
            progress: Arc::new(Mutex::new(Progress::idle())),
            running: None,
        }
    }

    /// Launches the monitoring task and returns without waiting for it.
    /// Each start begins with empty state; targets establish a new baseline.
    pub fn start(&mut self, config: MonitorConfig, deps: MonitorDeps) -> Result<(), SessionError> {
        if let Some(task) = &self.running {
            if !task.handle.is_finished() {
                return Err(SessionError::AlreadyRunning);
            }
        }
        self.running = None;

        self.store = StateStore::new();
        *self.progress.lock() = Progress {
            state: SessionState::Running,
            ..Progress::idle()
        };

        let (shutdown, mut listener) = Shutdown::new();
        let (done_tx, done) = watch::channel(false);
        let monitor = Monitor::new(config, deps, self.store.clone());
        let progress = self.progress.clone();
        let observer: CycleObserver = {
            let progress = progress.clone();
            Arc::new(move |summary: &CycleSummary| progress.lock().record_cycle(summary))
        };

        let handle = tokio::spawn(async move {
            let result = monitor.run(&mut listener, observer).await;
            {
                let mut progress = progress.lock();
                match result {
                    Ok(()) => progress.state = SessionState::Stopped,
                    Err(err) => {
                        tracing::error!(target: "session", error = %err, "monitoring session failed");
                        progress.fail(err.to_string());
                    }
                }
            }
            let _ = done_tx.send(true);
        });

        tracing::info!(target: "session", "monitoring session started");
        self.running = Some(RunningTask {
            shutdown,
            handle,
            done,
        });
        Ok(())
    }

    /// Signals the task to stop and waits for it to wind down.
    pub async fn stop(&mut self) -> SessionStatus {
        let Some(task) = self.running.take() else {
            return self.status();
        };
        task.shutdown.trigger(StopCause::Requested);

        let mut handle = task.handle;
        match timeout(STOP_TIMEOUT, &mut handle).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                if err.is_panic() {
                    self.progress.lock().fail("monitoring task panicked".to_string());
                }
            }
            Err(_) => {
                tracing::warn!(
                    target: "session",
                    "monitoring task did not stop within {:?}; aborting",
                    STOP_TIMEOUT
                );
                handle.abort();
                let mut progress = self.progress.lock();
                if progress.state == SessionState::Running {
                    progress.state = SessionState::Stopped;
                }
            }
        }
        tracing::info!(target: "session", "monitoring session stopped");
        self.status()
    }

    /// Resolves once the background task has ended, by stop or by failure.
    pub async fn finished(&self) {
        let Some(task) = &self.running else {
            return;
        };
        let mut done = task.done.clone();
        let _ = done.wait_for(|finished| *finished).await;
    }

    pub fn status(&self) -> SessionStatus {
        let progress = self.progress.lock();
        let mut state = progress.state;
        let mut last_error = progress.last_error.clone();
        if state == SessionState::Running
            && self
                .running
                .as_ref()
                .is_some_and(|task| task.handle.is_finished())
        {
            state = SessionState::Failed;
            last_error.get_or_insert_with(|| "monitoring task ended unexpectedly".to_string());
        }
        SessionStatus {
            state,
            last_error,
            cycles_completed: progress.cycles_completed,
            reports_written: progress.reports_written,
            last_cycle_at: progress.last_cycle_at,
            tracked_targets: self.store.len(),
        }
    }

    pub fn clear_error(&self) {
        let mut progress = self.progress.lock();
        progress.last_error = None;
        if progress.state == SessionState::Failed {
            progress.state = SessionState::Stopped;
        }
    }

    pub fn snapshots(&self) -> Vec<(Target, Snapshot)> {
        self.store.entries()
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::tasks::monitor::tests::{config, deps, FakeClassifier, FakeSource, Verdict};

    async fn wait_for_cycles(session: &MonitorSession, cycles: u64) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while session.status().cycles_completed < cycles {
            assert!(Instant::now() < deadline, "session never completed {cycles} cycles");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn start_returns_immediately_and_stop_winds_down() {
        let target = Target::new("https://example.com");
        let source = Arc::new(FakeSource::default());
        source.set(&target, Some("hello"));
        let classifier = Arc::new(FakeClassifier::new(Verdict::Important));
        let reports = tempfile::tempdir().unwrap();

        let mut session = MonitorSession::new();
        assert_eq!(session.status().state, SessionState::Idle);
        session
            .start(
                config(&[&target], true, Duration::from_secs(600)),
                deps(&source, &classifier, &reports),
            )
            .unwrap();
        assert!(session.is_running());
        assert_eq!(session.status().state, SessionState::Running);

        wait_for_cycles(&session, 1).await;
        let snapshots = session.snapshots();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].1.content, "hello");

        let status = session.stop().await;
        assert_eq!(status.state, SessionState::Stopped);
        assert_eq!(status.cycles_completed, 1);
        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn second_start_is_rejected_while_running() {
        let target = Target::new("https://example.com");
        let source = Arc::new(FakeSource::default());
        let classifier = Arc::new(FakeClassifier::new(Verdict::Important));
        let reports = tempfile::tempdir().unwrap();
        let cfg = config(&[&target], false, Duration::from_secs(600));

        let mut session = MonitorSession::new();
        session
            .start(cfg.clone(), deps(&source, &classifier, &reports))
            .unwrap();
        let err = session
            .start(cfg.clone(), deps(&source, &classifier, &reports))
            .unwrap_err();
        assert!(matches!(err, SessionError::AlreadyRunning));

        session.stop().await;
        session
            .start(cfg, deps(&source, &classifier, &reports))
            .unwrap();
        assert_eq!(session.status().state, SessionState::Running);
        session.stop().await;
    }

    #[tokio::test]
    async fn classification_failure_fails_the_session() {
        let target = Target::new("https://example.com");
        let source = Arc::new(FakeSource::default());
        source.set(&target, Some("v1"));
        let classifier = Arc::new(FakeClassifier::new(Verdict::Fail));
        let reports = tempfile::tempdir().unwrap();

        let mut session = MonitorSession::new();
        session
            .start(
                config(&[&target], true, Duration::from_millis(20)),
                deps(&source, &classifier, &reports),
            )
            .unwrap();
        wait_for_cycles(&session, 1).await;
        source.set(&target, Some("v2"));

        tokio::time::timeout(Duration::from_secs(2), session.finished())
            .await
            .expect("session should end after the classifier fails");

        let status = session.status();
        assert_eq!(status.state, SessionState::Failed);
        let message = status.last_error.unwrap();
        assert!(message.contains("https://example.com"));
        assert_eq!(session.snapshots()[0].1.content, "v1");

        let status = session.stop().await;
        assert_eq!(status.state, SessionState::Failed);
        session.clear_error();
        assert_eq!(session.status().state, SessionState::Stopped);
        assert!(session.status().last_error.is_none());
    }
}
