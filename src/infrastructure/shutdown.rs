use std::fmt;

use tokio::sync::watch;

/// Why a monitor was asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// The session owner called stop.
    Requested,
    /// The process received a termination signal.
    Signal(&'static str),
    /// Every `Shutdown` handle was dropped without triggering.
    Abandoned,
}

impl fmt::Display for StopCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopCause::Requested => f.write_str("stop requested"),
            StopCause::Signal(name) => write!(f, "received {name}"),
            StopCause::Abandoned => f.write_str("controller went away"),
        }
    }
}

/// Sending half of a one-shot stop signal. The first cause recorded sticks.
#[derive(Clone)]
pub struct Shutdown {
    sender: watch::Sender<Option<StopCause>>,
}

#[derive(Clone)]
pub struct ShutdownListener {
    receiver: watch::Receiver<Option<StopCause>>,
}

impl Shutdown {
    pub fn new() -> (Self, ShutdownListener) {
        let (sender, receiver) = watch::channel(None);
        (Self { sender }, ShutdownListener { receiver })
    }

    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn trigger(&self, cause: StopCause) {
        self.sender.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(cause);
            true
        });
    }
}

impl ShutdownListener {
    /// Resolves once a stop is requested, with the cause.
    pub async fn notified(&mut self) -> StopCause {
        loop {
            if let Some(cause) = self.cause() {
                return cause;
            }
            if self.receiver.changed().await.is_err() {
                return self.cause().unwrap_or(StopCause::Abandoned);
            }
        }
    }

    pub fn cause(&self) -> Option<StopCause> {
        *self.receiver.borrow()
    }

    pub fn is_triggered(&self) -> bool {
        self.cause().is_some()
    }
}

pub fn install_signal_handlers(shutdown: Shutdown) {
    let ctrlc = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrlc.trigger(StopCause::Signal("SIGINT"));
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                    shutdown.trigger(StopCause::Signal("SIGTERM"));
                }
                Err(err) => {
                    tracing::warn!(target: "session", error = %err, "SIGTERM handler unavailable");
                }
            }
        });
    }
}
