//! Completion signals raised by actors, keyed by actor id.

use crate::game::ActorId;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// An actor finished a step.
    Walking,
    /// An actor finished standing.
    Standing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorSignal {
    pub who: ActorId,
    pub kind: SignalKind,
}

impl ActorSignal {
    pub fn new(who: impl Into<ActorId>, kind: SignalKind) -> Self {
        Self {
            who: who.into(),
            kind,
        }
    }
}

/// Broadcast bus for actor signals, scoped to one overworld.
#[derive(Debug, Clone)]
pub struct SignalBus {
    sender: broadcast::Sender<ActorSignal>,
}

impl SignalBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    pub fn emit(&self, signal: ActorSignal) {
        let _ = self.sender.send(signal);
    }

    /// Subscribe before starting the action whose signal you need.
    pub fn subscribe(&self) -> broadcast::Receiver<ActorSignal> {
        self.sender.subscribe()
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for the next `kind` signal from `who`, ignoring everyone else's.
pub async fn wait_for(rx: &mut broadcast::Receiver<ActorSignal>, who: &str, kind: SignalKind) {
    loop {
        match rx.recv().await {
            Ok(signal) if signal.who == who && signal.kind == kind => return,
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}
