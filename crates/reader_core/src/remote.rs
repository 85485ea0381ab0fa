//! Dispatch targets for encoded scripts.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::{error::DispatchError, literal::Script};

/// A live rendering surface that can evaluate a script.
///
/// Delivery is one-way: implementations hand the script over and return.
/// Results, if any, come back later as renderer events.
pub trait RemoteHandle: Send + Sync {
    fn inject(&self, script: &Script) -> Result<(), DispatchError>;
}

/// Queues scripts for the thread that owns the web view.
pub struct ChannelRemote {
    tx: Sender<Script>,
}

impl ChannelRemote {
    pub fn new(tx: Sender<Script>) -> Self {
        Self { tx }
    }

    pub fn bounded(capacity: usize) -> (Self, Receiver<Script>) {
        let (tx, rx) = bounded(capacity.max(1));
        (Self::new(tx), rx)
    }
}

impl RemoteHandle for ChannelRemote {
    fn inject(&self, script: &Script) -> Result<(), DispatchError> {
        match self.tx.try_send(script.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(DispatchError::QueueFull),
            Err(TrySendError::Disconnected(_)) => Err(DispatchError::Disconnected),
        }
    }
}
