//! Hand-off between the reducer and a UI dismiss animation.
//!
//! When leaving a step requires UI teardown, the machine moves to
//! `EndingStep` carrying a [`DismissContinuation`] and suspends on the paired
//! [`DismissSignal`]. The UI binding observes the state, runs its animation,
//! then calls [`DismissContinuation::resume`] to let the machine proceed.

use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Create a linked continuation/signal pair.
pub fn channel() -> (DismissContinuation, DismissSignal) {
    let (sender, receiver) = oneshot::channel();
    (
        DismissContinuation {
            sender: Arc::new(Mutex::new(Some(sender))),
        },
        DismissSignal { receiver },
    )
}

/// UI-facing half. Cloneable; resuming more than once is harmless.
#[derive(Clone)]
pub struct DismissContinuation {
    sender: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl DismissContinuation {
    /// Signal that the dismiss animation finished. Returns `true` for the
    /// call that actually released the machine.
    pub fn resume(&self) -> bool {
        let sender = match self.sender.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        match sender {
            Some(sender) => sender.send(()).is_ok(),
            None => false,
        }
    }

    pub fn is_resumed(&self) -> bool {
        match self.sender.lock() {
            Ok(slot) => slot.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }
}

impl PartialEq for DismissContinuation {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.sender, &other.sender)
    }
}

impl fmt::Debug for DismissContinuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DismissContinuation")
            .field("resumed", &self.is_resumed())
            .finish()
    }
}

/// Machine-facing half.
#[derive(Debug)]
pub struct DismissSignal {
    receiver: oneshot::Receiver<()>,
}

impl DismissSignal {
    /// Wait until the continuation is resumed. A continuation dropped without
    /// being resumed counts as resumed, so the machine cannot wait on a
    /// sender that no longer exists.
    pub async fn wait(self) {
        let _ = self.receiver.await;
    }
}
