//! Capacity-1 hand-off slot from the replanner to the flight loop.
//!
//! Both ends are non-blocking. A put into a full slot drops the new path, so
//! at most one replanned path is ever pending.

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};

use skyroute_core::waypoint::WaypointPath;

/// A replanned path tagged with the flight loop epoch it was planned for.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPath {
    pub epoch: u64,
    pub path: WaypointPath,
}

/// Producer end, owned by the replan worker.
pub struct PathPublisher {
    tx: Sender<PlannedPath>,
}

/// Consumer end, owned by the flight loop.
pub struct PathReceiver {
    rx: Receiver<PlannedPath>,
}

/// Create a connected publisher/receiver pair.
pub fn handoff_slot() -> (PathPublisher, PathReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    (PathPublisher { tx }, PathReceiver { rx })
}

impl PathPublisher {
    /// Offer a path. Returns `false` if the slot was full or the receiver is gone;
    /// the path is dropped in both cases.
    pub fn try_put(&self, planned: PlannedPath) -> bool {
        match self.tx.try_send(planned) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Disconnected(_)) => {
                log::debug!("handoff: receiver dropped");
                false
            }
        }
    }
}

impl PathReceiver {
    /// Take the pending path, if any.
    pub fn try_take(&self) -> Option<PlannedPath> {
        match self.rx.try_recv() {
            Ok(planned) => Some(planned),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Discard anything pending. Returns how many paths were dropped.
    pub fn drain(&self) -> usize {
        self.rx.try_iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
