//! Background expansion rounds with cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use super::{ExpansionError, ExpansionProvider, NodeContext, Suggestion};

pub trait Cancellable {
    fn is_cancelled(&self) -> bool;

    fn cancel(&self);
}

/// Shared liveness flag handed to a worker when it starts.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancellable for CancellationToken {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

/// Result of one provider call, tagged with where it came from.
#[derive(Debug)]
pub struct DiscoveryBatch {
    pub session_id: Option<String>,
    pub anchor_id: String,
    pub ghost: bool,
    pub result: Result<Vec<Suggestion>, ExpansionError>,
}

#[derive(Debug, Default)]
pub struct DiscoveryPoll {
    pub batches: Vec<DiscoveryBatch>,
    pub discarded: usize,
    /// The worker has exited and its channel is drained.
    pub finished: bool,
}

/// Worker that expands each anchor in turn, one provider call per round.
pub struct DiscoveryLoop {
    token: CancellationToken,
    session_id: Option<String>,
    rx: Receiver<DiscoveryBatch>,
    handle: Option<JoinHandle<()>>,
}

impl DiscoveryLoop {
    /// Runs `rounds` provider calls cycling through `anchors`, sleeping
    /// `interval` after each. Contexts are captured now, so the worker never
    /// reads live state.
    pub fn spawn(
        provider: Arc<dyn ExpansionProvider>,
        anchors: Vec<NodeContext>,
        session_id: Option<String>,
        rounds: usize,
        interval: Duration,
        ghost: bool,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        let token = CancellationToken::new();
        let worker_token = token.clone();
        let worker_session = session_id.clone();

        let handle = thread::spawn(move || {
            if anchors.is_empty() {
                return;
            }
            for round in 0..rounds {
                let context = &anchors[round % anchors.len()];
                let result = provider.expand(context);
                if worker_token.is_cancelled() {
                    debug!(anchor = %context.node.id, "discovery cancelled; dropping provider result");
                    return;
                }

                let batch = DiscoveryBatch {
                    session_id: worker_session.clone(),
                    anchor_id: context.node.id.clone(),
                    ghost,
                    result,
                };
                if tx.send(batch).is_err() {
                    return;
                }

                if round + 1 < rounds && !interval.is_zero() {
                    thread::sleep(interval);
                }
                if worker_token.is_cancelled() {
                    debug!(round, "discovery cancelled after delay");
                    return;
                }
            }
        });

        Self {
            token,
            session_id,
            rx,
            handle: Some(handle),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Drains finished rounds. Batches are only handed out while the loop is
    /// live and `live_session` still matches the session it was started in.
    pub fn poll(&mut self, live_session: Option<&str>) -> DiscoveryPoll {
        let mut poll = DiscoveryPoll::default();
        loop {
            match self.rx.try_recv() {
                Ok(batch) => {
                    if self.token.is_cancelled() {
                        debug!(anchor = %batch.anchor_id, "discarding result from cancelled discovery");
                        poll.discarded += 1;
                    } else if batch.session_id.as_deref() != live_session {
                        debug!(
                            anchor = %batch.anchor_id,
                            origin = ?batch.session_id,
                            live = ?live_session,
                            "discarding result from inactive session"
                        );
                        poll.discarded += 1;
                    } else {
                        poll.batches.push(batch);
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    poll.finished = true;
                    if let Some(handle) = self.handle.take()
                        && handle.join().is_err()
                    {
                        warn!("discovery worker panicked");
                    }
                    break;
                }
            }
        }
        poll
    }
}

impl Drop for DiscoveryLoop {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
