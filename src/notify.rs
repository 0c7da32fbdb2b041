//! Transient user-facing notifications.
//!
//! Timestamps are seconds on the caller's clock (the viewer passes the frame
//! time), which keeps expiry testable without sleeping.

use tracing::{error, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub created_at: f64,
}

#[derive(Clone, Debug)]
pub struct Toasts {
    ttl_secs: f64,
    next_id: u64,
    active: Vec<Toast>,
}

impl Default for Toasts {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL_SECS)
    }
}

impl Toasts {
    pub const DEFAULT_TTL_SECS: f64 = 4.0;
    const MAX_ACTIVE: usize = 6;

    pub fn new(ttl_secs: f64) -> Self {
        Self {
            ttl_secs: ttl_secs.max(0.0),
            next_id: 0,
            active: Vec::new(),
        }
    }

    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>, now: f64) -> u64 {
        let message = message.into();
        match kind {
            ToastKind::Info => info!(%message, "notification"),
            ToastKind::Error => error!(%message, "notification"),
        }

        let id = self.next_id;
        self.next_id += 1;
        self.active.push(Toast {
            id,
            kind,
            message,
            created_at: now,
        });
        if self.active.len() > Self::MAX_ACTIVE {
            self.active.remove(0);
        }
        id
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.active.len();
        self.active.retain(|toast| toast.id != id);
        self.active.len() != before
    }

    /// Drops toasts older than the TTL. Returns how many were removed.
    pub fn expire(&mut self, now: f64) -> usize {
        let before = self.active.len();
        let ttl = self.ttl_secs;
        self.active.retain(|toast| now - toast.created_at < ttl);
        before - self.active.len()
    }

    pub fn active(&self) -> &[Toast] {
        &self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
