use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Fire-and-forget user notifications
pub trait Notifier {
    fn notify(&mut self, kind: NoticeKind, message: &str);
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: NoticeKind,
    pub message: String,
    pub shown_at: Instant,
}

/// Toasts shown at the bottom of the screen until they expire
#[derive(Debug)]
pub struct ToastQueue {
    toasts: VecDeque<Toast>,
    lifetime: Duration,
    capacity: usize,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(Duration::from_secs(4), 3)
    }
}

impl ToastQueue {
    pub fn new(lifetime: Duration, capacity: usize) -> Self {
        Self {
            toasts: VecDeque::new(),
            lifetime,
            capacity: capacity.max(1),
        }
    }

    /// Drop toasts older than their lifetime
    pub fn expire(&mut self, now: Instant) {
        let lifetime = self.lifetime;
        self.toasts
            .retain(|toast| now.saturating_duration_since(toast.shown_at) < lifetime);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn latest(&self) -> Option<&Toast> {
        self.toasts.back()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

impl Notifier for ToastQueue {
    fn notify(&mut self, kind: NoticeKind, message: &str) {
        if self.toasts.len() == self.capacity {
            self.toasts.pop_front();
        }
        self.toasts.push_back(Toast {
            kind,
            message: message.to_string(),
            shown_at: Instant::now(),
        });
    }
}
