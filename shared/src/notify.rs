use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// `created_at_ms` is zero until whoever displays the toast stamps it with
/// [`ToastMessage::shown_at`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastMessage {
    pub message: String,
    pub kind: ToastKind,
    pub created_at_ms: u64,
    pub duration_ms: u64,
}

impl ToastMessage {
    #[must_use]
    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            kind,
            created_at_ms: 0,
            duration_ms: kind.default_duration_ms(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Error)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Success)
    }

    #[must_use]
    pub fn shown_at(mut self, now_ms: u64) -> Self {
        self.created_at_ms = now_ms;
        self
    }

    #[must_use]
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at_ms) > self.duration_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    #[must_use]
    pub const fn default_duration_ms(self) -> u64 {
        match self {
            Self::Info => 3000,
            Self::Success => 2000,
            Self::Warning => 4000,
            Self::Error => 5000,
        }
    }
}

/// Transient, non-blocking user notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: ToastMessage);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, toast: ToastMessage) {
        (**self).notify(toast);
    }
}

/// Keeps every toast it receives; handy for hosts that render a queue.
#[derive(Debug, Default)]
pub struct ToastLog {
    toasts: Mutex<Vec<ToastMessage>>,
}

impl ToastLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<ToastMessage> {
        self.toasts
            .lock()
            .map(|t| t.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    #[must_use]
    pub fn count(&self, kind: ToastKind) -> usize {
        self.snapshot().iter().filter(|t| t.kind == kind).count()
    }
}

impl Notifier for ToastLog {
    fn notify(&self, toast: ToastMessage) {
        match self.toasts.lock() {
            Ok(mut toasts) => toasts.push(toast),
            Err(poisoned) => poisoned.into_inner().push(toast),
        }
    }
}
