use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

/// A transient message for the user (a toast)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

/// Queue of toasts raised by views, drained by whatever renders them
#[derive(Debug, Default)]
pub struct Notifier {
    queue: Mutex<VecDeque<Notification>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, message: impl Into<String>) {
        let message = message.into();
        info!(%message, "Notify");
        self.push(Level::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "Notify");
        self.push(Level::Error, message);
    }

    fn push(&self, level: Level, message: String) {
        // A poisoned queue only means an earlier toast was lost mid-push.
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        queue.push_back(Notification { level, message });
    }

    /// Take every pending notification, oldest first
    pub fn drain(&self) -> Vec<Notification> {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        queue.drain(..).collect()
    }

    pub fn last(&self) -> Option<Notification> {
        let queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        queue.back().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_in_order() {
        let notifier = Notifier::new();
        notifier.success("Propriedade cadastrada com sucesso!");
        notifier.error("Invalid login credentials");

        assert_eq!(notifier.last().unwrap().level, Level::Error);
        let drained = notifier.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].message, "Propriedade cadastrada com sucesso!");
        assert!(notifier.drain().is_empty());
    }
}
