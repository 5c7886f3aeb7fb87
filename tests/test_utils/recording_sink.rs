//! Notification sink that records instead of printing

use std::sync::{Arc, Mutex};

use rli::{Notification, NotificationSink};

#[derive(Debug, Default)]
pub struct RecordingSink {
    notifications: Mutex<Vec<Notification>>,
    output: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn output(&self) -> Vec<String> {
        self.output.lock().unwrap().clone()
    }

    /// Number of notifications matching `predicate`
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Notification) -> bool,
    {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| predicate(n))
            .count()
    }

    pub fn clear(&self) {
        self.notifications.lock().unwrap().clear();
        self.output.lock().unwrap().clear();
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: &Notification) {
        self.notifications.lock().unwrap().push(notification.clone());
    }

    fn output(&self, text: &str) {
        self.output.lock().unwrap().push(text.to_string());
    }
}
