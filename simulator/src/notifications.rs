use chrono::{Duration, Utc};

use crate::domain::{Notification, NotificationKind};

/// Account notifications, newest first.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    items: Vec<Notification>,
    next_id: u64,
}

impl NotificationCenter {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
        }
    }

    pub fn all(&self) -> &[Notification] {
        &self.items
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.read).count()
    }

    /// Prepends an unread notification and returns its id.
    pub fn add(&mut self, kind: NotificationKind, title: &str, message: &str, link: Option<&str>) -> String {
        let id = self.next_id.to_string();
        self.next_id += 1;
        self.items.insert(
            0,
            Notification {
                id: id.clone(),
                kind,
                title: title.to_string(),
                message: message.to_string(),
                timestamp: Utc::now(),
                read: false,
                link: link.map(str::to_string),
            },
        );
        id
    }

    pub fn mark_as_read(&mut self, id: &str) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_as_read(&mut self) {
        for n in &mut self.items {
            n.read = true;
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    pub fn clear_all(&mut self) {
        self.items.clear();
    }
}

impl Default for NotificationCenter {
    /// Seeded with the demo account's notification history.
    fn default() -> Self {
        let now = Utc::now();
        let seed = [
            (
                NotificationKind::Success,
                "Deposit confirmed",
                "Your deposit of R$ 1,000.00 has been confirmed.",
                Duration::minutes(5),
                false,
                None,
            ),
            (
                NotificationKind::Info,
                "Order executed",
                "Your buy order for 0.001 BTC was executed.",
                Duration::minutes(30),
                false,
                None,
            ),
            (
                NotificationKind::Warning,
                "Verification pending",
                "Complete your KYC verification to raise your limits.",
                Duration::hours(2),
                true,
                Some("/app/settings/kyc"),
            ),
            (
                NotificationKind::Info,
                "New feature available",
                "You can now trade with leverage.",
                Duration::hours(24),
                true,
                None,
            ),
        ];

        let items: Vec<Notification> = seed
            .into_iter()
            .enumerate()
            .map(|(i, (kind, title, message, age, read, link))| Notification {
                id: (i + 1).to_string(),
                kind,
                title: title.to_string(),
                message: message.to_string(),
                timestamp: now - age,
                read,
                link: link.map(str::to_string),
            })
            .collect();
        let next_id = items.len() as u64 + 1;

        Self { items, next_id }
    }
}
