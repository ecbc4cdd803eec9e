//! Blocking applications and the process-monitor feed
//!
//! The process monitor itself lives outside this crate. Dialogs only read
//! its current snapshot and subscribe to change notifications; they never
//! modify the set.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::Result;

/// A running process that must exit before the deployment can proceed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingApplication {
    /// Process name (e.g. `winword`)
    pub name: String,
    /// Friendly name shown to the user
    pub description: String,
    /// Executable path, used to look up the application icon
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl BlockingApplication {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Ordered snapshot of blocking applications
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingApplicationSet {
    apps: Vec<BlockingApplication>,
}

/// How a snapshot differs from the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetTransition {
    BecameEmpty,
    BecameNonEmpty,
    ContentChanged,
    Unchanged,
}

impl BlockingApplicationSet {
    pub fn new(apps: Vec<BlockingApplication>) -> Self {
        Self { apps }
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockingApplication> {
        self.apps.iter()
    }

    /// Classify the change from `self` to `next`
    pub fn transition_to(&self, next: &BlockingApplicationSet) -> SetTransition {
        match (self.is_empty(), next.is_empty()) {
            (false, true) => SetTransition::BecameEmpty,
            (true, false) => SetTransition::BecameNonEmpty,
            _ if self != next => SetTransition::ContentChanged,
            _ => SetTransition::Unchanged,
        }
    }
}

impl FromIterator<BlockingApplication> for BlockingApplicationSet {
    fn from_iter<I: IntoIterator<Item = BlockingApplication>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Read side of a process monitor, as seen by a dialog
pub trait ProcessMonitor: Send + Sync {
    /// Current set of blocking applications
    fn snapshot(&self) -> Result<BlockingApplicationSet>;

    /// Change notifications; each change carries the full new snapshot
    fn subscribe(&self) -> Result<watch::Receiver<BlockingApplicationSet>>;
}

/// Channel-backed monitor feed.
///
/// The external process watcher calls `publish` whenever the set of running
/// blocking applications changes.
#[derive(Debug, Clone)]
pub struct ProcessMonitorFeed {
    tx: Arc<watch::Sender<BlockingApplicationSet>>,
}

impl ProcessMonitorFeed {
    pub fn new(initial: BlockingApplicationSet) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Replace the current snapshot and notify subscribers
    pub fn publish(&self, set: BlockingApplicationSet) {
        self.tx.send_replace(set);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl ProcessMonitor for ProcessMonitorFeed {
    fn snapshot(&self) -> Result<BlockingApplicationSet> {
        Ok(self.tx.borrow().clone())
    }

    fn subscribe(&self) -> Result<watch::Receiver<BlockingApplicationSet>> {
        Ok(self.tx.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word() -> BlockingApplication {
        BlockingApplication::new("winword", "Microsoft Word")
    }

    #[test]
    fn test_transitions() {
        let empty = BlockingApplicationSet::default();
        let one: BlockingApplicationSet = [word()].into_iter().collect();
        let two: BlockingApplicationSet =
            [word(), BlockingApplication::new("excel", "Microsoft Excel")]
                .into_iter()
                .collect();

        assert_eq!(empty.transition_to(&one), SetTransition::BecameNonEmpty);
        assert_eq!(one.transition_to(&empty), SetTransition::BecameEmpty);
        assert_eq!(one.transition_to(&two), SetTransition::ContentChanged);
        assert_eq!(two.transition_to(&two.clone()), SetTransition::Unchanged);
        assert_eq!(empty.transition_to(&empty), SetTransition::Unchanged);
    }

    #[tokio::test]
    async fn test_feed_notifies_subscribers() {
        let feed = ProcessMonitorFeed::new([word()].into_iter().collect());
        let mut rx = feed.subscribe().unwrap();
        assert_eq!(feed.subscriber_count(), 1);

        feed.publish(BlockingApplicationSet::default());
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_empty());
        assert!(feed.snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let feed = ProcessMonitorFeed::new(BlockingApplicationSet::default());
        feed.publish([word()].into_iter().collect());
        assert_eq!(feed.snapshot().unwrap().len(), 1);
    }
}
