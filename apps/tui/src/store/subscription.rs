use crate::domain::Report;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;
use tracing::debug;

/// A live feed of newly committed reports.
///
/// Reports arrive in commit order, each at most once. Dropping the
/// subscription (or calling [`Subscription::unsubscribe`]) stops the feed task
/// and releases the channel.
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<Report>,
    feed: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(receiver: mpsc::UnboundedReceiver<Report>, feed: JoinHandle<()>) -> Self {
        Self { receiver, feed }
    }

    /// Waits for the next report. `None` once the feed has ended.
    pub async fn next(&mut self) -> Option<Report> {
        self.receiver.recv().await
    }

    /// Non-blocking poll used by the UI loop.
    pub fn try_next(&mut self) -> Option<Report> {
        match self.receiver.try_recv() {
            Ok(report) => Some(report),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// True once the feed task has stopped; buffered reports may remain.
    pub fn is_finished(&self) -> bool {
        self.feed.is_finished()
    }

    pub fn unsubscribe(self) {
        debug!("unsubscribing from insert feed");
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.feed.abort();
    }
}
