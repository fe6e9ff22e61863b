//! Progress relay from engine worker threads to the host.

use crossbeam_channel::{Receiver, Sender, TrySendError};

/// Default number of undrained updates kept before the oldest are evicted.
pub const PROGRESS_CAPACITY: usize = 256;

/// Sends retried against concurrent reporters before an update is dropped.
const EVICT_ATTEMPTS: usize = 4;

/// One progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// What the engine is doing.
    pub title: String,
    /// Completion in `[0, 100]`.
    pub percent: f32,
}

/// Sending side. Cheap to clone into engine worker threads.
///
/// Updates are lossy: when the host is not draining and the channel is full,
/// the oldest pending update is evicted so the latest one always lands.
#[derive(Debug, Clone)]
pub struct ProgressRelay {
    sender: Sender<ProgressUpdate>,
    evict: Receiver<ProgressUpdate>,
}

impl ProgressRelay {
    /// Reports progress; `fraction` is clamped to `[0, 1]`.
    pub fn report(&self, title: impl Into<String>, fraction: f32) {
        let update = ProgressUpdate {
            title: title.into(),
            percent: fraction.clamp(0.0, 1.0) * 100.0,
        };
        let mut pending = update;
        for _ in 0..EVICT_ATTEMPTS {
            match self.sender.try_send(pending) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => return,
                Err(TrySendError::Full(update)) => {
                    if let Ok(stale) = self.evict.try_recv() {
                        tracing::trace!(
                            title = %stale.title,
                            "progress channel full, evicting oldest"
                        );
                    }
                    pending = update;
                }
            }
        }
        tracing::trace!(title = %pending.title, "progress channel contended, dropping update");
    }
}

/// Creates a bounded progress channel holding at least one update.
#[must_use]
pub fn progress_channel(capacity: usize) -> (ProgressRelay, Receiver<ProgressUpdate>) {
    let (sender, receiver) = crossbeam_channel::bounded(capacity.max(1));
    let relay = ProgressRelay {
        sender,
        evict: receiver.clone(),
    };
    (relay, receiver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_reports_are_clamped() {
        let (relay, receiver) = progress_channel(4);
        relay.report("Loading", -0.5);
        relay.report("Rendering", 0.25);
        relay.report("Rendering", 3.0);

        let updates: Vec<_> = receiver.try_iter().collect();
        assert_eq!(updates.len(), 3);
        assert_eq!(updates[0].percent, 0.0);
        assert_eq!(updates[1].percent, 25.0);
        assert_eq!(updates[2].percent, 100.0);
    }

    #[test]
    fn test_full_channel_evicts_oldest() {
        let (relay, receiver) = progress_channel(2);
        relay.report("a", 0.1);
        relay.report("b", 0.2);
        relay.report("c", 1.0);
        let updates: Vec<_> = receiver.try_iter().collect();
        let titles: Vec<_> = updates.iter().map(|u| u.title.as_str()).collect();
        assert_eq!(titles, ["b", "c"]);
        assert_eq!(updates[1].percent, 100.0);
    }

    #[test]
    fn test_report_from_worker_threads() {
        let (relay, receiver) = progress_channel(PROGRESS_CAPACITY);
        let workers: Vec<_> = (0..4)
            .map(|i| {
                let relay = relay.clone();
                thread::spawn(move || relay.report(format!("worker {i}"), 0.5))
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(receiver.try_iter().count(), 4);
    }

    #[test]
    fn test_dropped_receiver_is_ignored() {
        let (relay, receiver) = progress_channel(1);
        drop(receiver);
        relay.report("orphan", 1.0);
    }
}
