use bson::{Document, Timestamp};
use serde::{Deserialize, Serialize};

/// An opaque `$clusterTime` document as returned by the server. Compared only by the embedded
/// `Timestamp` — the signature is carried along but never inspected by this client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterTime {
    #[serde(rename = "clusterTime")]
    cluster_time: Timestamp,
    signature: Document,
}

impl ClusterTime {
    pub(crate) fn time(&self) -> Timestamp {
        self.cluster_time
    }

    pub(crate) fn as_document(&self) -> Document {
        bson::doc! {
            "clusterTime": self.cluster_time,
            "signature": self.signature.clone(),
        }
    }
}

impl PartialEq for ClusterTime {
    fn eq(&self, other: &Self) -> bool {
        self.cluster_time == other.cluster_time
    }
}

impl Eq for ClusterTime {}

impl PartialOrd for ClusterTime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClusterTime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.cluster_time.time, self.cluster_time.increment)
            .cmp(&(other.cluster_time.time, other.cluster_time.increment))
    }
}

/// Tracks the most recent `operationTime`/`$clusterTime` seen across all commands on a client,
/// per spec.md §4.6/§3: last-writer-wins, but only a monotonic advance is ever recorded, and the
/// values are shared by every session on the client (cleared together on `close`).
#[derive(Debug, Default)]
pub(crate) struct CausalConsistencyTracker {
    operation_time: Option<Timestamp>,
    cluster_time: Option<ClusterTime>,
}

impl CausalConsistencyTracker {
    pub(crate) fn operation_time(&self) -> Option<Timestamp> {
        self.operation_time
    }

    pub(crate) fn cluster_time(&self) -> Option<&ClusterTime> {
        self.cluster_time.as_ref()
    }

    /// Records `operationTime`/`$clusterTime` from a response, keeping only the most recent
    /// (monotonically non-decreasing) value of each, per spec.md §3 and Testable Property 5.
    pub(crate) fn record(&mut self, response: &Document) {
        if let Ok(ts) = response.get_timestamp("operationTime") {
            let should_replace = match self.operation_time {
                Some(current) => ts > current,
                None => true,
            };
            if should_replace {
                self.operation_time = Some(ts);
            }
        }

        if let Ok(doc) = response.get_document("$clusterTime") {
            if let Ok(new_ct) = bson::from_document::<ClusterTime>(doc.clone()) {
                let should_replace = match &self.cluster_time {
                    Some(current) => new_ct > *current,
                    None => true,
                };
                if should_replace {
                    self.cluster_time = Some(new_ct);
                }
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.operation_time = None;
        self.cluster_time = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn response_at(seconds: u32) -> Document {
        bson::doc! { "operationTime": Timestamp { time: seconds, increment: 1 } }
    }

    #[test]
    fn operation_time_only_advances_forward() {
        let mut tracker = CausalConsistencyTracker::default();
        tracker.record(&response_at(10));
        assert_eq!(tracker.operation_time().unwrap().time, 10);

        tracker.record(&response_at(5));
        assert_eq!(
            tracker.operation_time().unwrap().time,
            10,
            "an older operationTime must never roll the tracker backwards"
        );

        tracker.record(&response_at(20));
        assert_eq!(tracker.operation_time().unwrap().time, 20);
    }

    #[test]
    fn clear_resets_both_fields() {
        let mut tracker = CausalConsistencyTracker::default();
        tracker.record(&response_at(10));
        tracker.clear();
        assert!(tracker.operation_time().is_none());
        assert!(tracker.cluster_time().is_none());
    }
}
