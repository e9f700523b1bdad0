//! Progress statistics: how many words sit in each progress bucket.

use std::time::Duration;

use serde::Serialize;

use crate::store::{StoreResult, WordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressBucket {
    pub label: &'static str,
    pub min: u8,
    pub max: u8,
}

pub const PROGRESS_BUCKETS: [ProgressBucket; 6] = [
    ProgressBucket { label: "0%", min: 0, max: 0 },
    ProgressBucket { label: "1-24%", min: 1, max: 24 },
    ProgressBucket { label: "25-49%", min: 25, max: 49 },
    ProgressBucket { label: "50-74%", min: 50, max: 74 },
    ProgressBucket { label: "75-99%", min: 75, max: 99 },
    ProgressBucket { label: "100%", min: 100, max: 100 },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketCount {
    #[serde(flatten)]
    pub bucket: ProgressBucket,
    pub count: u64,
    /// Share of all words, 0.0..=100.0
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub total: u64,
    pub buckets: Vec<BucketCount>,
}

impl ProgressReport {
    pub fn bucket(&self, label: &str) -> Option<&BucketCount> {
        self.buckets.iter().find(|b| b.bucket.label == label)
    }
}

/// Counts words per progress bucket.
///
/// An empty store is re-read once after `retry_delay`, since a first open may
/// still be loading seed data; still empty means all zeros.
pub async fn progress_report(
    store: &WordStore,
    retry_delay: Duration,
) -> StoreResult<ProgressReport> {
    let mut total = store.count().await?;
    if total == 0 {
        tracing::debug!(delay_ms = retry_delay.as_millis() as u64, "store empty, retrying once");
        tokio::time::sleep(retry_delay).await;
        total = store.count().await?;
    }

    let mut buckets = Vec::with_capacity(PROGRESS_BUCKETS.len());
    for bucket in PROGRESS_BUCKETS {
        let count = if total == 0 {
            0
        } else {
            store.count_in_range(bucket.min, bucket.max).await?
        };
        buckets.push(BucketCount {
            bucket,
            count,
            percentage: share(count, total),
        });
    }

    Ok(ProgressReport { total, buckets })
}

fn share(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}
