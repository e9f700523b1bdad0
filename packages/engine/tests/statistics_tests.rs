mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{temp_store, word_with_progress};
use deutschmemo_engine::{progress_report, PROGRESS_BUCKETS};

const NO_WAIT: Duration = Duration::from_millis(10);

#[tokio::test]
async fn test_report_counts_each_bucket() {
    let (_dir, store) = temp_store();
    store
        .put_all(&[
            word_with_progress(1, 0, 0),
            word_with_progress(2, 0, 0),
            word_with_progress(3, 100, 50),
            word_with_progress(4, 100, 100),
        ])
        .await
        .unwrap();

    let report = progress_report(&store, NO_WAIT).await.unwrap();

    assert_eq!(report.total, 4);
    assert_eq!(report.buckets.len(), PROGRESS_BUCKETS.len());
    assert_eq!(report.bucket("0%").unwrap().count, 2);
    assert_eq!(report.bucket("50-74%").unwrap().count, 1);
    assert_eq!(report.bucket("100%").unwrap().count, 1);
    assert_eq!(report.bucket("1-24%").unwrap().count, 0);
    assert_eq!(report.bucket("0%").unwrap().percentage, 50.0);
    assert_eq!(report.bucket("100%").unwrap().percentage, 25.0);
}

#[tokio::test]
async fn test_bucket_edges() {
    let (_dir, store) = temp_store();
    let batch: Vec<_> = [1u8, 24, 25, 49, 74, 75, 99]
        .into_iter()
        .enumerate()
        .map(|(i, progress)| word_with_progress(i as i64 + 1, 100, progress))
        .collect();
    store.put_all(&batch).await.unwrap();

    let report = progress_report(&store, NO_WAIT).await.unwrap();
    let counts: Vec<u64> = report.buckets.iter().map(|b| b.count).collect();

    assert_eq!(counts, vec![0, 2, 2, 1, 2, 0]);
}

#[tokio::test]
async fn test_counts_add_up_to_total() {
    let (_dir, store) = temp_store();
    let batch: Vec<_> = (0..=100u8)
        .map(|progress| word_with_progress(i64::from(progress) + 1, 100, progress))
        .collect();
    store.put_all(&batch).await.unwrap();

    let report = progress_report(&store, NO_WAIT).await.unwrap();

    let counted: u64 = report.buckets.iter().map(|b| b.count).sum();
    let share: f64 = report.buckets.iter().map(|b| b.percentage).sum();
    assert_eq!(report.total, 101);
    assert_eq!(counted, 101);
    assert!((share - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_empty_store_reports_zeros() {
    let (_dir, store) = temp_store();

    let report = progress_report(&store, NO_WAIT).await.unwrap();

    assert_eq!(report.total, 0);
    assert!(report
        .buckets
        .iter()
        .all(|b| b.count == 0 && b.percentage == 0.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_empty_store_is_read_again_after_delay() {
    let (_dir, store) = temp_store();
    store.open().await.unwrap();
    let store = Arc::new(store);

    let writer = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            store.put(&word_with_progress(1, 0, 0)).await.unwrap();
        })
    };

    let report = progress_report(&store, Duration::from_millis(500))
        .await
        .unwrap();
    writer.await.unwrap();

    assert_eq!(report.total, 1);
    assert_eq!(report.bucket("0%").unwrap().count, 1);
}

#[tokio::test]
async fn test_report_serializes_flat_buckets() {
    let (_dir, store) = temp_store();
    store.put(&word_with_progress(1, 100, 21)).await.unwrap();

    let report = progress_report(&store, NO_WAIT).await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["total"], 1);
    assert_eq!(json["buckets"][1]["label"], "1-24%");
    assert_eq!(json["buckets"][1]["count"], 1);
    assert_eq!(json["buckets"][1]["percentage"], 100.0);
}
