//! Concurrency correctness: one shared load across concurrent
//! initializers, stable results under concurrent lookups, and
//! order-preserving batches regardless of completion order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use industry_match::{
    IndustryMatcher, MatchError, MatcherCell, MatcherConfig, RawTaxonomyRecord, SearchField,
    StaticSource, TaxonomySource,
};

fn sample_records() -> Vec<RawTaxonomyRecord> {
    vec![
        RawTaxonomyRecord::new(1, "Software Development", "Technology > Software Development"),
        RawTaxonomyRecord::new(2, "Software Engineering", "Technology > Software Engineering"),
        RawTaxonomyRecord::new(3, "Food Service", "Hospitality > Food Service"),
        RawTaxonomyRecord::new(4, "Hospitals", "Healthcare > Hospitals"),
    ]
}

/// Counts loader invocations so tests can assert on load dedup.
struct CountingSource {
    inner: StaticSource,
    loads: AtomicUsize,
}

impl CountingSource {
    fn new(records: Vec<RawTaxonomyRecord>) -> Self {
        Self {
            inner: StaticSource::new(records),
            loads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TaxonomySource for CountingSource {
    async fn load(&self) -> Result<Vec<RawTaxonomyRecord>, MatchError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        // Widen the race window so concurrent initializers really overlap.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        self.inner.load().await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_initializers_share_one_load() {
    let cell = Arc::new(MatcherCell::new());
    let source = Arc::new(CountingSource::new(sample_records()));
    let config = MatcherConfig::default();

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let cell = Arc::clone(&cell);
            let source = Arc::clone(&source);
            let config = config.clone();
            tokio::spawn(async move {
                cell.get_or_init(source.as_ref(), &config)
                    .await
                    .expect("init")
            })
        })
        .collect();

    let mut handles = Vec::new();
    for task in tasks {
        handles.push(task.await.expect("join"));
    }

    assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    // Every caller observed the same matcher instance.
    for handle in &handles[1..] {
        assert!(Arc::ptr_eq(&handles[0], handle));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_lookups_on_one_matcher_agree() {
    let matcher = Arc::new(IndustryMatcher::new(sample_records()).expect("matcher"));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let matcher = Arc::clone(&matcher);
            tokio::spawn(async move {
                matcher
                    .find_closest("software", 3, SearchField::Label)
                    .await
                    .expect("lookup")
            })
        })
        .collect();

    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await.expect("join"));
    }

    let first = &results[0];
    for (i, result) in results.iter().enumerate().skip(1) {
        assert_eq!(first, result, "task {i} produced different results");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn batch_slots_match_input_positions_under_contention() {
    // A tight concurrency cap forces queries to complete out of dispatch
    // order; slots must still line up with the input positions.
    let config = MatcherConfig {
        batch_concurrency: 2,
        ..MatcherConfig::default()
    };
    let matcher = IndustryMatcher::with_config(sample_records(), config).expect("matcher");

    let queries: Vec<String> = vec![
        "software development".into(),
        "food".into(),
        "hospitals".into(),
        "software engineering".into(),
        "service".into(),
    ];
    let batch = matcher
        .find_closest_batch(&queries, 1, SearchField::Label)
        .await;
    assert_eq!(batch.len(), queries.len());

    let expected_top: Vec<u32> = vec![1, 3, 4, 2, 3];
    for (slot, expected) in batch.iter().zip(expected_top) {
        let hits = slot.as_ref().expect("batch slot");
        assert_eq!(hits[0].entry.id, expected);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_batches_do_not_interfere() {
    let matcher = Arc::new(IndustryMatcher::new(sample_records()).expect("matcher"));
    let queries: Vec<String> = (0..10).map(|i| format!("query number {i}")).collect();

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let matcher = Arc::clone(&matcher);
            let queries = queries.clone();
            tokio::spawn(async move {
                matcher
                    .find_closest_batch(&queries, 2, SearchField::Both)
                    .await
            })
        })
        .collect();

    let mut batches = Vec::new();
    for task in tasks {
        batches.push(task.await.expect("join"));
    }

    for batch in &batches[1..] {
        assert_eq!(&batches[0].len(), &batch.len());
        for (a, b) in batches[0].iter().zip(batch) {
            assert_eq!(a.as_ref().expect("slot"), b.as_ref().expect("slot"));
        }
    }
}
