// src/pipeline/batch.rs

//! Bounded-concurrency score fetching.
//!
//! The scope is split into consecutive chunks of `max_in_parallel`
//! repositories. Chunks run one after another; the fetches inside a chunk
//! run concurrently, so no more than `max_in_parallel` requests are ever
//! outstanding.

use futures::future;

use crate::error::Result;
use crate::models::{FetchFailure, RepositoryId, ScoreResult};
use crate::services::ScoreFetcher;

/// Split `items` into ordered chunks of at most `size` elements.
///
/// A `size` of zero is treated as one.
pub fn partition<T>(items: &[T], size: usize) -> Vec<&[T]> {
    items.chunks(size.max(1)).collect()
}

/// Everything a batch produced. Each requested repository appears in
/// exactly one of the three lists.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub results: Vec<ScoreResult>,
    pub failures: Vec<FetchFailure>,
    /// Not attempted because an earlier chunk failed
    pub skipped: Vec<RepositoryId>,
}

impl BatchOutcome {
    /// Total number of repositories accounted for.
    pub fn len(&self) -> usize {
        self.results.len() + self.failures.len() + self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }

    /// The fetched scores, or the first failure as an error.
    pub fn into_results(self) -> Result<Vec<ScoreResult>> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.into()),
            None => Ok(self.results),
        }
    }
}

/// Drives a [`ScoreFetcher`] over a whole scope.
pub struct BatchScheduler<'a> {
    fetcher: &'a dyn ScoreFetcher,
    max_in_parallel: usize,
    fail_fast: bool,
}

impl<'a> BatchScheduler<'a> {
    /// Create a fail-fast scheduler.
    pub fn new(fetcher: &'a dyn ScoreFetcher, max_in_parallel: usize) -> Self {
        Self {
            fetcher,
            max_in_parallel: max_in_parallel.max(1),
            fail_fast: true,
        }
    }

    /// Keep starting chunks after a failure.
    pub fn collect_all(mut self) -> Self {
        self.fail_fast = false;
        self
    }

    /// Fetch every repository in `ids`.
    ///
    /// A failure never cancels its siblings in the same chunk. In fail-fast
    /// mode no further chunk is started once one has failed.
    pub async fn run(&self, ids: &[RepositoryId]) -> BatchOutcome {
        let chunks = partition(ids, self.max_in_parallel);
        let total = chunks.len();
        let mut outcome = BatchOutcome::default();

        for (index, chunk) in chunks.into_iter().enumerate() {
            if self.fail_fast && !outcome.failures.is_empty() {
                outcome.skipped.extend(chunk.iter().cloned());
                continue;
            }

            log::debug!(
                "Fetching chunk {}/{} ({} repositories)",
                index + 1,
                total,
                chunk.len()
            );
            let fetched = future::join_all(chunk.iter().map(|id| self.fetcher.fetch(id))).await;

            for result in fetched {
                match result {
                    Ok(score) => outcome.results.push(score),
                    Err(failure) => {
                        log::warn!("Failed to fetch score for {}: {}", failure.id, failure.message);
                        outcome.failures.push(failure);
                    }
                }
            }
        }

        if !outcome.skipped.is_empty() {
            log::warn!(
                "Skipped {} repositories after fetch failures",
                outcome.skipped.len()
            );
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::models::ScoreSnapshot;

    /// Fetcher that records peak concurrency and fails on request.
    struct CountingFetcher {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
        failing: HashSet<String>,
    }

    impl CountingFetcher {
        fn new(failing: &[&str]) -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
                failing: failing.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    #[async_trait]
    impl ScoreFetcher for CountingFetcher {
        async fn fetch(&self, id: &RepositoryId) -> std::result::Result<ScoreResult, FetchFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing.contains(&id.name) {
                return Err(FetchFailure {
                    id: id.clone(),
                    message: "boom".to_string(),
                });
            }
            Ok(ScoreResult {
                id: id.clone(),
                snapshot: ScoreSnapshot::new(5.0, "2024-01-01", None),
            })
        }
    }

    fn ids(n: usize) -> Vec<RepositoryId> {
        (0..n)
            .map(|i| RepositoryId::new("github.com", "acme", format!("repo{i}")))
            .collect()
    }

    #[test]
    fn test_partition() {
        let items = [1, 2, 3, 4, 5, 6, 7];
        let chunks = partition(&items, 3);
        assert_eq!(chunks, vec![&[1, 2, 3][..], &[4, 5, 6][..], &[7][..]]);
        assert_eq!(items, [1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_partition_edge_sizes() {
        let items = [1, 2];
        assert_eq!(partition(&items, 0).len(), 2);
        assert_eq!(partition(&items, 10), vec![&[1, 2][..]]);
        assert!(partition::<i32>(&[], 4).is_empty());
    }

    #[tokio::test]
    async fn test_run_bounds_concurrency() {
        for (n, k) in [(1, 1), (7, 3), (10, 10), (25, 4), (5, 50)] {
            let fetcher = CountingFetcher::new(&[]);
            let outcome = BatchScheduler::new(&fetcher, k).run(&ids(n)).await;

            assert_eq!(outcome.results.len(), n);
            assert!(outcome.is_complete());
            assert!(fetcher.peak.load(Ordering::SeqCst) <= k);
        }
    }

    #[tokio::test]
    async fn test_run_covers_each_repository_once() {
        let scope = ids(9);
        let fetcher = CountingFetcher::new(&[]);
        let outcome = BatchScheduler::new(&fetcher, 4).run(&scope).await;

        let fetched: HashSet<_> = outcome.results.iter().map(|r| r.id.clone()).collect();
        assert_eq!(fetched.len(), 9);
        assert!(scope.iter().all(|id| fetched.contains(id)));
    }

    #[tokio::test]
    async fn test_failure_does_not_cancel_siblings() {
        let fetcher = CountingFetcher::new(&["repo1"]);
        let outcome = BatchScheduler::new(&fetcher, 3).run(&ids(3)).await;

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].id.name, "repo1");
    }

    #[tokio::test]
    async fn test_fail_fast_skips_later_chunks() {
        let fetcher = CountingFetcher::new(&["repo0"]);
        let outcome = BatchScheduler::new(&fetcher, 2).run(&ids(6)).await;

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.skipped.len(), 4);
        assert_eq!(outcome.len(), 6);
        assert!(outcome.into_results().is_err());
    }

    #[tokio::test]
    async fn test_collect_all_reports_every_failure() {
        let fetcher = CountingFetcher::new(&["repo0", "repo4"]);
        let outcome = BatchScheduler::new(&fetcher, 2)
            .collect_all()
            .run(&ids(6))
            .await;

        assert_eq!(outcome.len(), 6);
        assert_eq!(outcome.failures.len(), 2);
        assert!(outcome.skipped.is_empty());
    }
}
