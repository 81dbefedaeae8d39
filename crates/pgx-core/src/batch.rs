//! Batch Assessment API
//!
//! Assess many requests against one shared [`PgxEngine`]. Requests are
//! independent, so they fan out across rayon's thread pool.
//!
//! # Example
//!
//! ```
//! use pgx_core::batch::{BatchAssessor, BatchConfig};
//! use pgx_core::{AssessmentRequest, PgxEngine};
//!
//! let engine = PgxEngine::standard();
//! let assessor = BatchAssessor::new(&engine, BatchConfig::default());
//!
//! let requests = vec![
//!     AssessmentRequest::new("Warfarin", 5.0),
//!     AssessmentRequest::new("Digoxin", 0.25),
//!     AssessmentRequest::new("", 1.0),
//! ];
//!
//! let result = assessor.assess_all(&requests);
//! assert_eq!(result.success_count(), 2);
//! assert_eq!(result.failed_indices(), vec![2]);
//! ```

use crate::engine::{AssessmentReport, PgxEngine};
use crate::patient::AssessmentRequest;
use rayon::prelude::*;

/// Configuration for batch assessment
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Enable parallel processing
    pub parallel: bool,
    /// Validate each request and record failures instead of assessing bad input
    pub validate: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            parallel: true,
            validate: true,
        }
    }
}

impl BatchConfig {
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate = enabled;
        self
    }
}

/// A request that failed validation
#[derive(Clone, Debug)]
pub struct BatchFailure {
    pub index: usize,
    pub error: String,
}

/// Statistics from batch processing
#[derive(Clone, Debug, Default)]
pub struct BatchStats {
    pub processing_time_ms: u64,
    /// Average time per request in microseconds
    pub avg_assessment_time_us: f64,
}

/// Reports in input order, plus failures
#[derive(Clone, Debug)]
pub struct BatchResult {
    /// `(input index, report)` for every request that was assessed
    pub reports: Vec<(usize, AssessmentReport)>,
    pub failures: Vec<BatchFailure>,
    pub stats: BatchStats,
}

impl BatchResult {
    pub fn success_count(&self) -> usize {
        self.reports.len()
    }

    pub fn total_count(&self) -> usize {
        self.reports.len() + self.failures.len()
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.index).collect()
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_count() == 0 {
            0.0
        } else {
            self.success_count() as f64 / self.total_count() as f64
        }
    }
}

pub struct BatchAssessor<'a> {
    engine: &'a PgxEngine,
    config: BatchConfig,
}

impl<'a> BatchAssessor<'a> {
    pub fn new(engine: &'a PgxEngine, config: BatchConfig) -> Self {
        BatchAssessor { engine, config }
    }

    pub fn assess_all(&self, requests: &[AssessmentRequest]) -> BatchResult {
        self.assess_all_with_progress(requests, || {})
    }

    /// Like [`assess_all`](Self::assess_all); `on_item` runs once per finished
    /// request, possibly from several threads.
    pub fn assess_all_with_progress<F>(&self, requests: &[AssessmentRequest], on_item: F) -> BatchResult
    where
        F: Fn() + Sync,
    {
        let start_time = std::time::Instant::now();

        let run = |idx: usize, request: &AssessmentRequest| {
            let outcome = if self.config.validate {
                self.engine.assess_checked(request).map_err(|e| e.to_string())
            } else {
                Ok(self.engine.assess(request))
            };
            on_item();
            (idx, outcome)
        };

        let outcomes: Vec<_> = if self.config.parallel {
            requests
                .par_iter()
                .enumerate()
                .map(|(idx, request)| run(idx, request))
                .collect()
        } else {
            requests
                .iter()
                .enumerate()
                .map(|(idx, request)| run(idx, request))
                .collect()
        };

        let mut reports = Vec::with_capacity(requests.len());
        let mut failures = Vec::new();
        for (index, outcome) in outcomes {
            match outcome {
                Ok(report) => reports.push((index, report)),
                Err(error) => {
                    tracing::warn!(index, %error, "Skipping invalid request");
                    failures.push(BatchFailure { index, error });
                }
            }
        }

        let elapsed = start_time.elapsed();
        tracing::info!(
            assessed = reports.len(),
            failed = failures.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Batch complete"
        );

        BatchResult {
            stats: BatchStats {
                processing_time_ms: elapsed.as_millis() as u64,
                avg_assessment_time_us: if requests.is_empty() {
                    0.0
                } else {
                    elapsed.as_micros() as f64 / requests.len() as f64
                },
            },
            reports,
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn requests() -> Vec<AssessmentRequest> {
        (0..20)
            .map(|i| {
                let mut r = AssessmentRequest::new("Warfarin", 5.0);
                r.covariates.age = 20.0 + i as f64 * 3.0;
                r
            })
            .collect()
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let engine = PgxEngine::standard();
        let reqs = requests();

        let par = BatchAssessor::new(&engine, BatchConfig::default()).assess_all(&reqs);
        let seq = BatchAssessor::new(&engine, BatchConfig::default().with_parallel(false))
            .assess_all(&reqs);

        assert_eq!(par.success_count(), 20);
        for ((i, a), (j, b)) in par.reports.iter().zip(&seq.reports) {
            assert_eq!(i, j);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_order_is_preserved() {
        let engine = PgxEngine::standard();
        let result = BatchAssessor::new(&engine, BatchConfig::default()).assess_all(&requests());
        let indices: Vec<usize> = result.reports.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_invalid_requests_are_recorded() {
        let engine = PgxEngine::standard();
        let mut reqs = requests();
        reqs[3].standard_dose = -1.0;
        reqs[7].covariates.weight = 0.0;

        let result = BatchAssessor::new(&engine, BatchConfig::default()).assess_all(&reqs);
        assert_eq!(result.failed_indices(), vec![3, 7]);
        assert_eq!(result.success_count(), 18);
        assert!((result.success_rate() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_progress_callback_runs_per_item() {
        let engine = PgxEngine::standard();
        let counter = AtomicUsize::new(0);
        BatchAssessor::new(&engine, BatchConfig::default())
            .assess_all_with_progress(&requests(), || {
                counter.fetch_add(1, Ordering::Relaxed);
            });
        assert_eq!(counter.load(Ordering::Relaxed), 20);
    }
}
