//! Batched image generation with per-item retry.
//!
//! Targets are processed in fixed-size batches. Items within a batch run
//! concurrently; the sink receives each finished batch and is awaited before
//! the next batch starts, so an interrupted run keeps every batch that was
//! already handed over.

use async_trait::async_trait;
use futures::future::join_all;

use super::target::{GenerationResult, GenerationTarget, Outcome};
use crate::ai::GenerationError;
use crate::core::{retry_async, RetryConfig};
use crate::store::PersistenceError;

/// Why a single render attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Storage(#[from] PersistenceError),
}

/// Produces the image for one target and returns its URL.
#[async_trait]
pub trait ImageRenderer: Send + Sync {
    async fn render(&self, target: &GenerationTarget) -> Result<String, RenderError>;
}

/// Cumulative progress of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }
}

/// Receives finished batches.
#[async_trait]
pub trait BatchSink: Send {
    async fn accept(&mut self, results: Vec<GenerationResult>, progress: Progress);
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub batches: usize,
}

/// Batch image pipeline.
#[derive(Debug, Clone)]
pub struct BatchImagePipeline {
    batch_size: usize,
    retry: RetryConfig,
}

impl BatchImagePipeline {
    /// Create a pipeline. A batch size of zero is treated as one.
    pub fn new(batch_size: usize, retry: RetryConfig) -> Self {
        Self { batch_size: batch_size.max(1), retry }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Render every target, handing results to `sink` batch by batch.
    ///
    /// Every target ends with exactly one outcome. Failures never abort the
    /// run; they are recorded as [`Outcome::Failed`].
    pub async fn run<R, S>(
        &self,
        targets: Vec<GenerationTarget>,
        renderer: &R,
        sink: &mut S,
    ) -> PipelineReport
    where
        R: ImageRenderer + ?Sized,
        S: BatchSink + ?Sized,
    {
        let total = targets.len();
        let mut report = PipelineReport { total, ..Default::default() };
        if total == 0 {
            return report;
        }

        tracing::info!(total, batch_size = self.batch_size, "Starting image generation");

        for (batch, chunk) in targets.chunks(self.batch_size).enumerate() {
            let results = join_all(chunk.iter().map(|t| self.render_one(renderer, t))).await;

            let succeeded = results.iter().filter(|r| r.outcome.is_ready()).count();
            report.succeeded += succeeded;
            report.failed += results.len() - succeeded;
            report.batches += 1;

            let progress = Progress { completed: report.succeeded + report.failed, total };
            tracing::info!(
                batch = batch + 1,
                completed = progress.completed,
                total,
                failed = results.len() - succeeded,
                "Batch finished"
            );
            sink.accept(results, progress).await;
        }

        report
    }

    async fn render_one<R>(&self, renderer: &R, target: &GenerationTarget) -> GenerationResult
    where
        R: ImageRenderer + ?Sized,
    {
        let attempt = retry_async(
            &self.retry,
            || renderer.render(target),
            |attempt, e| {
                tracing::warn!(
                    target_key = %target.key,
                    attempt,
                    error = %e,
                    "Image attempt failed"
                );
            },
        )
        .await;

        let outcome = match attempt.into_result() {
            Ok(url) => Outcome::Ready(url),
            Err(_) => Outcome::Failed,
        };
        GenerationResult { target: target.clone(), outcome }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Fails a prompt a fixed number of times before succeeding.
    struct FlakyRenderer {
        failures: Mutex<HashMap<String, u32>>,
        calls: Mutex<Vec<String>>,
    }

    impl FlakyRenderer {
        fn new(failures: &[(&str, u32)]) -> Self {
            Self {
                failures: Mutex::new(
                    failures.iter().map(|(p, n)| ((*p).to_string(), *n)).collect(),
                ),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ImageRenderer for FlakyRenderer {
        async fn render(&self, target: &GenerationTarget) -> Result<String, RenderError> {
            self.calls.lock().push(target.prompt.clone());
            let mut failures = self.failures.lock();
            match failures.get_mut(&target.prompt) {
                Some(n) if *n > 0 => {
                    *n -= 1;
                    Err(GenerationError::NoImage.into())
                }
                _ => Ok(format!("mem://{}", target.prompt)),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        batches: Vec<Vec<GenerationResult>>,
        progress: Vec<Progress>,
    }

    #[async_trait]
    impl BatchSink for RecordingSink {
        async fn accept(&mut self, results: Vec<GenerationResult>, progress: Progress) {
            self.batches.push(results);
            self.progress.push(progress);
        }
    }

    fn targets(n: usize) -> Vec<GenerationTarget> {
        (0..n).map(|i| GenerationTarget::new("v0", i, format!("p{i}"))).collect()
    }

    fn fast_retry() -> RetryConfig {
        RetryConfig::fixed(2, Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn test_five_targets_batch_of_two() {
        let pipeline = BatchImagePipeline::new(2, fast_retry());
        let renderer = FlakyRenderer::new(&[]);
        let mut sink = RecordingSink::default();

        let report = pipeline.run(targets(5), &renderer, &mut sink).await;

        let sizes: Vec<usize> = sink.batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(
            sink.progress,
            vec![
                Progress { completed: 2, total: 5 },
                Progress { completed: 4, total: 5 },
                Progress { completed: 5, total: 5 },
            ]
        );
        assert_eq!(report, PipelineReport { total: 5, succeeded: 5, failed: 0, batches: 3 });
        assert!(!sink.progress[0].is_done());
        assert!(sink.progress[2].is_done());
    }

    /// Renderer and sink writing to one event log.
    #[derive(Default)]
    struct EventLog(Mutex<Vec<String>>);

    impl EventLog {
        fn push(&self, event: String) {
            self.0.lock().push(event);
        }

        fn events(&self) -> Vec<String> {
            self.0.lock().clone()
        }
    }

    #[async_trait]
    impl ImageRenderer for EventLog {
        async fn render(&self, target: &GenerationTarget) -> Result<String, RenderError> {
            self.push(format!("render {}", target.prompt));
            tokio::task::yield_now().await;
            Ok(format!("mem://{}", target.prompt))
        }
    }

    struct SlowSink<'a>(&'a EventLog);

    #[async_trait]
    impl BatchSink for SlowSink<'_> {
        async fn accept(&mut self, results: Vec<GenerationResult>, _progress: Progress) {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.0.push(format!("sink {}", results.len()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_batch_waits_for_sink() {
        let pipeline = BatchImagePipeline::new(2, fast_retry());
        let log = EventLog::default();
        let mut sink = SlowSink(&log);

        pipeline.run(targets(5), &log, &mut sink).await;

        assert_eq!(
            log.events(),
            vec![
                "render p0", "render p1", "sink 2", "render p2", "render p3", "sink 2",
                "render p4", "sink 1",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_item_failing_twice_is_marked_failed() {
        let pipeline = BatchImagePipeline::new(4, fast_retry());
        let renderer = FlakyRenderer::new(&[("p1", 2)]);
        let mut sink = RecordingSink::default();

        let report = pipeline.run(targets(3), &renderer, &mut sink).await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.succeeded, 2);
        let outcomes: Vec<&Outcome> = sink.batches[0].iter().map(|r| &r.outcome).collect();
        assert_eq!(outcomes[1], &Outcome::Failed);
        assert_eq!(outcomes[2], &Outcome::Ready("mem://p2".into()));
        let p1_calls = renderer.calls.lock().iter().filter(|p| *p == "p1").count();
        assert_eq!(p1_calls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_recovers_after_delay() {
        let pipeline = BatchImagePipeline::new(1, fast_retry());
        let renderer = FlakyRenderer::new(&[("p0", 1)]);
        let mut sink = RecordingSink::default();

        let start = tokio::time::Instant::now();
        let report = pipeline.run(targets(1), &renderer, &mut sink).await;

        assert_eq!(report.succeeded, 1);
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_empty_targets_is_noop() {
        let pipeline = BatchImagePipeline::new(4, fast_retry());
        let renderer = FlakyRenderer::new(&[]);
        let mut sink = RecordingSink::default();

        let report = pipeline.run(Vec::new(), &renderer, &mut sink).await;
        assert_eq!(report, PipelineReport::default());
        assert!(sink.batches.is_empty());
        assert!(sink.progress.is_empty());
    }

    #[tokio::test]
    async fn test_zero_batch_size_is_one() {
        let pipeline = BatchImagePipeline::new(0, RetryConfig::no_retry());
        assert_eq!(pipeline.batch_size(), 1);

        let renderer = FlakyRenderer::new(&[]);
        let mut sink = RecordingSink::default();
        let report = pipeline.run(targets(3), &renderer, &mut sink).await;
        assert_eq!(report.batches, 3);
    }

    #[tokio::test]
    async fn test_empty_prompt_is_still_attempted() {
        let pipeline = BatchImagePipeline::new(2, RetryConfig::no_retry());
        let renderer = FlakyRenderer::new(&[]);
        let mut sink = RecordingSink::default();

        pipeline.run(vec![GenerationTarget::new("v0", 0, "")], &renderer, &mut sink).await;
        assert_eq!(renderer.calls.lock().as_slice(), &[String::new()]);
    }
}
