use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Cross-cutting logger for pipeline orchestration events.
///
/// Decouples stages from specific output mechanisms (log crate, silent
/// batch runs) so each caller can observe pipeline behavior without
/// changing the orchestration code.
pub trait PipelineLogger: Send {
    /// Report per-stage progress as `current` of `total` items.
    fn progress(&mut self, stage: &str, current: usize, total: usize);

    /// Record how long a named pipeline stage took.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. fingerprint distance).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-pipeline summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
///
/// Used in quiet/batch mode and by tests where logger output is irrelevant.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _stage: &str, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI-oriented logger that reports stage progress through the `log`
/// facade and prints a summary of stage timings at the end.
///
/// Progress output is throttled to every `throttle` items per stage. Stages
/// are summarised in the order they first reported a timing.
pub struct StdoutPipelineLogger {
    throttle: usize,
    stage_order: Vec<String>,
    timings: HashMap<String, Vec<f64>>,
    items: HashMap<String, usize>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new(throttle: usize) -> Self {
        Self {
            throttle: throttle.max(1),
            stage_order: Vec::new(),
            timings: HashMap::new(),
            items: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!("Run summary ({:.1}s):", elapsed_ms / 1000.0)];

        for stage in &self.stage_order {
            let total_ms: f64 = self.timings[stage].iter().sum();
            let share = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            let mut line = format!("  {stage:8} {total_ms:8.0}ms ({share:4.1}%)");
            if let Some(count) = self.items.get(stage) {
                line.push_str(&format!(", {count} items"));
            }
            lines.push(line);
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let values = &self.metrics[name];
            if values.is_empty() {
                continue;
            }
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let avg = values.iter().sum::<f64>() / values.len() as f64;
            lines.push(format!(
                "  {name}: min {min:.1}, avg {avg:.1}, max {max:.1} over {}",
                values.len()
            ));
        }

        Some(lines.join("\n"))
    }

    /// Returns the timing data for a given stage.
    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    /// Returns the metric data for a given name.
    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, stage: &str, current: usize, total: usize) {
        let seen = self.items.entry(stage.to_string()).or_default();
        *seen = (*seen).max(total);
        if total > 0 && (current % self.throttle == 0 || current == total) {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("{stage}: {current}/{total} ({pct:.0}%)");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        if !self.timings.contains_key(stage) {
            self.stage_order.push(stage.to_string());
        }
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("{text}");
        }
    }
}

/// Progress reporting shared by the workers of a rayon stage.
///
/// Counts completed items and forwards each tick to the wrapped logger.
pub struct ParallelProgress<'a> {
    logger: Mutex<&'a mut dyn PipelineLogger>,
    stage: &'static str,
    done: AtomicUsize,
    total: usize,
}

impl<'a> ParallelProgress<'a> {
    pub fn new(logger: &'a mut dyn PipelineLogger, stage: &'static str, total: usize) -> Self {
        Self {
            logger: Mutex::new(logger),
            stage,
            done: AtomicUsize::new(0),
            total,
        }
    }

    pub fn tick(&self) {
        let current = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if let Ok(mut logger) = self.logger.lock() {
            logger.progress(self.stage, current, self.total);
        }
    }
}
