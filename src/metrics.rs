//! Rewrite metrics for profiling rule sets.
//!
//! With the `tracing` feature the session counts search steps, unifications,
//! rule matches and fixpoint progress. Without it every recorder is an empty
//! inline function.
//!
//! ```rust,ignore
//! let session = Session::new();
//! // ... run a rewrite ...
//! println!("{}", session.metrics().report());
//! ```

#[cfg(feature = "tracing")]
use std::sync::atomic::{AtomicU64, Ordering};

/// Aggregate counters collected while rewriting.
#[cfg(feature = "tracing")]
pub struct RewriteMetrics {
    /// Stream steps taken by solution iterators
    pub steps: AtomicU64,
    /// Successful unifications
    pub unifications: AtomicU64,
    /// Failed unifications
    pub unification_failures: AtomicU64,
    /// Disequalities that failed a branch
    pub disequality_failures: AtomicU64,
    /// Times a rule matched at some position
    pub rule_matches: AtomicU64,
    /// Distinct single-step rewrites produced by the walker
    pub walk_results: AtomicU64,
    /// Rewrite steps taken by the fixpoint driver
    pub fixpoint_steps: AtomicU64,
    /// Fixpoints yielded
    pub fixpoints: AtomicU64,
}

#[cfg(feature = "tracing")]
impl RewriteMetrics {
    pub fn new() -> Self {
        Self {
            steps: AtomicU64::new(0),
            unifications: AtomicU64::new(0),
            unification_failures: AtomicU64::new(0),
            disequality_failures: AtomicU64::new(0),
            rule_matches: AtomicU64::new(0),
            walk_results: AtomicU64::new(0),
            fixpoint_steps: AtomicU64::new(0),
            fixpoints: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_step(&self) {
        self.steps.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_unification(&self) {
        self.unifications.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_unification_failure(&self) {
        self.unification_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_disequality_failure(&self) {
        self.disequality_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rule_match(&self) {
        self.rule_matches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_walk_result(&self) {
        self.walk_results.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_fixpoint_step(&self) {
        self.fixpoint_steps.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_fixpoint(&self) {
        self.fixpoints.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of all counters.
    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            steps: self.steps.load(Ordering::Relaxed),
            unifications: self.unifications.load(Ordering::Relaxed),
            unification_failures: self.unification_failures.load(Ordering::Relaxed),
            disequality_failures: self.disequality_failures.load(Ordering::Relaxed),
            rule_matches: self.rule_matches.load(Ordering::Relaxed),
            walk_results: self.walk_results.load(Ordering::Relaxed),
            fixpoint_steps: self.fixpoint_steps.load(Ordering::Relaxed),
            fixpoints: self.fixpoints.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.steps.store(0, Ordering::Relaxed);
        self.unifications.store(0, Ordering::Relaxed);
        self.unification_failures.store(0, Ordering::Relaxed);
        self.disequality_failures.store(0, Ordering::Relaxed);
        self.rule_matches.store(0, Ordering::Relaxed);
        self.walk_results.store(0, Ordering::Relaxed);
        self.fixpoint_steps.store(0, Ordering::Relaxed);
        self.fixpoints.store(0, Ordering::Relaxed);
    }
}

#[cfg(feature = "tracing")]
impl Default for RewriteMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsReport {
    pub steps: u64,
    pub unifications: u64,
    pub unification_failures: u64,
    pub disequality_failures: u64,
    pub rule_matches: u64,
    pub walk_results: u64,
    pub fixpoint_steps: u64,
    pub fixpoints: u64,
}

impl MetricsReport {
    /// Fraction of unification attempts that succeeded.
    pub fn unification_success_rate(&self) -> f64 {
        let total = self.unifications + self.unification_failures;
        if total == 0 {
            1.0
        } else {
            self.unifications as f64 / total as f64
        }
    }
}

impl std::fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Rewrite Metrics ===")?;
        writeln!(f, "Stream steps:       {}", self.steps)?;
        writeln!(
            f,
            "Unifications:       {} ({} failures, {:.1}% success)",
            self.unifications,
            self.unification_failures,
            self.unification_success_rate() * 100.0
        )?;
        writeln!(f, "Diseq failures:     {}", self.disequality_failures)?;
        writeln!(f, "Rule matches:       {}", self.rule_matches)?;
        writeln!(f, "Walker results:     {}", self.walk_results)?;
        writeln!(
            f,
            "Fixpoint:           {} steps, {} fixpoints",
            self.fixpoint_steps, self.fixpoints
        )?;
        Ok(())
    }
}

#[cfg(not(feature = "tracing"))]
pub struct RewriteMetrics;

#[cfg(not(feature = "tracing"))]
impl RewriteMetrics {
    #[inline]
    pub fn new() -> Self {
        RewriteMetrics
    }
    #[inline]
    pub fn record_step(&self) {}
    #[inline]
    pub fn record_unification(&self) {}
    #[inline]
    pub fn record_unification_failure(&self) {}
    #[inline]
    pub fn record_disequality_failure(&self) {}
    #[inline]
    pub fn record_rule_match(&self) {}
    #[inline]
    pub fn record_walk_result(&self) {}
    #[inline]
    pub fn record_fixpoint_step(&self) {}
    #[inline]
    pub fn record_fixpoint(&self) {}
    #[inline]
    pub fn report(&self) -> MetricsReport {
        MetricsReport::default()
    }
    #[inline]
    pub fn reset(&self) {}
}

#[cfg(not(feature = "tracing"))]
impl Default for RewriteMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/metrics.rs"]
mod tests;
