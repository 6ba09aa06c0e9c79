//! Per-segment evaluation context

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::segment::{IndexStatistics, ScoreParams, SegmentReader};

/// Everything a query node needs to evaluate against one segment
///
/// Statistics are snapshot-global so scores are comparable across segments;
/// the deadline and truncation flag are shared across the whole search.
pub struct SegmentContext<'a> {
    reader: &'a SegmentReader,
    stats: IndexStatistics,
    params: &'a ScoreParams,
    deadline: Option<Instant>,
    truncated: &'a AtomicBool,
}

impl<'a> SegmentContext<'a> {
    pub fn new(
        reader: &'a SegmentReader,
        stats: IndexStatistics,
        params: &'a ScoreParams,
        deadline: Option<Instant>,
        truncated: &'a AtomicBool,
    ) -> Self {
        Self {
            reader,
            stats,
            params,
            deadline,
            truncated,
        }
    }

    pub fn reader(&self) -> &SegmentReader {
        self.reader
    }

    pub fn stats(&self) -> &IndexStatistics {
        &self.stats
    }

    pub fn params(&self) -> &ScoreParams {
        self.params
    }

    /// True once the optional evaluation deadline has passed.
    pub fn deadline_exceeded(&self) -> bool {
        match self.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }

    /// Record that some scan stopped early; the search result carries this
    /// out to the caller instead of failing.
    pub fn mark_truncated(&self) {
        self.truncated.store(true, Ordering::Relaxed);
    }
}
