//! Per-segment statistics for ranked scoring
//!
//! Each segment stores its document lengths and the derived average; ranking
//! weighs term frequency against field-length normalization (BM25 family).

use serde::{Deserialize, Serialize};

use super::types::DocNo;

/// Scoring parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoreParams {
    /// Term frequency saturation
    pub k1: f32,
    /// Length normalization strength
    pub b: f32,
}

impl Default for ScoreParams {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// Statistics for a single segment
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SegmentStatistics {
    pub doc_count: u32,
    pub total_doc_length: u64,
    /// Document lengths indexed by docno
    doc_lengths: Vec<u32>,
}

impl SegmentStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            doc_count: 0,
            total_doc_length: 0,
            doc_lengths: Vec::with_capacity(capacity),
        }
    }

    /// Record a document and return its assigned docno
    pub fn add_document(&mut self, doc_len: u32) -> DocNo {
        let docno = DocNo::new(self.doc_count);
        self.doc_lengths.push(doc_len);
        self.total_doc_length += doc_len as u64;
        self.doc_count += 1;
        docno
    }

    pub fn get_doc_length(&self, docno: DocNo) -> Option<u32> {
        self.doc_lengths.get(docno.as_usize()).copied()
    }

    pub fn doc_lengths(&self) -> &[u32] {
        &self.doc_lengths
    }

    pub fn from_doc_lengths(doc_lengths: Vec<u32>) -> Self {
        let doc_count = doc_lengths.len() as u32;
        let total_doc_length = doc_lengths.iter().map(|&l| l as u64).sum();
        Self {
            doc_count,
            total_doc_length,
            doc_lengths,
        }
    }
}

/// Global statistics across all segments in one snapshot
#[derive(Clone, Copy, Debug, Default)]
pub struct IndexStatistics {
    pub total_docs: u32,
    pub avg_doc_length: f32,
}

impl IndexStatistics {
    pub fn from_segments<'a>(stats: impl Iterator<Item = &'a SegmentStatistics>) -> Self {
        let mut total_docs = 0u32;
        let mut total_length = 0u64;
        for s in stats {
            total_docs += s.doc_count;
            total_length += s.total_doc_length;
        }
        let avg_doc_length = if total_docs > 0 {
            total_length as f32 / total_docs as f32
        } else {
            0.0
        };
        Self {
            total_docs,
            avg_doc_length,
        }
    }

    /// Inverse document frequency (Robertson-Sparck-Jones form)
    pub fn idf(&self, doc_frequency: u32) -> f32 {
        let n = self.total_docs as f32;
        let df = doc_frequency as f32;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// TF score with length normalization
    pub fn tf_score(&self, tf: u32, doc_len: u32, params: &ScoreParams) -> f32 {
        if self.avg_doc_length == 0.0 {
            return 0.0;
        }
        let tf = tf as f32;
        let norm = 1.0 - params.b + params.b * (doc_len as f32 / self.avg_doc_length);
        (tf * (params.k1 + 1.0)) / (tf + params.k1 * norm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_document_assigns_dense_docnos() {
        let mut stats = SegmentStatistics::new();
        assert_eq!(stats.add_document(50), DocNo(0));
        assert_eq!(stats.add_document(75), DocNo(1));

        assert_eq!(stats.doc_count, 2);
        assert_eq!(stats.total_doc_length, 125);
        assert_eq!(stats.get_doc_length(DocNo(1)), Some(75));
        assert_eq!(stats.get_doc_length(DocNo(2)), None);
    }

    #[test]
    fn test_from_doc_lengths() {
        let stats = SegmentStatistics::from_doc_lengths(vec![10, 20, 30]);
        assert_eq!(stats.doc_count, 3);
        assert_eq!(stats.total_doc_length, 60);
    }

    #[test]
    fn test_global_stats() {
        let a = SegmentStatistics::from_doc_lengths(vec![10, 20]);
        let b = SegmentStatistics::from_doc_lengths(vec![30]);
        let global = IndexStatistics::from_segments([&a, &b].into_iter());

        assert_eq!(global.total_docs, 3);
        assert!((global.avg_doc_length - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_scoring_monotonicity() {
        let global = IndexStatistics {
            total_docs: 100,
            avg_doc_length: 50.0,
        };
        let params = ScoreParams::default();

        // Higher TF scores higher
        assert!(global.tf_score(3, 50, &params) > global.tf_score(1, 50, &params));
        // Longer documents are normalized down
        assert!(global.tf_score(2, 200, &params) < global.tf_score(2, 20, &params));
        // Rare terms get larger IDF
        assert!(global.idf(1) > global.idf(50));
    }
}
