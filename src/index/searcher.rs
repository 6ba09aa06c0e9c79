//! Query execution over a snapshot

use std::cmp::Ordering;
use std::sync::atomic::{self, AtomicBool};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{Result, SearchError};
use crate::query::{Query, SegmentContext, Sort, SortOrder};
use crate::segment::{DocAddress, DocNo, ScoreParams, SortValue, StoredDocument};

use super::reader::Snapshot;

/// One search result
#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit {
    pub addr: DocAddress,
    pub score: f32,
}

/// Ranked results of one search
#[derive(Clone, Debug, Default)]
pub struct TopDocs {
    pub hits: Vec<SearchHit>,
    /// True when a dictionary scan stopped at the deadline; the hits are a
    /// valid but possibly incomplete answer.
    pub truncated: bool,
}

impl TopDocs {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }
}

/// Knobs for a single search call
#[derive(Clone, Debug, Default)]
pub struct SearchOptions {
    pub limit: usize,
    /// Explicit ordering; `None` ranks by score
    pub sort: Option<Sort>,
    /// Bound on evaluation work; exceeded scans truncate, not fail
    pub deadline: Option<Instant>,
}

impl SearchOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Options with the configured default result limit.
    pub fn from_config(config: &crate::config::IndexConfig) -> Self {
        Self::with_limit(config.result_limit)
    }
}

/// Executes queries against one snapshot
///
/// Read-only and safely shared across threads. The searcher never observes
/// writes committed after its snapshot was opened.
#[derive(Clone)]
pub struct Searcher {
    snapshot: Arc<Snapshot>,
    params: ScoreParams,
}

struct Candidate {
    addr: DocAddress,
    score: f32,
    sort_keys: Vec<Option<SortValue>>,
}

impl Searcher {
    pub(crate) fn new(snapshot: Arc<Snapshot>) -> Self {
        Self {
            snapshot,
            params: ScoreParams::default(),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Top `limit` hits ranked by score, ties broken by ascending address.
    pub fn search(&self, query: &dyn Query, limit: usize) -> Result<TopDocs> {
        self.search_with(query, SearchOptions::with_limit(limit))
    }

    /// Search with explicit sort and/or deadline.
    ///
    /// An empty result is a valid answer, never an error. Malformed query
    /// trees are rejected before any segment is touched.
    pub fn search_with(&self, query: &dyn Query, options: SearchOptions) -> Result<TopDocs> {
        query.validate()?;

        let truncated = AtomicBool::new(false);
        let mut candidates: Vec<Candidate> = Vec::new();

        for segment in &self.snapshot.segments {
            let ctx = SegmentContext::new(
                segment,
                self.snapshot.stats,
                &self.params,
                options.deadline,
                &truncated,
            );

            let matches = query.execute(&ctx)?;
            for docno in matches.iter() {
                let docno = DocNo::new(docno);
                if segment.is_deleted(docno) {
                    continue;
                }

                let addr = DocAddress::new(segment.id(), docno);
                let (score, sort_keys) = match &options.sort {
                    None => (query.score(&ctx, docno).unwrap_or(0.0), Vec::new()),
                    Some(sort) => {
                        let keys = sort
                            .fields
                            .iter()
                            .map(|f| segment.sort_value(&f.field, docno).cloned())
                            .collect();
                        (0.0, keys)
                    }
                };
                candidates.push(Candidate {
                    addr,
                    score,
                    sort_keys,
                });
            }
        }

        match &options.sort {
            None => candidates.sort_by(|a, b| {
                b.score
                    .total_cmp(&a.score)
                    .then_with(|| a.addr.cmp(&b.addr))
            }),
            Some(sort) => candidates.sort_by(|a, b| {
                for (i, field) in sort.fields.iter().enumerate() {
                    let ord = compare_keys(&a.sort_keys[i], &b.sort_keys[i], field.order);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.addr.cmp(&b.addr)
            }),
        }

        candidates.truncate(options.limit);
        Ok(TopDocs {
            hits: candidates
                .into_iter()
                .map(|c| SearchHit {
                    addr: c.addr,
                    score: c.score,
                })
                .collect(),
            truncated: truncated.load(atomic::Ordering::Relaxed),
        })
    }

    /// Stored fields of one document.
    ///
    /// Fails with `DocumentNotFound` when the address is tombstoned, out of
    /// range, or names an unknown segment. The snapshot stays valid either
    /// way.
    pub fn document(&self, addr: DocAddress) -> Result<StoredDocument> {
        let not_found = || SearchError::DocumentNotFound {
            segment: addr.segment.0,
            doc: addr.doc.as_u32(),
        };

        let segment = self
            .snapshot
            .segments
            .iter()
            .find(|s| s.id() == addr.segment)
            .ok_or_else(not_found)?;

        if !segment.is_live(addr.doc) {
            return Err(not_found());
        }

        segment.stored(addr.doc).ok_or_else(not_found)?
    }
}

/// Missing sort values order last, regardless of direction.
fn compare_keys(a: &Option<SortValue>, b: &Option<SortValue>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match order {
            SortOrder::Asc => a.cmp(b),
            SortOrder::Desc => b.cmp(a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
