//! Merging sorted runs
//!
//! Two runs are merged like the combine step of a merge sort, term by term.
//! Many runs are merged by recursively splitting the list of runs in two
//! halves, which keeps the number of merge levels logarithmic in the number
//! of runs instead of re-merging a growing result with every run.

use std::cmp::Ordering;
use std::path::Path;

use log::{debug, info};

use crate::base::{AbortHandle, DocId, Len};
use crate::error::{Error, Result};
use crate::run::{read_run, Run, TermPostings};

/// Merges two non-decreasing postings lists
///
/// When both lists hold the same document ID, it is output once
pub fn merge_postings(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut merged = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => {
                merged.push(a[i]);
                i += 1;
            }
            Ordering::Equal => {
                merged.push(a[i]);
                i += 1;
                j += 1;
            }
            Ordering::Greater => {
                merged.push(b[j]);
                j += 1;
            }
        }
    }

    merged.extend_from_slice(&a[i..]);
    merged.extend_from_slice(&b[j..]);
    merged
}

/// Merges two runs into one
///
/// Terms found in only one run keep their postings; repeated document IDs
/// inside a list (a document mentioning the term several times) collapse
pub fn merge_runs(a: Run, b: Run) -> Run {
    let mut entries: Vec<TermPostings> = Vec::with_capacity(a.len().max(b.len()));
    let mut left = a.into_entries().into_iter().peekable();
    let mut right = b.into_entries().into_iter().peekable();

    loop {
        let order = match (left.peek(), right.peek()) {
            (Some((l, _)), Some((r, _))) => l.cmp(r),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };

        let entry = match order {
            Ordering::Less => left.next(),
            Ordering::Greater => right.next(),
            Ordering::Equal => match (left.next(), right.next()) {
                (Some((term, l)), Some((_, r))) => Some((term, merge_postings(&l, &r))),
                _ => None,
            },
        };

        if let Some((term, mut postings)) = entry {
            postings.dedup();
            entries.push((term, postings));
        }
    }

    Run::from_sorted(entries)
}

/// Schedules the merge of a list of runs
pub struct MergeScheduler {
    /// Merge sibling ranges concurrently
    parallel: bool,
    abort: AbortHandle,
}

impl MergeScheduler {
    pub fn new(parallel: bool, abort: AbortHandle) -> Self {
        Self { parallel, abort }
    }

    /// Merges all the runs (the list should not be empty)
    pub fn merge_all<P>(&self, runs: &[P]) -> Result<Run>
    where
        P: AsRef<Path> + Sync,
    {
        if runs.is_empty() {
            return Err(Error::Configuration(
                "cannot merge an empty list of runs".to_string(),
            ));
        }
        info!(
            "Merging {} runs ({} levels)",
            runs.len(),
            merge_levels(runs.len())
        );
        self.merge_range(runs, 0, runs.len() - 1)
    }

    /// Merges the runs `runs[low..=high]`
    pub fn merge_range<P>(&self, runs: &[P], low: usize, high: usize) -> Result<Run>
    where
        P: AsRef<Path> + Sync,
    {
        if low > high || high >= runs.len() {
            return Err(Error::Configuration(format!(
                "invalid run range [{}, {}] for {} runs",
                low,
                high,
                runs.len()
            )));
        }
        self.abort.check()?;

        if low == high {
            return read_run(runs[low].as_ref());
        }

        let (left, right) = if low + 1 == high {
            self.both(
                || read_run(runs[low].as_ref()),
                || read_run(runs[high].as_ref()),
            )
        } else {
            let middle = (low + high) / 2;
            self.both(
                || self.merge_range(runs, low, middle),
                || self.merge_range(runs, middle + 1, high),
            )
        };

        let (left, right) = (left?, right?);
        debug!(
            "Merging runs [{}, {}]: {} + {} terms",
            low,
            high,
            left.len(),
            right.len()
        );
        Ok(merge_runs(left, right))
    }

    fn both<A, B, RA, RB>(&self, a: A, b: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        if self.parallel {
            rayon::join(a, b)
        } else {
            (a(), b())
        }
    }
}

/// Number of merge levels for `n` runs
pub fn merge_levels(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        usize::BITS - (n - 1).leading_zeros()
    }
}
