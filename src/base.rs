use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

pub type DocId = u64;
pub type Term = String;
pub type BoxResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Separates a term from its postings in run files
pub const TERM_SEPARATOR: char = ':';

/// Separates two document IDs in run files
pub const POSTING_SEPARATOR: char = ',';

/// Suffix used while a file is being written
pub const TMP_SUFFIX: &str = "tmp";

/// Marks object that have a length
pub trait Len {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cooperative cancellation of a build
///
/// Cloned handles share the same flag
#[derive(Clone, Default, Debug)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns `Error::Aborted` once `abort` has been called
    pub fn check(&self) -> Result<()> {
        if self.is_aborted() {
            Err(Error::Aborted)
        } else {
            Ok(())
        }
    }
}

/// File name of a leaf run
///
/// The sequence number is zero-padded so that sorting file names
/// gives the sequence order
pub fn run_file_name(sequence: usize, block_size: usize) -> String {
    format!("block{:06}size{}.txt", sequence, block_size)
}

/// Parses a leaf run file name into (sequence, block size)
pub fn parse_run_file_name(name: &str) -> Option<(usize, usize)> {
    let rest = name.strip_prefix("block")?.strip_suffix(".txt")?;
    let (sequence, block_size) = rest.split_once("size")?;
    Some((sequence.parse().ok()?, block_size.parse().ok()?))
}

/// File name of the final (merged) index
pub fn final_index_file_name(block_size: usize) -> String {
    format!("index-size{}.txt", block_size)
}

/// File name of the build manifest
pub fn manifest_file_name(block_size: usize) -> String {
    format!("manifest-size{}.cbor", block_size)
}

/// Path used while writing `path`, renamed once complete
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(TMP_SUFFIX);
    path.with_file_name(name)
}
