//! Blocked sort-based construction of inverted indices
//!
//! Documents are streamed into bounded in-memory blocks; each block is
//! inverted and written to disk as a sorted run, and the runs are merged
//! pairwise, following a balanced binary tree, into the final index.
//!
//! ```no_run
//! use std::path::Path;
//! use bsbi_index::builder::{BuilderOptions, Indexer};
//!
//! let options = BuilderOptions { block_size: 200, ..Default::default() };
//! let indexer = Indexer::new(Path::new("work"), &options)?;
//! let report = indexer.build_from_path(Path::new("docs.json"))?;
//! println!("{}", report);
//! # Ok::<(), bsbi_index::error::Error>(())
//! ```

pub mod base;
pub mod block;
pub mod builder;
pub mod documents;
pub mod error;
pub mod index;
pub mod manifest;
pub mod merge;
pub mod run;
pub mod stats;
pub mod tokenizer;
