//! The build manifest
//!
//! Lists the leaf runs written by a build and, once the merge is over, the
//! final index. A manifest without final index information describes an
//! incomplete build.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::base::{manifest_file_name, tmp_path};
use crate::error::{Error, Result};

/// A leaf run produced from one block
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RunInformation {
    /// Sequence number of the block (from 0)
    pub sequence: usize,

    /// File name, relative to the working directory
    pub file_name: String,

    /// Number of distinct terms
    pub terms: usize,

    /// Number of postings
    pub postings: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FinalIndexInformation {
    pub file_name: String,
    pub terms: usize,
    pub postings: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Manifest {
    pub block_size: usize,

    /// Indexed document fields
    pub fields: Vec<String>,

    /// Leaf runs, by increasing sequence number
    pub runs: Vec<RunInformation>,

    /// Set once the final index has been written
    pub final_index: Option<FinalIndexInformation>,
}

impl Manifest {
    pub fn new(block_size: usize, fields: &[String]) -> Self {
        Self {
            block_size,
            fields: fields.to_vec(),
            runs: Vec::new(),
            final_index: None,
        }
    }

    /// Path of the manifest within a working directory
    pub fn path(folder: &Path, block_size: usize) -> PathBuf {
        folder.join(manifest_file_name(block_size))
    }

    /// Adds a leaf run, keeping runs ordered by sequence number
    pub fn add_run(&mut self, run: RunInformation) {
        let ix = self
            .runs
            .partition_point(|r| r.sequence < run.sequence);
        self.runs.insert(ix, run);
    }

    /// Paths of the leaf runs, in merge order
    pub fn run_paths(&self, folder: &Path) -> Vec<PathBuf> {
        self.runs.iter().map(|r| folder.join(&r.file_name)).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.final_index.is_some()
    }

    /// Saves the manifest (through a temporary file)
    pub fn save(&self, folder: &Path) -> Result<()> {
        let path = Self::path(folder, self.block_size);
        let tmp = tmp_path(&path);
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            ciborium::ser::into_writer(self, &mut writer)
                .map_err(|e| Error::Manifest(e.to_string()))?;
            writer.flush()?;
        }
        fs::rename(&tmp, &path)?;
        debug!(
            "Saved manifest {} ({} runs, complete: {})",
            path.display(),
            self.runs.len(),
            self.is_complete()
        );
        Ok(())
    }

    /// Loads the manifest of a build
    ///
    /// Returns `Error::Incomplete` if there is none
    pub fn load(folder: &Path, block_size: usize) -> Result<Self> {
        let path = Self::path(folder, block_size);
        if !path.exists() {
            return Err(Error::Incomplete(folder.to_path_buf()));
        }
        let reader = BufReader::new(File::open(&path)?);
        let manifest: Manifest =
            ciborium::de::from_reader(reader).map_err(|e| Error::Manifest(e.to_string()))?;

        if manifest.block_size != block_size {
            return Err(Error::Manifest(format!(
                "{} was written for block size {}",
                path.display(),
                manifest.block_size
            )));
        }
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use temp_dir::TempDir;

    fn run_info(sequence: usize) -> RunInformation {
        RunInformation {
            sequence,
            file_name: crate::base::run_file_name(sequence, 5),
            terms: 5,
            postings: 7,
        }
    }

    #[test]
    fn test_runs_are_ordered() {
        let mut manifest = Manifest::new(5, &["Title".to_string()]);
        for sequence in [2, 0, 3, 1] {
            manifest.add_run(run_info(sequence));
        }
        let sequences: Vec<usize> = manifest.runs.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2, 3]);

        let paths = manifest.run_paths(Path::new("/work"));
        assert_eq!(paths[1], PathBuf::from("/work/block000001size5.txt"));
    }

    #[test]
    fn test_save_load() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let mut manifest = Manifest::new(5, &["Title".to_string()]);
        manifest.add_run(run_info(0));
        manifest.final_index = Some(FinalIndexInformation {
            file_name: "index-size5.txt".to_string(),
            terms: 5,
            postings: 7,
        });

        manifest.save(dir.path()).expect("Error while saving");
        let loaded = Manifest::load(dir.path(), 5).expect("Error while loading");
        assert_eq!(loaded, manifest);
        assert!(loaded.is_complete());
    }

    #[test]
    fn test_missing_manifest() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        assert!(matches!(
            Manifest::load(dir.path(), 5),
            Err(Error::Incomplete(_))
        ));
    }
}
