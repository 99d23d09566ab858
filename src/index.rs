//! Read access to a completely built index

use std::path::Path;

use crate::base::{DocId, Len};
use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::run::{read_run, Run};

/// The final (merged) index of a build
pub struct FinalIndex {
    manifest: Manifest,
    run: Run,
}

impl FinalIndex {
    /// Opens the index built in `folder` with the given block size
    ///
    /// Fails with `Error::Incomplete` if the build did not finish
    pub fn open(folder: &Path, block_size: usize) -> Result<Self> {
        let manifest = Manifest::load(folder, block_size)?;
        let file_name = match &manifest.final_index {
            Some(info) => folder.join(&info.file_name),
            None => return Err(Error::Incomplete(folder.to_path_buf())),
        };
        let run = read_run(&file_name)?;
        Ok(Self { manifest, run })
    }

    /// Postings of a term (empty if the term is unknown)
    pub fn postings(&self, term: &str) -> &[DocId] {
        self.run.postings(term).unwrap_or_default()
    }

    /// Number of documents containing the term
    pub fn document_frequency(&self, term: &str) -> usize {
        self.postings(term).len()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.run.terms()
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn run(&self) -> &Run {
        &self.run
    }
}

/// Number of terms
impl Len for FinalIndex {
    fn len(&self) -> usize {
        self.run.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BuilderOptions, Indexer};
    use crate::documents::{from_documents, Document};
    use temp_dir::TempDir;

    #[test]
    fn test_open() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let options = BuilderOptions {
            block_size: 2,
            ..Default::default()
        };
        Indexer::new(dir.path(), &options)
            .expect("Invalid options")
            .build(from_documents(vec![
                Document::new(3).with_field("Abstract", "a b a"),
                Document::new(8).with_field("Title", "b c"),
            ]))
            .expect("Error while building the index");

        let index = FinalIndex::open(dir.path(), 2).expect("Could not open the index");
        assert_eq!(index.len(), 3);
        assert_eq!(index.postings("a"), &[3]);
        assert_eq!(index.postings("b"), &[3, 8]);
        assert_eq!(index.document_frequency("c"), 1);
        assert_eq!(index.document_frequency("z"), 0);
        assert_eq!(index.terms().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(index.manifest().block_size, 2);

        // Another block size was never built
        assert!(matches!(
            FinalIndex::open(dir.path(), 3),
            Err(Error::Incomplete(_))
        ));
    }

    #[test]
    fn test_incomplete() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        Manifest::new(4, &["Title".to_string()])
            .save(dir.path())
            .expect("Error while saving the manifest");
        assert!(matches!(
            FinalIndex::open(dir.path(), 4),
            Err(Error::Incomplete(_))
        ));
    }
}
