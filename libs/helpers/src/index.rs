use std::collections::BTreeMap;

use log::info;
use rand::{rngs::StdRng, SeedableRng};
use temp_dir::TempDir;

use crate::documents::{create_collection, expected_index, FIELDS};
use bsbi_index::{
    base::{DocId, Len},
    builder::{BuilderOptions, Indexer},
    documents::{from_documents, Document},
    index::FinalIndex,
    stats::BuildReport,
};

pub struct TestIndex {
    pub dir: TempDir,
    pub documents: Vec<Document>,
    pub expected: BTreeMap<String, Vec<DocId>>,
    pub report: BuildReport,
    pub options: BuilderOptions,
}

impl TestIndex {
    pub fn new(
        document_count: usize,
        vocabulary_size: usize,
        max_words: usize,
        seed: Option<u64>,
        options: BuilderOptions,
    ) -> Self {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let mut rng = if let Some(seed) = seed {
            StdRng::seed_from_u64(seed)
        } else {
            StdRng::from_entropy()
        };

        let documents = create_collection(document_count, vocabulary_size, max_words, &mut rng);
        let expected = expected_index(&documents, &FIELDS);

        let indexer = Indexer::new(dir.path(), &options).expect("Invalid builder options");
        let report = indexer
            .build(from_documents(documents.clone()))
            .expect("Error while building the index");
        info!("Index built in {}: {}", dir.path().display(), report);

        Self {
            dir,
            documents,
            expected,
            report,
            options,
        }
    }

    pub fn open(&self) -> FinalIndex {
        FinalIndex::open(self.dir.path(), self.options.block_size)
            .expect("Could not open the final index")
    }
}

/// Checks that an index holds exactly the expected postings
pub fn check_index(index: &FinalIndex, expected: &BTreeMap<String, Vec<DocId>>) {
    assert_eq!(
        index.len(),
        expected.len(),
        "Expected {} terms, got {}",
        expected.len(),
        index.len()
    );
    assert!(
        index.run().has_strict_postings(),
        "Postings are not strictly increasing"
    );
    for ((term, postings), observed) in expected.iter().zip(index.terms()) {
        assert_eq!(term, observed, "Terms differ");
        let observed_postings = index.postings(observed);
        assert_eq!(
            postings.as_slice(),
            observed_postings,
            "Postings differ for term {}",
            term
        );
    }
}
