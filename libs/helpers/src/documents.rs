use rand::{self, Rng, RngCore};
use std::collections::BTreeMap;

use bsbi_index::base::DocId;
use bsbi_index::documents::Document;

/// Fields filled by `create_document`
pub const FIELDS: [&str; 2] = ["Title", "Abstract"];

/// Creates a document whose fields hold up to `max_words` random
/// words drawn from a vocabulary `w0`, `w1`, ...
pub fn create_document(
    doc_id: DocId,
    vocabulary_size: usize,
    max_words: usize,
    rng: &mut dyn RngCore,
) -> Document {
    let mut document = Document::new(doc_id);

    for field in FIELDS {
        let num_words = rng.gen_range(0..=max_words);
        let words: Vec<String> = (0..num_words)
            .map(|_| format!("w{}", rng.gen_range(0..vocabulary_size)))
            .collect();
        document = document.with_field(field, &words.join(" "));
    }

    document
}

/// Creates a collection with increasing (but not contiguous) document IDs
pub fn create_collection(
    document_count: usize,
    vocabulary_size: usize,
    max_words: usize,
    rng: &mut dyn RngCore,
) -> Vec<Document> {
    let mut doc_id: DocId = 0;
    (0..document_count)
        .map(|_| {
            doc_id += rng.gen_range(1..4);
            create_document(doc_id, vocabulary_size, max_words, rng)
        })
        .collect()
}

/// Computes the expected index (sorted, duplicate-free postings) directly
pub fn expected_index(documents: &[Document], fields: &[&str]) -> BTreeMap<String, Vec<DocId>> {
    let mut index = BTreeMap::<String, Vec<DocId>>::new();
    for document in documents {
        for field in fields {
            for word in document.field(field).split_whitespace() {
                let postings = index.entry(word.to_string()).or_default();
                if postings.last() != Some(&document.index) {
                    postings.push(document.index);
                }
            }
        }
    }
    index
}
