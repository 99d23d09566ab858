//! In-memory blocks and the block producer
//!
//! The producer reads documents one at a time and appends a posting for
//! every term occurrence of the indexed fields. Once the current block
//! holds `block_size` distinct terms it is handed out and a fresh block is
//! started, so at most one block is held in memory by the producer.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use log::debug;

use crate::base::{DocId, Len, Term};
use crate::documents::Document;
use crate::error::{Error, Result};
use crate::tokenizer::Tokenizer;

/// Postings accumulated in memory, in arrival order
#[derive(Default, Debug)]
pub struct Block {
    postings: HashMap<Term, Vec<DocId>>,
    postings_count: usize,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a posting for a term
    pub fn add(&mut self, term: &str, docid: DocId) {
        match self.postings.get_mut(term) {
            Some(docids) => docids.push(docid),
            None => {
                self.postings.insert(term.to_string(), vec![docid]);
            }
        }
        self.postings_count += 1;
    }

    /// Total number of postings (including repeated ones)
    pub fn postings_count(&self) -> usize {
        self.postings_count
    }

    #[cfg(test)]
    pub(crate) fn get(&self, term: &str) -> Option<&[DocId]> {
        self.postings.get(term).map(Vec::as_slice)
    }

    pub fn into_postings(self) -> HashMap<Term, Vec<DocId>> {
        self.postings
    }
}

/// Number of distinct terms
impl Len for Block {
    fn len(&self) -> usize {
        self.postings.len()
    }
}

/// Turns a document stream into a sequence of blocks
pub struct BlockProducer<I> {
    documents: I,
    fields: Vec<String>,
    tokenizer: Arc<dyn Tokenizer>,
    block_size: usize,

    /// The block being filled
    block: Block,

    /// Blocks flushed but not yet returned
    ready: VecDeque<Block>,

    last_docid: Option<DocId>,
    done: bool,
}

impl<I> BlockProducer<I>
where
    I: Iterator<Item = Result<Document>>,
{
    pub fn new(
        documents: I,
        fields: &[String],
        tokenizer: Arc<dyn Tokenizer>,
        block_size: usize,
    ) -> Self {
        Self {
            documents,
            fields: fields.to_vec(),
            tokenizer,
            block_size,
            block: Block::new(),
            ready: VecDeque::new(),
            last_docid: None,
            done: block_size == 0,
        }
    }

    fn add_document(&mut self, document: &Document) -> Result<()> {
        let docid = document.index;
        if let Some(previous) = self.last_docid {
            if docid <= previous {
                return Err(Error::UnorderedDocuments {
                    previous,
                    current: docid,
                });
            }
        }
        self.last_docid = Some(docid);

        let Self {
            fields,
            tokenizer,
            block,
            ready,
            block_size,
            ..
        } = self;

        for field in fields.iter() {
            tokenizer.tokenize(document.field(field), &mut |term| {
                block.add(term, docid);
                if block.len() >= *block_size {
                    debug!(
                        "Flushing block with {} terms ({} postings)",
                        block.len(),
                        block.postings_count()
                    );
                    ready.push_back(std::mem::take(block));
                }
            });
        }
        Ok(())
    }
}

impl<I> Iterator for BlockProducer<I>
where
    I: Iterator<Item = Result<Document>>,
{
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(block) = self.ready.pop_front() {
                return Some(Ok(block));
            }
            if self.done {
                return None;
            }

            match self.documents.next() {
                Some(Ok(document)) => {
                    if let Err(e) = self.add_document(&document) {
                        self.done = true;
                        return Some(Err(e));
                    }
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    if !self.block.is_empty() {
                        debug!(
                            "Flushing last block with {} terms ({} postings)",
                            self.block.len(),
                            self.block.postings_count()
                        );
                        self.ready.push_back(std::mem::take(&mut self.block));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::from_documents;
    use crate::tokenizer::WhitespaceTokenizer;

    fn producer(documents: Vec<Document>, block_size: usize) -> impl Iterator<Item = Result<Block>> {
        BlockProducer::new(
            from_documents(documents),
            &["Title".to_string(), "Abstract".to_string()],
            Arc::new(WhitespaceTokenizer),
            block_size,
        )
    }

    fn cat_dog() -> Vec<Document> {
        vec![
            Document::new(1).with_field("Title", "cat dog"),
            Document::new(2).with_field("Title", "dog bird"),
        ]
    }

    #[test]
    fn test_flush_on_block_size() {
        let blocks: Vec<Block> = producer(cat_dog(), 1)
            .collect::<Result<_>>()
            .expect("Error while producing blocks");

        // One block per term occurrence
        assert_eq!(blocks.len(), 4);
        assert!(blocks.iter().all(|b| b.len() == 1));
        assert_eq!(blocks[0].get("cat"), Some(&[1][..]));
        assert_eq!(blocks[1].get("dog"), Some(&[1][..]));
        assert_eq!(blocks[2].get("dog"), Some(&[2][..]));
        assert_eq!(blocks[3].get("bird"), Some(&[2][..]));
    }

    #[test]
    fn test_partial_block_flushed_at_end() {
        let blocks: Vec<Block> = producer(cat_dog(), 2)
            .collect::<Result<_>>()
            .expect("Error while producing blocks");

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].len(), 2);
        assert_eq!(blocks[0].get("dog"), Some(&[1][..]));
        // "dog" from document 2 opens the second block
        assert_eq!(blocks[1].get("dog"), Some(&[2][..]));
        assert_eq!(blocks[1].get("bird"), Some(&[2][..]));
    }

    #[test]
    fn test_repeated_terms_are_kept() {
        let documents = vec![Document::new(7)
            .with_field("Title", "cat")
            .with_field("Abstract", "cat cat")];
        let blocks: Vec<Block> = producer(documents, 100)
            .collect::<Result<_>>()
            .expect("Error while producing blocks");

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].get("cat"), Some(&[7, 7, 7][..]));
        assert_eq!(blocks[0].postings_count(), 3);
    }

    #[test]
    fn test_no_blocks() {
        assert_eq!(producer(vec![], 10).count(), 0);
        assert_eq!(producer(cat_dog(), 0).count(), 0);
        assert_eq!(
            producer(vec![Document::new(1).with_field("Other", "x")], 10).count(),
            0
        );
    }

    #[test]
    fn test_unordered_documents() {
        let documents = vec![
            Document::new(2).with_field("Title", "a"),
            Document::new(1).with_field("Title", "b"),
        ];
        let results: Vec<Result<Block>> = producer(documents, 10).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(Error::UnorderedDocuments {
                previous: 2,
                current: 1
            })
        ));
    }
}
