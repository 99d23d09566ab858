//! Document records and the default JSON document source
//!
//! Two layouts are accepted: a single JSON array of records, or one
//! record per line (JSON Lines). Records carry an integer `Index` and any
//! number of text fields.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::de::{Deserializer as _, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::base::DocId;
use crate::error::{Error, Result};

/// A stream of documents, read lazily
pub type DocumentStream = Box<dyn Iterator<Item = Result<Document>> + Send>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Document {
    #[serde(rename = "Index")]
    pub index: DocId,

    #[serde(flatten)]
    pub fields: HashMap<String, Value>,
}

impl Document {
    pub fn new(index: DocId) -> Self {
        Self {
            index,
            fields: HashMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, text: &str) -> Self {
        self.fields
            .insert(name.to_string(), Value::String(text.to_string()));
        self
    }

    /// Text of a field; missing or non-textual fields are empty
    pub fn field(&self, name: &str) -> &str {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

/// Wraps in-memory documents as a stream
pub fn from_documents(documents: Vec<Document>) -> DocumentStream {
    Box::new(documents.into_iter().map(Ok))
}

/// Returns the first non-whitespace byte without consuming it
fn peek_first_byte(reader: &mut impl BufRead) -> std::io::Result<Option<u8>> {
    loop {
        let buffer = reader.fill_buf()?;
        if buffer.is_empty() {
            return Ok(None);
        }
        match buffer.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(ix) => {
                let b = buffer[ix];
                reader.consume(ix);
                return Ok(Some(b));
            }
            None => {
                let n = buffer.len();
                reader.consume(n);
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Layout {
    Empty,
    Array,
    Lines,
}

fn open_reader(path: &Path) -> Result<(BufReader<File>, Layout)> {
    let file = File::open(path).map_err(|e| Error::source_unavailable(path, e))?;
    let mut reader = BufReader::new(file);
    let first = peek_first_byte(&mut reader).map_err(|e| Error::source_unavailable(path, e))?;
    let layout = match first {
        None => Layout::Empty,
        Some(b'[') => Layout::Array,
        Some(_) => Layout::Lines,
    };
    Ok((reader, layout))
}

/// Deserializes every element of a JSON array and drops it
struct ArrayValidator;

impl<'de> Visitor<'de> for ArrayValidator {
    type Value = usize;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an array of documents")
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut count = 0;
        while seq.next_element::<Document>()?.is_some() {
            count += 1;
        }
        Ok(count)
    }
}

/// Reads the whole collection once without keeping any record
fn validate(reader: BufReader<File>, layout: Layout) -> serde_json::Result<usize> {
    match layout {
        Layout::Empty => Ok(0),
        Layout::Array => {
            let mut deserializer = serde_json::Deserializer::from_reader(reader);
            let count = (&mut deserializer).deserialize_seq(ArrayValidator)?;
            deserializer.end()?;
            Ok(count)
        }
        Layout::Lines => {
            let mut count = 0;
            let documents = serde_json::Deserializer::from_reader(reader).into_iter::<Document>();
            for document in documents {
                document?;
                count += 1;
            }
            Ok(count)
        }
    }
}

/// Lazily yields the elements of a JSON array, one record at a time
pub struct ArrayDocuments<R> {
    reader: R,
    path: PathBuf,
    first: bool,
    done: bool,
}

impl<R: BufRead> ArrayDocuments<R> {
    /// The reader must be positioned before the opening bracket
    pub fn new(reader: R, path: &Path) -> Self {
        Self {
            reader,
            path: path.to_path_buf(),
            first: true,
            done: false,
        }
    }

    fn next_document(&mut self) -> Result<Option<Document>> {
        let next = peek_first_byte(&mut self.reader)
            .map_err(|e| Error::source_unavailable(&self.path, e))?;
        match (self.first, next) {
            (true, Some(b'[')) => {
                self.reader.consume(1);
                self.first = false;
                self.next_element(true)
            }
            (true, _) => Err(Error::source_unavailable(&self.path, "expected an array")),
            (false, Some(b']')) => Ok(None),
            (false, Some(b',')) => {
                self.reader.consume(1);
                self.next_element(false)
            }
            (false, Some(b)) => Err(Error::source_unavailable(
                &self.path,
                format!("unexpected character {:?}", b as char),
            )),
            (false, None) => Err(Error::source_unavailable(&self.path, "unterminated array")),
        }
    }

    fn next_element(&mut self, may_close: bool) -> Result<Option<Document>> {
        let next = peek_first_byte(&mut self.reader)
            .map_err(|e| Error::source_unavailable(&self.path, e))?;
        if may_close && next == Some(b']') {
            return Ok(None);
        }
        // Objects end on their closing brace, so no byte is read past them
        let mut deserializer = serde_json::Deserializer::from_reader(&mut self.reader);
        Document::deserialize(&mut deserializer)
            .map(Some)
            .map_err(|e| Error::source_unavailable(&self.path, e))
    }
}

impl<R: BufRead> Iterator for ArrayDocuments<R> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.next_document();
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        result.transpose()
    }
}

/// Opens a JSON document collection
///
/// The file is read once to check every record, so that a malformed
/// collection is reported before any block is produced. It is then reopened
/// and records are streamed, never holding the collection in memory.
pub fn open_documents(path: &Path) -> Result<DocumentStream> {
    let (reader, layout) = open_reader(path)?;
    let count = validate(reader, layout).map_err(|e| Error::source_unavailable(path, e))?;
    info!("Document collection {} holds {} documents", path.display(), count);

    let (reader, layout) = open_reader(path)?;
    match layout {
        Layout::Empty => Ok(Box::new(std::iter::empty())),
        Layout::Array => Ok(Box::new(ArrayDocuments::new(reader, path))),
        Layout::Lines => {
            debug!("Streaming JSON lines from {}", path.display());
            let path = path.to_path_buf();
            let stream = serde_json::Deserializer::from_reader(reader)
                .into_iter::<Document>()
                .map(move |r| r.map_err(|e| Error::source_unavailable(&path, e)));
            Ok(Box::new(stream))
        }
    }
}
