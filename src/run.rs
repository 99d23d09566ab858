//! Sorted runs: block inversion and the run file format
//!
//! A run file holds one line per term, in ascending term order:
//!
//! ```text
//! bird:2
//! cat:1
//! dog:1,2
//! ```

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;

use crate::base::{tmp_path, DocId, Len, Term, POSTING_SEPARATOR, TERM_SEPARATOR};
use crate::block::Block;
use crate::error::{Error, Result};

/// A term together with its postings
pub type TermPostings = (Term, Vec<DocId>);

/// An immutable mapping from terms to postings, sorted by term
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Run {
    entries: Vec<TermPostings>,
}

impl Run {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a run from entries that are already sorted by term
    pub fn from_sorted(entries: Vec<TermPostings>) -> Self {
        debug_assert!(
            entries.windows(2).all(|w| w[0].0 < w[1].0),
            "Terms should be strictly increasing"
        );
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DocId])> {
        self.entries
            .iter()
            .map(|(term, postings)| (term.as_str(), postings.as_slice()))
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(term, _)| term.as_str())
    }

    pub fn postings(&self, term: &str) -> Option<&[DocId]> {
        self.entries
            .binary_search_by(|(t, _)| t.as_str().cmp(term))
            .ok()
            .map(|ix| self.entries[ix].1.as_slice())
    }

    /// Total number of postings over all terms
    pub fn postings_count(&self) -> usize {
        self.entries.iter().map(|(_, postings)| postings.len()).sum()
    }

    /// Whether every postings list is strictly increasing
    pub fn has_strict_postings(&self) -> bool {
        self.entries
            .iter()
            .all(|(_, postings)| postings.windows(2).all(|w| w[0] < w[1]))
    }

    /// Collapses repeated document IDs in (sorted) postings lists
    pub fn dedup_postings(&mut self) {
        for (_, postings) in self.entries.iter_mut() {
            postings.dedup();
        }
    }

    pub fn into_entries(self) -> Vec<TermPostings> {
        self.entries
    }
}

/// Number of terms
impl Len for Run {
    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Inverts a block: terms are sorted, postings keep their arrival order
pub fn invert(block: Block) -> Run {
    let mut entries: Vec<TermPostings> = block.into_postings().into_iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    Run { entries }
}

/// Writes a run in the text format
pub fn write_entries<W: Write>(writer: &mut W, run: &Run, path: &Path) -> Result<()> {
    for (ix, (term, postings)) in run.iter().enumerate() {
        if term.contains(['\n', '\r']) {
            return Err(Error::format(path, ix + 1, "term contains a line break"));
        }
        write!(writer, "{}{}", term, TERM_SEPARATOR)?;
        for (jx, docid) in postings.iter().enumerate() {
            if jx > 0 {
                write!(writer, "{}", POSTING_SEPARATOR)?;
            }
            write!(writer, "{}", docid)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Writes a run to `path`
///
/// The content goes to a temporary file first which is then renamed, so
/// `path` exists only once the run is complete
pub fn write_run(path: &Path, run: &Run) -> Result<()> {
    let tmp = tmp_path(path);
    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        write_entries(&mut writer, run, path)?;
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    debug!(
        "Wrote run {} ({} terms, {} postings)",
        path.display(),
        run.len(),
        run.postings_count()
    );
    Ok(())
}

/// Parses a run; `path` is only used to report errors
pub fn parse_run<R: BufRead>(reader: R, path: &Path) -> Result<Run> {
    let mut entries: Vec<TermPostings> = Vec::new();

    for (ix, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = ix + 1;
        let line = line.trim_end_matches('\r');

        // Terms may contain the separator, document IDs may not
        let (term, postings) = line
            .rsplit_once(TERM_SEPARATOR)
            .ok_or_else(|| Error::format(path, line_number, "missing ':' separator"))?;

        if let Some((previous, _)) = entries.last() {
            if previous.as_str() >= term {
                return Err(Error::format(
                    path,
                    line_number,
                    format!("term {:?} does not follow {:?}", term, previous),
                ));
            }
        }

        let postings = if postings.is_empty() {
            Vec::new()
        } else {
            postings
                .split(POSTING_SEPARATOR)
                .map(|docid| {
                    docid.parse::<DocId>().map_err(|_| {
                        Error::format(
                            path,
                            line_number,
                            format!("invalid document ID {:?}", docid),
                        )
                    })
                })
                .collect::<Result<Vec<DocId>>>()?
        };

        entries.push((term.to_string(), postings));
    }

    Ok(Run { entries })
}

/// Reads a run file
pub fn read_run(path: &Path) -> Result<Run> {
    let file = File::open(path)?;
    let run = parse_run(BufReader::new(file), path)?;
    debug!(
        "Read run {} ({} terms, {} postings)",
        path.display(),
        run.len(),
        run.postings_count()
    );
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use temp_dir::TempDir;

    fn run(entries: &[(&str, &[DocId])]) -> Run {
        Run::from_sorted(
            entries
                .iter()
                .map(|(t, p)| (t.to_string(), p.to_vec()))
                .collect(),
        )
    }

    fn parse(text: &str) -> Result<Run> {
        parse_run(text.as_bytes(), Path::new("test.txt"))
    }

    #[test]
    fn test_invert_sorts_terms_only() {
        let mut block = Block::new();
        for (term, docid) in [("dog", 3), ("cat", 2), ("dog", 1), ("bird", 5), ("dog", 1)] {
            block.add(term, docid);
        }

        let inverted = invert(block);
        assert_eq!(
            inverted,
            run(&[("bird", &[5]), ("cat", &[2]), ("dog", &[3, 1, 1])])
        );
    }

    #[test]
    fn test_write_format() {
        let mut buffer = Vec::new();
        let r = run(&[("bird", &[2]), ("cat", &[]), ("dog", &[1, 2])]);
        write_entries(&mut buffer, &r, Path::new("test.txt")).expect("Write error");
        assert_eq!(
            String::from_utf8(buffer).expect("Not UTF-8"),
            "bird:2\ncat:\ndog:1,2\n"
        );
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let path = dir.path().join("block000000size3.txt");
        let r = run(&[
            ("a:b", &[4]),
            ("bird", &[2, 2, 9]),
            ("cat", &[]),
            ("dog", &[1, 2]),
        ]);

        write_run(&path, &r).expect("Error while writing the run");
        assert!(!tmp_path(&path).exists());
        assert_eq!(read_run(&path).expect("Error while reading the run"), r);
    }

    #[test]
    fn test_parse_errors() {
        let err = parse("cat:1\ndog 2\n").expect_err("Should fail");
        assert!(matches!(err, Error::Format { line: 2, .. }), "{}", err);

        let err = parse("cat:1,x\n").expect_err("Should fail");
        assert!(matches!(err, Error::Format { line: 1, .. }), "{}", err);

        let err = parse("cat:1,\n").expect_err("Should fail");
        assert!(matches!(err, Error::Format { line: 1, .. }), "{}", err);

        let err = parse("dog:1\ncat:2\n").expect_err("Should fail");
        assert!(matches!(err, Error::Format { line: 2, .. }), "{}", err);
    }

    #[test]
    fn test_parse_crlf() {
        assert_eq!(
            parse("cat:1\r\ndog:2,3\r\n").expect("Parse error"),
            run(&[("cat", &[1]), ("dog", &[2, 3])])
        );
    }

    #[test]
    fn test_postings_lookup() {
        let r = run(&[("bird", &[2]), ("dog", &[1, 2])]);
        assert_eq!(r.postings("dog"), Some(&[1, 2][..]));
        assert_eq!(r.postings("cat"), None);
        assert_eq!(r.postings_count(), 3);
        assert!(r.has_strict_postings());
    }

    #[test]
    fn test_dedup_postings() {
        let mut r = run(&[("cat", &[1, 1, 2, 2, 3])]);
        assert!(!r.has_strict_postings());
        r.dedup_postings();
        assert_eq!(r.postings("cat"), Some(&[1, 2, 3][..]));
    }
}
