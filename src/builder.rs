use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
    sync::Arc,
    time::Instant,
};

use derivative::Derivative;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use rayon::{iter::ParallelBridge, iter::ParallelIterator, ThreadPool, ThreadPoolBuilder};

use crate::{
    base::{
        final_index_file_name, manifest_file_name, parse_run_file_name, run_file_name,
        AbortHandle, Len, TMP_SUFFIX,
    },
    block::{Block, BlockProducer},
    documents::{open_documents, Document},
    error::{Error, Result},
    manifest::{FinalIndexInformation, Manifest, RunInformation},
    merge::MergeScheduler,
    run::{invert, write_run, Run},
    stats::{BuildReport, MemoryProbe},
    tokenizer::{Tokenizer, WhitespaceTokenizer},
};

const PROGRESS_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {pos} blocks {msg}";

#[derive(Derivative, Clone, Debug)]
#[derivative(Default)]
pub struct BuilderOptions {
    /// Number of distinct terms in a block before it is
    /// written to disk
    #[derivative(Default(value = "10000"))]
    pub block_size: usize,

    /// Document fields to index
    #[derivative(Default(value = "vec![\"Title\".to_string(), \"Abstract\".to_string()]"))]
    pub fields: Vec<String>,

    /// Number of worker threads (None or 1: sequential build)
    pub threads: Option<usize>,

    /// Show a progress spinner
    pub progress: bool,
}

impl BuilderOptions {
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(Error::Configuration(
                "block size should be positive".to_string(),
            ));
        }
        if self.fields.is_empty() {
            return Err(Error::Configuration(
                "at least one field should be indexed".to_string(),
            ));
        }
        if self.threads == Some(0) {
            return Err(Error::Configuration(
                "the number of threads should be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// The indexer consumes documents, writes one sorted run per block
/// and merges the runs into the final index
pub struct Indexer {
    folder: PathBuf,
    options: BuilderOptions,
    tokenizer: Arc<dyn Tokenizer>,
    abort: AbortHandle,
}

impl Indexer {
    pub fn new(folder: &Path, options: &BuilderOptions) -> Result<Indexer> {
        options.validate()?;
        Ok(Indexer {
            folder: folder.to_path_buf(),
            options: options.clone(),
            tokenizer: Arc::new(WhitespaceTokenizer),
            abort: AbortHandle::new(),
        })
    }

    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Handle that can be used (from any thread) to stop the build
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn final_index_path(&self) -> PathBuf {
        self.folder
            .join(final_index_file_name(self.options.block_size))
    }

    /// Builds the index from a JSON document collection
    ///
    /// The collection is opened before anything is written
    pub fn build_from_path(&self, source: &Path) -> Result<BuildReport> {
        let documents = open_documents(source)?;
        self.build(documents)
    }

    /// Builds the index from a document stream
    pub fn build<I>(&self, documents: I) -> Result<BuildReport>
    where
        I: Iterator<Item = Result<Document>> + Send,
    {
        let start = Instant::now();
        let memory = MemoryProbe::start();
        let block_size = self.options.block_size;

        self.prepare_folder()?;
        let pool = self.thread_pool()?;

        let progress = if self.options.progress {
            let progress = ProgressBar::new_spinner();
            progress.set_style(ProgressStyle::default_spinner().template(PROGRESS_TEMPLATE));
            progress
        } else {
            ProgressBar::hidden()
        };

        // Phase 1: blocks to sorted runs
        info!(
            "Building index in {} (block size {})",
            self.folder.display(),
            block_size
        );
        let documents_read = AtomicUsize::new(0);
        let documents = documents.inspect(|d| {
            if d.is_ok() {
                documents_read.fetch_add(1, Ordering::Relaxed);
            }
        });
        let producer = BlockProducer::new(
            documents,
            &self.options.fields,
            self.tokenizer.clone(),
            block_size,
        );

        let runs = match &pool {
            Some(pool) => pool.install(|| self.write_runs_parallel(producer, &progress)),
            None => self.write_runs(producer, &progress),
        }?;
        progress.finish_with_message("written");

        let mut manifest = Manifest::new(block_size, &self.options.fields);
        for run in runs {
            manifest.add_run(run);
        }
        manifest.save(&self.folder)?;
        info!(
            "Wrote {} runs from {} documents",
            manifest.runs.len(),
            documents_read.load(Ordering::Relaxed)
        );

        // Phase 2: merge
        let mut index = if manifest.runs.is_empty() {
            info!("No runs: the index is empty");
            Run::new()
        } else {
            let scheduler = MergeScheduler::new(pool.is_some(), self.abort.clone());
            let paths = manifest.run_paths(&self.folder);
            match &pool {
                Some(pool) => pool.install(|| scheduler.merge_all(&paths)),
                None => scheduler.merge_all(&paths),
            }?
        };
        // A single run is not merged with anything
        index.dedup_postings();

        self.abort.check()?;
        let final_path = self.final_index_path();
        write_run(&final_path, &index)?;

        manifest.final_index = Some(FinalIndexInformation {
            file_name: final_index_file_name(block_size),
            terms: index.len(),
            postings: index.postings_count(),
        });
        manifest.save(&self.folder)?;

        let report = BuildReport {
            block_size,
            documents: documents_read.load(Ordering::Relaxed),
            blocks: manifest.runs.len(),
            terms: index.len(),
            postings: index.postings_count(),
            elapsed: start.elapsed(),
            memory_delta: memory.delta(),
        };
        info!("Inverted index construction: {}", report);
        Ok(report)
    }

    /// Creates the working directory and removes the output of a
    /// previous build with the same block size
    fn prepare_folder(&self) -> Result<()> {
        let block_size = self.options.block_size;
        fs::create_dir_all(&self.folder)?;

        for entry in fs::read_dir(&self.folder)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            // Leftovers of an interrupted write
            let name = name
                .strip_suffix(TMP_SUFFIX)
                .and_then(|n| n.strip_suffix('.'))
                .unwrap_or(&*name);
            let stale = match parse_run_file_name(name) {
                Some((_, size)) => size == block_size,
                None => {
                    name == final_index_file_name(block_size)
                        || name == manifest_file_name(block_size)
                }
            };
            if stale {
                debug!("Removing {}", entry.path().display());
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }

    fn thread_pool(&self) -> Result<Option<ThreadPool>> {
        match self.options.threads {
            None | Some(1) => Ok(None),
            Some(n) => ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map(Some)
                .map_err(|e| Error::Configuration(e.to_string())),
        }
    }

    /// Inverts a block and writes it as a leaf run
    fn write_block(&self, sequence: usize, block: Block) -> Result<RunInformation> {
        let run = invert(block);
        let file_name = run_file_name(sequence, self.options.block_size);
        write_run(&self.folder.join(&file_name), &run)?;
        Ok(RunInformation {
            sequence,
            file_name,
            terms: run.len(),
            postings: run.postings_count(),
        })
    }

    fn write_runs<I>(
        &self,
        producer: BlockProducer<I>,
        progress: &ProgressBar,
    ) -> Result<Vec<RunInformation>>
    where
        I: Iterator<Item = Result<Document>>,
    {
        let mut runs = Vec::new();
        for (sequence, block) in producer.enumerate() {
            self.abort.check()?;
            runs.push(self.write_block(sequence, block?)?);
            progress.inc(1);
        }
        Ok(runs)
    }

    /// Blocks are still produced one at a time, but inverted and
    /// written by the worker threads
    fn write_runs_parallel<I>(
        &self,
        producer: BlockProducer<I>,
        progress: &ProgressBar,
    ) -> Result<Vec<RunInformation>>
    where
        I: Iterator<Item = Result<Document>> + Send,
    {
        producer
            .enumerate()
            .par_bridge()
            .map(|(sequence, block)| -> Result<RunInformation> {
                self.abort.check()?;
                let run = self.write_block(sequence, block?)?;
                progress.inc(1);
                Ok(run)
            })
            .collect()
    }
}
