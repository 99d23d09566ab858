use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use bsbi_index::base::BoxResult;
use bsbi_index::builder::{BuilderOptions, Indexer};
use bsbi_index::index::FinalIndex;
use bsbi_index::tokenizer::{AlphabeticTokenizer, Tokenizer, WhitespaceTokenizer};

#[derive(Parser)]
#[command(name = "bsbi", version, about = "Blocked sort-based indexing")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum TokenizerKind {
    /// Split on whitespace
    Whitespace,
    /// Lower-cased runs of letters
    Alphabetic,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index (one per block size)
    Build {
        /// Document collection (JSON array or JSON lines)
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for the runs and the final index
        #[arg(short, long)]
        workdir: PathBuf,

        /// Maximum number of distinct terms per block
        #[arg(short, long = "block-size", default_values_t = [10000])]
        block_sizes: Vec<usize>,

        /// Fields to index
        #[arg(short, long = "field", default_values_t = ["Title".to_string(), "Abstract".to_string()])]
        fields: Vec<String>,

        /// Worker threads
        #[arg(short, long)]
        threads: Option<usize>,

        #[arg(long, value_enum, default_value_t = TokenizerKind::Whitespace)]
        tokenizer: TokenizerKind,
    },

    /// Print the postings of terms
    Lookup {
        #[arg(short, long)]
        workdir: PathBuf,

        #[arg(short, long = "block-size", default_value_t = 10000)]
        block_size: usize,

        terms: Vec<String>,
    },
}

fn main() -> BoxResult<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            workdir,
            block_sizes,
            fields,
            threads,
            tokenizer,
        } => {
            let tokenizer: Arc<dyn Tokenizer> = match tokenizer {
                TokenizerKind::Whitespace => Arc::new(WhitespaceTokenizer),
                TokenizerKind::Alphabetic => Arc::new(AlphabeticTokenizer),
            };
            for block_size in block_sizes {
                let options = BuilderOptions {
                    block_size,
                    fields: fields.clone(),
                    threads,
                    progress: true,
                };
                let indexer = Indexer::new(&workdir, &options)?.with_tokenizer(tokenizer.clone());
                let report = indexer.build_from_path(&input)?;
                info!(
                    "{} documents, {} blocks, {} terms, {} postings",
                    report.documents, report.blocks, report.terms, report.postings
                );
                println!("{}", report);
            }
        }
        Commands::Lookup {
            workdir,
            block_size,
            terms,
        } => {
            let index = FinalIndex::open(&workdir, block_size)?;
            for term in terms {
                let postings: Vec<String> =
                    index.postings(&term).iter().map(|d| d.to_string()).collect();
                println!(
                    "{} -> df: {} | docs: {}",
                    term,
                    postings.len(),
                    postings.join(", ")
                );
            }
        }
    }

    Ok(())
}
