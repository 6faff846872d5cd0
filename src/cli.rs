use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::chunking::ChunkConfig;

#[derive(Parser, Debug)]
#[command(
    name = "govchunk",
    version,
    about = "Section-aware chunking of governance documents for retrieval indexes"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Ingest(IngestArgs),
    Chunk(ChunkArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ChunkingArgs {
    #[arg(long, default_value_t = 1200)]
    pub max_chars: usize,

    #[arg(long, default_value_t = 250)]
    pub min_chars: usize,

    #[arg(long, default_value_t = 1)]
    pub overlap_sentences: usize,
}

impl ChunkingArgs {
    pub fn to_config(&self) -> ChunkConfig {
        ChunkConfig {
            max_chars: self.max_chars,
            min_chars: self.min_chars,
            overlap_sentences: self.overlap_sentences,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    #[arg(long, default_value = ".cache/govchunk")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    #[arg(long, default_value = ".cache/govchunk")]
    pub cache_root: PathBuf,

    #[arg(long, env = "PROJECT_ID", default_value = "orion")]
    pub project_id: String,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, env = "GOVCHUNK_BUCKET_ROOT")]
    pub bucket_root: Option<PathBuf>,

    #[arg(long)]
    pub acl_path: Option<PathBuf>,

    #[arg(long)]
    pub inventory_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub ingest_manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub refresh_inventory: bool,

    #[command(flatten)]
    pub chunking: ChunkingArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ChunkArgs {
    #[arg(long)]
    pub pages_path: PathBuf,

    #[arg(long)]
    pub doc_id: String,

    #[arg(long)]
    pub output_path: Option<PathBuf>,

    #[command(flatten)]
    pub chunking: ChunkingArgs,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/govchunk")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}
