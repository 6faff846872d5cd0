use anyhow::{Context, Result};
use tracing::info;

use crate::chunking::{Chunker, Page};
use crate::cli::ChunkArgs;
use crate::util::{read_json, write_json_pretty};

/// Chunks a pages file (`[{"page": 1, "text": "..."}]`) without touching
/// any store.
pub fn run(args: ChunkArgs) -> Result<()> {
    let pages: Vec<Page> = read_json(&args.pages_path)?;
    let chunker = Chunker::new(args.chunking.to_config())?;
    let chunks = chunker.chunk_pages(&args.doc_id, &pages);

    info!(
        doc_id = %args.doc_id,
        pages = pages.len(),
        chunks = chunks.len(),
        "chunked pages"
    );

    match &args.output_path {
        Some(path) => {
            write_json_pretty(path, &chunks)?;
            info!(path = %path.display(), "wrote chunks");
        }
        None => {
            let rendered =
                serde_json::to_string_pretty(&chunks).context("failed to serialize chunks")?;
            println!("{rendered}");
        }
    }

    Ok(())
}
