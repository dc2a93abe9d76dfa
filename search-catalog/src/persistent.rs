use crate::MemoryCatalog;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
    thread::available_parallelism,
    time::Instant,
};
use tracing::info;
use typed_num::Num;

const CATALOG_VERSION: i64 = 1;

#[derive(Serialize)]
struct PersistentStorageRef<'a> {
    version: Num<CATALOG_VERSION>,
    catalog: &'a MemoryCatalog,
}

#[derive(Deserialize)]
struct PersistentStorage {
    #[allow(dead_code)]
    version: Num<CATALOG_VERSION>,
    catalog: MemoryCatalog,
}

/// Loads a catalog written by [`write_catalog_to_file`]. Files from another
/// format version are rejected.
pub fn read_catalog_from_file(path: &Path) -> Result<MemoryCatalog> {
    let cache_decode_time = Instant::now();
    let input = File::open(path).context("Failed to open catalog cache")?;
    let input = zstd::Decoder::new(input).context("Failed to create zstd decoder")?;
    let mut bytes = Vec::new();
    BufReader::new(input)
        .read_to_end(&mut bytes)
        .context("Failed to decompress catalog cache")?;
    let storage: PersistentStorage =
        postcard::from_bytes(&bytes).context("Failed to decode catalog cache")?;
    let mut catalog = storage.catalog;
    catalog.reindex();
    info!("Catalog decode time: {:?}", cache_decode_time.elapsed());
    Ok(catalog)
}

pub fn write_catalog_to_file(path: &Path, catalog: &MemoryCatalog) -> Result<()> {
    let cache_encode_time = Instant::now();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create catalog cache directory")?;
    }
    let tmp_path = &path.with_extension("cctmp");
    {
        let output = File::create(tmp_path).context("Failed to create catalog cache")?;
        let mut output = zstd::Encoder::new(output, 6).context("Failed to create zstd encoder")?;
        output
            .multithread(available_parallelism().map(|x| x.get() as u32).unwrap_or(4))
            .context("Failed to create parallel zstd encoder")?;
        let output = output.auto_finish();
        let output = BufWriter::new(output);
        let mut output = postcard::to_io(
            &PersistentStorageRef {
                version: Num,
                catalog,
            },
            output,
        )
        .context("Failed to encode catalog cache")?;
        output.flush().context("Failed to flush catalog cache")?;
    }
    fs::rename(tmp_path, path).context("Failed to rename catalog cache")?;
    info!("Catalog encode time: {:?}", cache_encode_time.elapsed());
    info!(
        "Catalog cache size: {} KB",
        fs::metadata(path)
            .context("Failed to get catalog cache metadata")?
            .len() as f32
            / 1024.
    );
    Ok(())
}
