//! ISD observation file loading.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use isd_parser::{parse_record, ObservationRecord};
use storage::ObservationStore;

/// Records accumulated per insert batch.
const BATCH_SIZE: usize = 1000;

/// Counters for one load run.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoadStats {
    pub lines: u64,
    pub parsed: u64,
    pub skipped: u64,
    pub inserted: u64,
}

impl LoadStats {
    fn merge(&mut self, other: LoadStats) {
        self.lines += other.lines;
        self.parsed += other.parsed;
        self.skipped += other.skipped;
        self.inserted += other.inserted;
    }
}

/// Load several files with bounded concurrency. A file that fails to load
/// is logged and skipped; the others still complete.
pub async fn load_files(store: &ObservationStore, files: &[PathBuf], concurrency: usize) -> LoadStats {
    let results = stream::iter(files)
        .map(|path| async move {
            match load_file(store, path).await {
                Ok(stats) => {
                    info!(
                        file = %path.display(),
                        lines = stats.lines,
                        skipped = stats.skipped,
                        "file loaded"
                    );
                    Some(stats)
                }
                Err(e) => {
                    error!(file = %path.display(), error = %e, "file load failed");
                    None
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    let mut total = LoadStats::default();
    for stats in results.into_iter().flatten() {
        total.merge(stats);
    }
    total
}

/// Load one record file, decompressing `.gz` archives transparently.
pub async fn load_file(store: &ObservationStore, path: &Path) -> Result<LoadStats> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;

    let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let mut stats = LoadStats::default();
    let mut batch: Vec<ObservationRecord> = Vec::with_capacity(BATCH_SIZE);

    for line in BufReader::new(reader).lines() {
        let line = line.with_context(|| format!("reading {}", path.display()))?;
        if line.is_empty() {
            continue;
        }
        stats.lines += 1;

        match parse_record(&line) {
            Ok(record) => {
                stats.parsed += 1;
                batch.push(record);
            }
            Err(e) => {
                stats.skipped += 1;
                warn!(file = %path.display(), line = stats.lines, error = %e, "record skipped");
            }
        }

        if batch.len() >= BATCH_SIZE {
            stats.inserted += store.insert_observations(&batch).await?;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        stats.inserted += store.insert_observations(&batch).await?;
    }

    Ok(stats)
}
