//! Batch conversion and archive packaging.
//!
//! A batch converts every item against one settings snapshot. Per-item
//! failures are recorded and the batch carries on. Successful artifacts are
//! packaged in input order into a single store-only archive.
//!
//! With the `parallel` feature the items are converted on the rayon pool;
//! results are still collected in input order.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{info, warn};

use crate::archive::{ArchiveError, ArchiveWriter};
use crate::compose::{compose, OutputArtifact};
use crate::error::ConvertError;
use crate::queue::{ImageItem, ItemId};
use crate::settings::Settings;

/// Shared flag to stop a running batch.
///
/// Items already converting finish; items not yet started are skipped.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// An item that could not be converted.
#[derive(Debug)]
pub struct ItemFailure {
    pub id: ItemId,
    pub name: String,
    pub error: ConvertError,
}

/// Overall result of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Nothing was converted and nothing failed.
    Empty,
    Complete,
    /// At least one item succeeded and at least one failed.
    PartialFailure,
    /// Every attempted item failed.
    TotalFailure,
}

/// Packaged archive ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedArchive {
    pub bytes: Vec<u8>,
    pub name: String,
}

/// Artifacts and failures of one batch, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub artifacts: Vec<OutputArtifact>,
    pub failures: Vec<ItemFailure>,
    /// True if the batch stopped before every item was attempted.
    pub cancelled: bool,
}

impl BatchReport {
    pub fn outcome(&self) -> BatchOutcome {
        match (self.artifacts.is_empty(), self.failures.is_empty()) {
            (true, true) => BatchOutcome::Empty,
            (false, true) => BatchOutcome::Complete,
            (false, false) => BatchOutcome::PartialFailure,
            (true, false) => BatchOutcome::TotalFailure,
        }
    }

    /// Package the artifacts into one archive named after `unix_millis`.
    ///
    /// Returns `Ok(None)` when there is nothing to package. Repeated entry
    /// names get a `_2`, `_3`, ... suffix before the extension.
    pub fn into_archive(self, unix_millis: u64) -> Result<Option<PackagedArchive>, ArchiveError> {
        if self.artifacts.is_empty() {
            return Ok(None);
        }

        let mut writer = ArchiveWriter::new();
        let mut used = HashSet::new();
        for artifact in &self.artifacts {
            let name = unique_name(&artifact.name, &mut used);
            writer.add_entry(&name, &artifact.bytes)?;
        }
        let bytes = writer.finish()?;
        let name = archive_name(unix_millis);
        info!("packaged {} entries into {name} ({} bytes)", self.artifacts.len(), bytes.len());
        Ok(Some(PackagedArchive { bytes, name }))
    }
}

fn unique_name(name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }
    let (stem, ext) = match name.rfind('.') {
        Some(dot) => name.split_at(dot),
        None => (name, ""),
    };
    (2u64..)
        .map(|n| format!("{stem}_{n}{ext}"))
        .find(|candidate| used.insert(candidate.clone()))
        .unwrap_or_else(|| name.to_string())
}

/// Suggested archive name, `converted_<unix-millis>.zip`.
pub fn archive_name(unix_millis: u64) -> String {
    format!("converted_{unix_millis}.zip")
}

fn convert_one(
    item: &ImageItem,
    settings: &Settings,
    cancel: Option<&CancelToken>,
) -> Option<Result<OutputArtifact, ItemFailure>> {
    if cancel.is_some_and(CancelToken::is_cancelled) {
        return None;
    }
    Some(compose(item, settings).map_err(|error| {
        warn!("Failed to convert '{}': {error}", item.display_name);
        ItemFailure {
            id: item.id,
            name: item.display_name.clone(),
            error,
        }
    }))
}

/// Convert every item with one settings snapshot.
pub fn convert_batch(
    items: &[ImageItem],
    settings: &Settings,
    cancel: Option<&CancelToken>,
) -> BatchReport {
    info!("converting {} images to {}", items.len(), settings.output.kind.mime_type());

    #[cfg(feature = "parallel")]
    let results: Vec<_> = {
        use rayon::prelude::*;
        items
            .par_iter()
            .map(|item| convert_one(item, settings, cancel))
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let results: Vec<_> = items
        .iter()
        .map_while(|item| convert_one(item, settings, cancel))
        .map(Some)
        .collect();

    let mut report = BatchReport::default();
    for result in results {
        match result {
            Some(Ok(artifact)) => report.artifacts.push(artifact),
            Some(Err(failure)) => report.failures.push(failure),
            None => report.cancelled = true,
        }
    }
    if report.artifacts.len() + report.failures.len() < items.len() {
        report.cancelled = true;
    }

    info!(
        "batch finished: {} converted, {} failed{}",
        report.artifacts.len(),
        report.failures.len(),
        if report.cancelled { ", cancelled" } else { "" }
    );
    report
}
