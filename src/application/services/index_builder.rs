use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::application::dtos::{BuildReport, FileFailure};
use crate::domain::{DomainError, NormalizedDocument, Record};

use super::chunker::TextChunker;
use super::normalizer::normalize;
use super::vector_index::VectorIndex;

const LOG_TARGET: &str = "assembly_rag::build";

/// Turns a directory of meeting-minute records into indexed chunks.
pub struct IndexBuilder {
    index: Arc<VectorIndex>,
    chunker: TextChunker,
    batch_size: usize,
}

impl IndexBuilder {
    pub fn new(index: Arc<VectorIndex>, chunker: TextChunker, batch_size: usize) -> Self {
        Self {
            index,
            chunker,
            batch_size: batch_size.max(1),
        }
    }

    /// Drop every entry currently in the index.
    pub fn clear(&self) -> Result<(), DomainError> {
        self.index.clear()?;
        info!(target: LOG_TARGET, "cleared existing index entries");
        Ok(())
    }

    /// Parse, normalize, chunk and commit every `*.json` file directly under `dir`.
    ///
    /// Only a missing input directory is fatal. Bad files and failed batches
    /// are logged, recorded in the report and skipped.
    pub fn build(&self, dir: impl AsRef<Path>) -> Result<BuildReport, DomainError> {
        let dir = dir.as_ref();
        let files = list_record_files(dir)?;
        let mut report = BuildReport {
            files_seen: files.len(),
            ..BuildReport::default()
        };

        if files.is_empty() {
            warn!(target: LOG_TARGET, dir = %dir.display(), "no record files found");
            return Ok(report);
        }
        info!(target: LOG_TARGET, files = files.len(), dir = %dir.display(), "loading records");

        let mut documents = Vec::with_capacity(files.len());
        for path in files {
            match load_document(&path) {
                Ok(document) => documents.push(document),
                Err(err) => {
                    error!(target: LOG_TARGET, path = %path.display(), error = %err, "skipping record file");
                    report.failed_files.push(FileFailure {
                        path,
                        error: err.to_string(),
                    });
                }
            }
        }
        report.documents_processed = documents.len();

        if documents.is_empty() {
            warn!(target: LOG_TARGET, "no documents could be parsed; nothing to index");
            return Ok(report);
        }

        let chunks = self.chunker.split_documents(&documents);
        report.chunks_total = chunks.len();
        info!(
            target: LOG_TARGET,
            documents = documents.len(),
            chunks = chunks.len(),
            chunk_size = self.chunker.chunk_size(),
            chunk_overlap = self.chunker.chunk_overlap(),
            model = self.index.embedding_model(),
            "documents split into chunks"
        );

        let batch_count = chunks.len().div_ceil(self.batch_size);
        let mut processed = 0;
        for (position, batch) in chunks.chunks(self.batch_size).enumerate() {
            let batch_number = position + 1;
            match self.index.upsert(batch) {
                Ok(stored) => {
                    report.batches_committed += 1;
                    report.chunks_indexed += stored;
                }
                Err(err) => {
                    error!(
                        target: LOG_TARGET,
                        batch = batch_number,
                        error = %err,
                        "batch failed to commit"
                    );
                    report.failed_batches.push(batch_number);
                }
            }
            processed += batch.len();
            info!(
                target: LOG_TARGET,
                "batch {batch_number}/{batch_count}, chunks processed {processed}/{}",
                chunks.len()
            );
        }

        info!(
            target: LOG_TARGET,
            documents = report.documents_processed,
            failed_files = report.failed_files.len(),
            chunks_indexed = report.chunks_indexed,
            failed_batches = report.failed_batches.len(),
            "index build finished"
        );
        Ok(report)
    }
}

fn list_record_files(dir: &Path) -> Result<Vec<PathBuf>, DomainError> {
    if !dir.is_dir() {
        return Err(DomainError::input_not_found(format!(
            "{} is not a readable directory",
            dir.display()
        )));
    }

    let entries = fs::read_dir(dir).map_err(|err| {
        DomainError::input_not_found(format!("failed to read {}: {err}", dir.display()))
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

fn load_document(path: &Path) -> Result<NormalizedDocument, DomainError> {
    let bytes = fs::read(path)
        .map_err(|err| DomainError::parse(format!("failed to read file: {err}")))?;
    let record = Record::from_json_slice(&bytes)?;
    Ok(normalize(&record))
}
