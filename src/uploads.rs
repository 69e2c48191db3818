//! Flat on-disk store for uploaded images.
//!
//! A batch is accepted or rejected as a whole: every name is checked before
//! the first byte is written.

use axum::body::Bytes;
use std::path::{Path, PathBuf};

use crate::constants::ALLOWED_EXTENSIONS;
use crate::error::Result;
use crate::security::{content_digest, sanitize_filename};

/// One file from a multipart batch, name as sent by the client
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub filename: String,
    pub data: Bytes,
}

/// A file that passed the name checks and is ready to be written
#[derive(Debug, Clone)]
pub struct AcceptedFile {
    pub name: String,
    data: Bytes,
}

/// True when the name has an extension from the image allow-list
pub fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}

/// Sanitize and check every name; `None` if any file fails
pub fn accept_batch(files: Vec<IncomingFile>) -> Option<Vec<AcceptedFile>> {
    files
        .into_iter()
        .map(|file| {
            let name = sanitize_filename(&file.filename);
            if name.is_empty() || !allowed_file(&file.filename) || !allowed_file(&name) {
                tracing::warn!("Rejected upload: {:?}", file.filename);
                return None;
            }
            Some(AcceptedFile {
                name,
                data: file.data,
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write an accepted batch, returning the stored names in order
    ///
    /// A name already holding different content gets the first 8 hex digits
    /// of the new file's SHA-256 as a prefix. Identical content reuses the
    /// existing file.
    pub async fn store_batch(&self, files: Vec<AcceptedFile>) -> Result<Vec<String>> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            let name = self.store_one(&file).await?;
            stored.push(name);
        }

        Ok(stored)
    }

    async fn store_one(&self, file: &AcceptedFile) -> Result<String> {
        let digest = content_digest(&file.data);
        let mut name = file.name.clone();

        if let Some(existing) = self.existing_digest(&name).await? {
            if existing == digest {
                tracing::info!("Upload {} already stored", name);
                return Ok(name);
            }
            name = format!("{}_{}", &digest[..8], file.name);
        }

        tokio::fs::write(self.dir.join(&name), &file.data).await?;
        tracing::info!("Stored upload {} ({} bytes)", name, file.data.len());

        Ok(name)
    }

    async fn existing_digest(&self, name: &str) -> Result<Option<String>> {
        match tokio::fs::read(self.dir.join(name)).await {
            Ok(data) => Ok(Some(content_digest(&data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
