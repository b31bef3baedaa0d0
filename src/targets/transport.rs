//! Delivery of processed documents
//!
//! The engine never talks to a server itself. [`Transport`] receives the apply
//! path, a content type and the payload; the CLI ships [`DirectoryTransport`],
//! which stores every payload as a numbered file for offline inspection or
//! later upload.

use crate::utils::{atomic_write, ensure_dir};
use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::info;

/// Content type of a plain rendered document
pub const CONTENT_TYPE_YAML: &str = "text/vnd.yaml";

/// Content type of an artifact bundle
pub const CONTENT_TYPE_ZIP: &str = "application/zip";

/// Sends a payload to a target system
pub trait Transport {
    /// Delivers `body` to the target endpoint `path`.
    fn send(&mut self, path: &str, content_type: &str, body: &[u8]) -> anyhow::Result<()>;
}

/// Writes each payload to `<dir>/<nnn>-<endpoint>.<yaml|zip>`
#[derive(Debug)]
pub struct DirectoryTransport {
    dir: PathBuf,
    sent: usize,
}

impl DirectoryTransport {
    /// Creates a transport writing into `dir`, created on first send.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            sent: 0,
        }
    }

    /// Output directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of payloads written so far
    pub fn sent(&self) -> usize {
        self.sent
    }
}

impl Transport for DirectoryTransport {
    fn send(&mut self, path: &str, content_type: &str, body: &[u8]) -> anyhow::Result<()> {
        ensure_dir(&self.dir)?;

        let extension = if content_type == CONTENT_TYPE_ZIP { "zip" } else { "yaml" };
        let endpoint = path.replace('/', "_");
        self.sent += 1;
        let file = self.dir.join(format!("{:03}-{endpoint}.{extension}", self.sent));

        atomic_write(&file, body).with_context(|| format!("writing payload for {path}"))?;
        info!("Wrote {} payload to {}", content_type, file.display());
        Ok(())
    }
}
