// src/batch/writer.rs
//! Append-only JSON array writer shared by all row tasks.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::enrich::ProfileEntry;

/// How `append` decides whether an element needs the leading `",\n"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeparatorPolicy {
    /// First element = first write that wins the lock. Caller hint ignored.
    #[default]
    WriteOrder,
    /// Trust the caller's `is_first_in_file` (row index 0). Rows finishing out
    /// of order can produce a missing or extra separator.
    RowIndex,
}

struct Inner<W> {
    out: W,
    written: usize,
}

pub struct OutputWriter<W = File> {
    inner: Mutex<Inner<W>>,
    policy: SeparatorPolicy,
}

impl OutputWriter<File> {
    /// Truncate/create `path` and write the opening bracket.
    pub async fn create(path: &Path, policy: SeparatorPolicy) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating output dir {}", dir.display()))?;
        }
        let file = File::create(path)
            .await
            .with_context(|| format!("creating output file {}", path.display()))?;
        Self::open(file, policy).await
    }
}

impl<W: AsyncWrite + Unpin + Send> OutputWriter<W> {
    /// Wrap any sink and write the opening bracket.
    pub async fn open(mut out: W, policy: SeparatorPolicy) -> Result<Self> {
        out.write_all(b"[\n")
            .await
            .context("writing opening bracket")?;
        Ok(Self {
            inner: Mutex::new(Inner { out, written: 0 }),
            policy,
        })
    }

    pub fn policy(&self) -> SeparatorPolicy {
        self.policy
    }

    /// Serialize `entry` and append it as the next array element.
    /// The lock covers separator and body, and is released on every path.
    pub async fn append(&self, entry: &ProfileEntry, is_first_in_file: bool) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let body = serde_json::to_string_pretty(entry).context("serializing profile")?;
        let first = match self.policy {
            SeparatorPolicy::WriteOrder => inner.written == 0,
            SeparatorPolicy::RowIndex => is_first_in_file,
        };
        let mut buf = String::with_capacity(body.len() + 2);
        if !first {
            buf.push_str(",\n");
        }
        buf.push_str(&body);
        inner
            .out
            .write_all(buf.as_bytes())
            .await
            .context("appending profile to output")?;
        inner.written += 1;
        Ok(())
    }

    /// Elements appended so far.
    pub async fn written(&self) -> usize {
        self.inner.lock().await.written
    }

    /// Write the closing bracket and flush. Returns the element count.
    pub async fn finish(&self) -> Result<usize> {
        let mut inner = self.inner.lock().await;
        inner
            .out
            .write_all(b"\n]\n")
            .await
            .context("writing closing bracket")?;
        inner.out.flush().await.context("flushing output")?;
        Ok(inner.written)
    }
}
