// Upload sessions.
//
// A `Session` runs every candidate file through the same pipeline:
//
// 1. extension gate (local, no network)
// 2. duplicate check against the document set, by SHA-1
// 3. length resolution
// 4. one `POST` under a fresh random handle
//
// and counts the files that made it to the server. `Session::finish` only
// talks to the server when that count is non-zero.

use std::path::Path;

use tracing::{info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::candidate::{
    base_name, is_hidden, is_unsupported_extension, server_name, Candidate, UploadBody,
};
use crate::disposition::content_disposition;
use crate::error::{Result, UploadError};
use crate::options::{FinishRequest, UploadOptions};

/// The service calls a session needs. Implemented over HTTP by
/// [`OverviewClient`](crate::api::OverviewClient).
pub trait Transport {
    /// Delete every pending (never finished) upload for this credential.
    fn clear_pending(&self) -> Result<()>;

    /// Whether the document set already holds a file with this fingerprint.
    fn file_exists(&self, sha1: &str) -> Result<bool>;

    /// Store one file's bytes under `handle`.
    fn upload(&self, handle: Uuid, content_disposition: &str, body: UploadBody) -> Result<()>;

    /// Ingest all pending uploads into the document set.
    fn finish(&self, request: &FinishRequest) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn clear_pending(&self) -> Result<()> {
        (**self).clear_pending()
    }

    fn file_exists(&self, sha1: &str) -> Result<bool> {
        (**self).file_exists(sha1)
    }

    fn upload(&self, handle: Uuid, content_disposition: &str, body: UploadBody) -> Result<()> {
        (**self).upload(handle, content_disposition, body)
    }

    fn finish(&self, request: &FinishRequest) -> Result<()> {
        (**self).finish(request)
    }
}

/// What happened to one candidate that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Uploaded { handle: Uuid },
    SkippedUnsupported,
    SkippedDuplicate,
}

impl SendOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, SendOutcome::Uploaded { .. })
    }
}

/// One file seen during a directory run.
#[derive(Debug)]
pub struct FileReport {
    pub name: String,
    pub result: Result<SendOutcome>,
}

/// Every file seen during a directory run, in traversal order.
#[derive(Debug, Default)]
pub struct DirectoryReport {
    pub entries: Vec<FileReport>,
}

impl DirectoryReport {
    pub fn uploaded(&self) -> usize {
        self.count(|r| matches!(r, Ok(o) if o.is_uploaded()))
    }

    pub fn skipped(&self) -> usize {
        self.count(|r| matches!(r, Ok(o) if !o.is_uploaded()))
    }

    pub fn failed(&self) -> usize {
        self.count(|r| r.is_err())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &UploadError)> {
        self.entries.iter().filter_map(|e| match &e.result {
            Err(err) => Some((e.name.as_str(), err)),
            Ok(_) => None,
        })
    }

    fn count(&self, pred: impl Fn(&Result<SendOutcome>) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.result)).count()
    }
}

/// One upload run against one document set.
pub struct Session<T: Transport> {
    transport: T,
    options: UploadOptions,
    uploaded: usize,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, options: UploadOptions) -> Self {
        Self {
            transport,
            options,
            uploaded: 0,
        }
    }

    /// Files sent successfully so far. Never decreases.
    pub fn uploaded(&self) -> usize {
        self.uploaded
    }

    pub fn options(&self) -> &UploadOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Remove files a previous run sent but never finished. Call this before
    /// the first send; otherwise `finish` may ingest those leftovers too.
    pub fn clear_previous_uploads(&self) -> Result<()> {
        info!("Clearing previous uploads");
        self.transport.clear_pending()
    }

    /// Run one candidate through the pipeline.
    pub fn send(&mut self, candidate: Candidate) -> Result<SendOutcome> {
        let Candidate {
            name,
            mut source,
            len,
            sha1,
        } = candidate;

        if self.options.skip_unsupported_extensions && is_unsupported_extension(&name) {
            info!("Skipping {}, unsupported format", name);
            return Ok(SendOutcome::SkippedUnsupported);
        }

        if self.options.skip_duplicates {
            let sha1 = match sha1 {
                Some(sha1) => sha1,
                None => {
                    let (sha1, rewound) = source.fingerprint(&name)?;
                    source = rewound;
                    sha1
                }
            };
            if self.transport.file_exists(&sha1)? {
                info!("Skipping {}, already on server", name);
                return Ok(SendOutcome::SkippedDuplicate);
            }
        }

        let body = source.into_body(len, &name)?;
        let handle = Uuid::new_v4();
        info!("Uploading {} ({} bytes)", name, body.len);
        self.transport
            .upload(handle, &content_disposition(&name), body)?;

        self.uploaded += 1;
        Ok(SendOutcome::Uploaded { handle })
    }

    /// Send a single local file under its base name. Errors propagate.
    pub fn send_file(&mut self, path: &Path) -> Result<SendOutcome> {
        let name = base_name(path);
        self.send(Candidate::from_path(path, name))
    }

    /// Send every non-hidden regular file below `root`, one at a time.
    /// A failing file is reported and the walk goes on.
    pub fn send_directory(&mut self, root: &Path) -> DirectoryReport {
        self.send_directory_with(root, |_| {})
    }

    /// [`send_directory`](Self::send_directory), calling `on_file` after each file.
    pub fn send_directory_with<F>(&mut self, root: &Path, mut on_file: F) -> DirectoryReport
    where
        F: FnMut(&FileReport),
    {
        let mut report = DirectoryReport::default();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

        for entry in walker {
            let file = match entry {
                Ok(entry) => {
                    // Links to files count; links to directories are not entered.
                    if !entry.path().is_file() {
                        continue;
                    }
                    let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
                    if is_hidden(relative) {
                        continue;
                    }
                    let mut name = server_name(relative);
                    if name.is_empty() {
                        name = base_name(entry.path());
                    }
                    let result = self.send(Candidate::from_path(entry.path(), name.clone()));
                    FileReport { name, result }
                }
                Err(err) => {
                    let name = err
                        .path()
                        .map(|p| server_name(p.strip_prefix(root).unwrap_or(p)))
                        .unwrap_or_default();
                    FileReport {
                        name,
                        result: Err(UploadError::from(err)),
                    }
                }
            };

            if let Err(err) = &file.result {
                warn!("Error, skipping {}: {}", file.name, err);
            }
            on_file(&file);
            report.entries.push(file);
        }

        report
    }

    /// Ask the server to ingest everything sent in this session. Returns
    /// `false` without any request when nothing was uploaded.
    pub fn finish(&self) -> Result<bool> {
        if self.uploaded == 0 {
            info!("No files uploaded, not finishing");
            return Ok(false);
        }

        info!("Finishing {} uploaded files", self.uploaded);
        self.transport
            .finish(&FinishRequest::from(&self.options.finish))?;
        Ok(true)
    }
}
