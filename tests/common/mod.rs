#![allow(dead_code)]

use overview_upload::candidate::UploadBody;
use overview_upload::options::FinishRequest;
use overview_upload::{Transport, UploadError};
use reqwest::StatusCode;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;
use uuid::Uuid;

/// A service call as seen by the fake.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ClearPending,
    FileExists(String),
    Upload {
        handle: Uuid,
        disposition: String,
        len: u64,
        bytes: Vec<u8>,
    },
    Finish(FinishRequest),
}

/// In-memory stand-in for the ingestion service that records every call.
#[derive(Default)]
pub struct FakeTransport {
    pub calls: RefCell<Vec<Call>>,
    /// Fingerprints the "document set" already holds.
    pub existing: HashSet<String>,
    /// Fail the n-th duplicate check (1-based).
    pub fail_exists_on: Option<usize>,
    /// Answer every upload with a server error.
    pub fail_uploads: bool,
    pub exists_calls: Cell<usize>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing(sha1: &str) -> Self {
        let mut fake = Self::default();
        fake.existing.insert(sha1.to_string());
        fake
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn uploads(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Upload { .. }))
            .collect()
    }

    pub fn finishes(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Finish(_)))
            .count()
    }
}

fn server_error(operation: &'static str) -> UploadError {
    UploadError::Status {
        operation,
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: "boom".into(),
    }
}

impl Transport for FakeTransport {
    fn clear_pending(&self) -> overview_upload::Result<()> {
        self.calls.borrow_mut().push(Call::ClearPending);
        Ok(())
    }

    fn file_exists(&self, sha1: &str) -> overview_upload::Result<bool> {
        self.calls.borrow_mut().push(Call::FileExists(sha1.to_string()));
        let n = self.exists_calls.get() + 1;
        self.exists_calls.set(n);
        if self.fail_exists_on == Some(n) {
            return Err(server_error("Duplicate check"));
        }
        Ok(self.existing.contains(sha1))
    }

    fn upload(
        &self,
        handle: Uuid,
        content_disposition: &str,
        mut body: UploadBody,
    ) -> overview_upload::Result<()> {
        let mut bytes = Vec::new();
        body.reader.read_to_end(&mut bytes).expect("readable body");
        self.calls.borrow_mut().push(Call::Upload {
            handle,
            disposition: content_disposition.to_string(),
            len: body.len,
            bytes,
        });
        if self.fail_uploads {
            return Err(server_error("Upload"));
        }
        Ok(())
    }

    fn finish(&self, request: &FinishRequest) -> overview_upload::Result<()> {
        self.calls.borrow_mut().push(Call::Finish(request.clone()));
        Ok(())
    }
}

pub fn setup_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Write `len` bytes derived from `seed` to `dir/relative`, creating parents.
pub fn write_file(dir: &Path, relative: &str, len: usize, seed: u8) -> Vec<u8> {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dirs");
    }
    let bytes: Vec<u8> = (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect();
    std::fs::write(&path, &bytes).expect("write test file");
    bytes
}
