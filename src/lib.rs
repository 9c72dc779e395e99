// Library root
// -----------
// Uploads local files to an Overview server: each file is checked against
// the document set (by SHA-1) and streamed up, then the batch is finished
// so the server starts ingesting it.
//
// Module responsibilities:
// - `session`: the per-file pipeline, directory runs and the finish call.
// - `candidate`: server-visible names, hidden/unsupported filtering and the
//   byte sources files are read from.
// - `fingerprint`: chunked SHA-1 of a stream.
// - `api`: the blocking HTTP client implementing `session::Transport`.
// - `disposition`: `Content-Disposition` values for uploaded filenames.
// - `config` and `ui`: the command line front end.
pub mod api;
pub mod candidate;
pub mod config;
pub mod disposition;
pub mod error;
pub mod fingerprint;
pub mod options;
pub mod session;
pub mod ui;

pub use api::OverviewClient;
pub use candidate::{Candidate, FileSource};
pub use error::{Result, UploadError};
pub use options::{FinishOptions, UploadOptions};
pub use session::{DirectoryReport, FileReport, SendOutcome, Session, Transport};
