// Files considered for upload: their server-visible names, the local
// filtering rules, and the byte sources the pipeline reads from.

use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{Result, UploadError};
use crate::fingerprint::{fingerprint, fingerprint_bytes};

/// Extensions the server cannot ingest (compared case-insensitively).
pub const UNSUPPORTED_EXTENSIONS: &[&str] = &["zip", "msg", "gif", "jpg", "png", "tiff", "tif", "dbf"];

/// True when `name` ends in one of [`UNSUPPORTED_EXTENSIONS`].
pub fn is_unsupported_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            UNSUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// True when any component of `relative` starts with a dot (`.DS_Store`,
/// `.git/config`, ...). `.` and `..` components don't count.
pub fn is_hidden(relative: &Path) -> bool {
    relative.components().any(|c| match c {
        Component::Normal(part) => part.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

/// The name the server shows for a file at `relative` below the upload root:
/// components joined with `/`, `.` components dropped.
pub fn server_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Name used when a single file is uploaded on its own.
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| server_name(path))
}

pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// Where a candidate's bytes come from.
pub enum FileSource {
    /// A local file. Opened once to hash, then again to send.
    Path(PathBuf),
    /// Rewound after hashing; measured by seeking when no length is given.
    /// Read from its current position.
    Seekable(Box<dyn ReadSeek>),
    /// Readable once. Buffered in memory if it has to be both hashed and
    /// sent, or if its length is unknown.
    OneShot(Box<dyn Read + Send>),
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            FileSource::Seekable(_) => f.write_str("Seekable(..)"),
            FileSource::OneShot(_) => f.write_str("OneShot(..)"),
        }
    }
}

/// Request body for one upload: exactly `len` bytes read from `reader`.
pub struct UploadBody {
    pub reader: Box<dyn Read + Send>,
    pub len: u64,
}

impl fmt::Debug for UploadBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadBody").field("len", &self.len).finish()
    }
}

/// A single file on its way through the upload pipeline.
#[derive(Debug)]
pub struct Candidate {
    pub name: String,
    pub source: FileSource,
    /// Exact byte length, if the caller already knows it.
    pub len: Option<u64>,
    /// Precomputed fingerprint; skips hashing in the duplicate check.
    pub sha1: Option<String>,
}

impl Candidate {
    pub fn from_path(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self::new(name, FileSource::Path(path.into()))
    }

    pub fn seekable<R: Read + Seek + Send + 'static>(reader: R, name: impl Into<String>) -> Self {
        Self::new(name, FileSource::Seekable(Box::new(reader)))
    }

    pub fn one_shot<R: Read + Send + 'static>(reader: R, name: impl Into<String>) -> Self {
        Self::new(name, FileSource::OneShot(Box::new(reader)))
    }

    fn new(name: impl Into<String>, source: FileSource) -> Self {
        Self {
            name: name.into(),
            source,
            len: None,
            sha1: None,
        }
    }

    pub fn with_len(mut self, len: u64) -> Self {
        self.len = Some(len);
        self
    }

    pub fn with_sha1(mut self, sha1: impl Into<String>) -> Self {
        self.sha1 = Some(sha1.into());
        self
    }
}

impl FileSource {
    /// Hash the source and hand back one that still yields every byte.
    pub(crate) fn fingerprint(self, name: &str) -> Result<(String, FileSource)> {
        match self {
            FileSource::Path(path) => {
                let mut file = File::open(&path).map_err(|e| UploadError::io(&path, e))?;
                let sha1 = fingerprint(&mut file).map_err(|e| UploadError::io(&path, e))?;
                Ok((sha1, FileSource::Path(path)))
            }
            FileSource::Seekable(mut reader) => {
                let start = reader
                    .stream_position()
                    .map_err(|e| UploadError::io(name, e))?;
                let sha1 = fingerprint(&mut reader).map_err(|e| UploadError::io(name, e))?;
                reader
                    .seek(SeekFrom::Start(start))
                    .map_err(|e| UploadError::io(name, e))?;
                Ok((sha1, FileSource::Seekable(reader)))
            }
            FileSource::OneShot(reader) => {
                let buffer = buffer_all(reader, name)?;
                let sha1 = fingerprint_bytes(&buffer);
                Ok((sha1, FileSource::Seekable(Box::new(Cursor::new(buffer)))))
            }
        }
    }

    /// Open the source for sending, resolving its length if `len` is `None`.
    pub(crate) fn into_body(self, len: Option<u64>, name: &str) -> Result<UploadBody> {
        match self {
            FileSource::Path(path) => {
                let file = File::open(&path).map_err(|e| UploadError::io(&path, e))?;
                let len = match len {
                    Some(len) => len,
                    None => file.metadata().map_err(|e| UploadError::io(&path, e))?.len(),
                };
                Ok(UploadBody {
                    reader: Box::new(file),
                    len,
                })
            }
            FileSource::Seekable(mut reader) => {
                let len = match len {
                    Some(len) => len,
                    None => remaining_len(&mut reader).map_err(|e| UploadError::io(name, e))?,
                };
                Ok(UploadBody {
                    reader: Box::new(reader),
                    len,
                })
            }
            FileSource::OneShot(reader) => match len {
                Some(len) => Ok(UploadBody { reader, len }),
                None => {
                    let buffer = buffer_all(reader, name)?;
                    Ok(UploadBody {
                        len: buffer.len() as u64,
                        reader: Box::new(Cursor::new(buffer)),
                    })
                }
            },
        }
    }
}

fn remaining_len(reader: &mut Box<dyn ReadSeek>) -> std::io::Result<u64> {
    let start = reader.stream_position()?;
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(start))?;
    Ok(end.saturating_sub(start))
}

// The whole stream ends up in memory here.
fn buffer_all(mut reader: Box<dyn Read + Send>, name: &str) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    reader
        .read_to_end(&mut buffer)
        .map_err(|e| UploadError::io(name, e))?;
    debug!("Buffered {} ({} bytes) in memory", name, buffer.len());
    Ok(buffer)
}
