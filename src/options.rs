// Upload options: the per-file skip policy and the parameters of the final
// finish call, plus the JSON body that call sends.

use serde::{Deserialize, Serialize};

/// Per-file policy and the parameters sent with the final commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Never send files whose extension the server cannot read.
    pub skip_unsupported_extensions: bool,
    /// Ask the server before sending and skip files it already has.
    pub skip_duplicates: bool,
    pub finish: FinishOptions,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            skip_unsupported_extensions: true,
            skip_duplicates: true,
            finish: FinishOptions::default(),
        }
    }
}

/// How the server should ingest the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishOptions {
    /// ISO 639-1 language code used for analysis.
    pub lang: String,
    /// Read text from PDF pages that contain only images.
    pub ocr: bool,
    /// One document per page instead of one per uploaded file.
    pub split_by_page: bool,
}

impl Default for FinishOptions {
    fn default() -> Self {
        Self {
            lang: "en".into(),
            ocr: true,
            split_by_page: false,
        }
    }
}

/// JSON body of `POST /api/v1/files/finish`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FinishRequest {
    pub lang: String,
    pub ocr: bool,
    pub split_documents: bool,
}

impl From<&FinishOptions> for FinishRequest {
    fn from(options: &FinishOptions) -> Self {
        FinishRequest {
            lang: options.lang.clone(),
            ocr: options.ocr,
            split_documents: options.split_by_page,
        }
    }
}
