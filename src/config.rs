// Command line definition. Values may also come from the environment so the
// token does not have to appear in shell history.

use clap::Parser;
use std::path::PathBuf;

use crate::api::{API_TOKEN_ENV, DEFAULT_SERVER_URL, SERVER_URL_ENV};
use crate::options::{FinishOptions, UploadOptions};

#[derive(Parser, Debug)]
#[command(name = "overview-upload", version)]
#[command(about = "Upload a file or directory to an Overview server")]
pub struct Cli {
    #[arg(help = "File or directory to upload")]
    pub path: PathBuf,

    /// API token corresponding to the document set
    #[arg(short, long, env = API_TOKEN_ENV, hide_env_values = true)]
    pub token: Option<String>,

    /// URL of the Overview server
    #[arg(short, long, env = SERVER_URL_ENV, default_value = DEFAULT_SERVER_URL)]
    pub server: String,

    /// Don't skip files already on the server
    #[arg(short, long)]
    pub noskip: bool,

    /// Send files even if Overview cannot read their format
    #[arg(long)]
    pub include_unsupported: bool,

    /// Delete unfinished uploads from earlier runs before sending
    #[arg(long)]
    pub clear: bool,

    /// Document language (ISO 639-1)
    #[arg(long, default_value = "en")]
    pub lang: String,

    /// Don't OCR pages that contain only images
    #[arg(long)]
    pub no_ocr: bool,

    /// Create one document per page instead of one per file
    #[arg(long)]
    pub split_by_page: bool,

    /// Remember the token for later runs
    #[arg(long)]
    pub save_token: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn options(&self) -> UploadOptions {
        UploadOptions {
            skip_unsupported_extensions: !self.include_unsupported,
            skip_duplicates: !self.noskip,
            finish: FinishOptions {
                lang: self.lang.clone(),
                ocr: !self.no_ocr,
                split_by_page: self.split_by_page,
            },
        }
    }

    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "overview_upload=error",
            1 => "overview_upload=info",
            _ => "overview_upload=debug",
        }
    }
}
