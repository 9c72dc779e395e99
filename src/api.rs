// API client module: a small blocking HTTP client for the document-ingestion
// service. Every endpoint the upload session needs is one method here; the
// session only sees them through the `Transport` trait.

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::blocking::{Body, Client, RequestBuilder, Response};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_LENGTH,
};
use reqwest::{Method, StatusCode};
use tracing::{debug, info};
use uuid::Uuid;

use crate::candidate::UploadBody;
use crate::error::{Result, UploadError};
use crate::options::FinishRequest;
use crate::session::Transport;

/// Server used when none is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:9000";

pub const SERVER_URL_ENV: &str = "OVERVIEW_SERVER_URL";
pub const API_TOKEN_ENV: &str = "OVERVIEW_API_TOKEN";

// The service authenticates with Basic auth: the API token as user name and
// this fixed string as password.
const AUTH_PASSWORD: &str = "x-auth-token";

/// Blocking client bound to one server and one API token (which in turn
/// points at one document set).
#[derive(Clone)]
pub struct OverviewClient {
    client: Client,
    base_url: String,
    auth: HeaderValue,
}

impl OverviewClient {
    /// Create a client for `base_url` (for example `https://www.overviewdocs.com`)
    /// authenticating with `token`.
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let client = Client::builder().build()?;
        Self::with_client(client, base_url, token)
    }

    /// Like [`new`](Self::new), reusing a configured reqwest client
    /// (timeouts, proxies, TLS roots).
    pub fn with_client(client: Client, base_url: &str, token: &str) -> Result<Self> {
        Ok(OverviewClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: auth_header(token)?,
        })
    }

    /// Create a client from `OVERVIEW_SERVER_URL` (falling back to
    /// `http://localhost:9000`) and `OVERVIEW_API_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var(SERVER_URL_ENV).unwrap_or_else(|_| DEFAULT_SERVER_URL.into());
        let token = std::env::var(API_TOKEN_ENV).map_err(|_| UploadError::MissingEnv(API_TOKEN_ENV))?;
        Self::new(&base_url, &token)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.auth.clone());
        headers.insert(
            HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static(concat!("overview-upload/", env!("CARGO_PKG_VERSION"))),
        );
        headers
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        self.client.request(method, &url).headers(self.auth_headers())
    }
}

impl Transport for OverviewClient {
    fn clear_pending(&self) -> Result<()> {
        let res = self.request(Method::DELETE, "/api/v1/files").send()?;
        check("Clearing previous uploads", res)?;
        Ok(())
    }

    fn file_exists(&self, sha1: &str) -> Result<bool> {
        let path = format!("/api/v1/document-sets/files/{}", sha1);
        let res = self.request(Method::HEAD, &path).send()?;
        // 204 = already got it, 404 = don't got it
        match res.status() {
            StatusCode::NO_CONTENT => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(false),
            status => Err(UploadError::Status {
                operation: "Duplicate check",
                status,
                body: String::new(),
            }),
        }
    }

    fn upload(&self, handle: Uuid, content_disposition: &str, body: UploadBody) -> Result<()> {
        let disposition = HeaderValue::from_str(content_disposition)
            .map_err(|_| UploadError::InvalidHeader(content_disposition.to_string()))?;

        let res = self
            .request(Method::POST, &format!("/api/v1/files/{}", handle))
            .header(CONTENT_DISPOSITION, disposition)
            .header(CONTENT_LENGTH, body.len)
            .body(Body::sized(body.reader, body.len))
            .send()?;
        check("Upload", res)?;
        Ok(())
    }

    fn finish(&self, request: &FinishRequest) -> Result<()> {
        let res = self
            .request(Method::POST, "/api/v1/files/finish")
            .json(request)
            .send()?;
        check("Finish", res)?;
        info!(
            "Finished. Browse to {}/documentsets to watch progress",
            self.base_url
        );
        Ok(())
    }
}

fn auth_header(token: &str) -> Result<HeaderValue> {
    let credentials = STANDARD.encode(format!("{}:{}", token, AUTH_PASSWORD));
    let mut value = HeaderValue::from_str(&format!("Basic {}", credentials))
        .map_err(|_| UploadError::InvalidHeader("API token".into()))?;
    value.set_sensitive(true);
    Ok(value)
}

fn check(operation: &'static str, res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().unwrap_or_default();
    Err(UploadError::Status {
        operation,
        status,
        body,
    })
}
