use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("malformed payload from {origin}: {source}")]
    Payload {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("cache entry {path}: {source}")]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("cannot encode QR code: {0}")]
    Qr(#[from] qrcode::types::QrError),
    #[error("no data")]
    NoData,
}

impl Error {
    pub(crate) fn http(url: impl Into<String>, source: ureq::Error) -> Self {
        Error::Http {
            url: url.into(),
            source: Box::new(source),
        }
    }

    /// Short text shown to people instead of the technical message.
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::Http { .. } | Error::Status { .. } | Error::NoData => "No data",
            Error::Payload { .. } | Error::Snapshot { .. } => "Publication list is unreadable",
            Error::Cache { .. } => "Local copy is unavailable",
            Error::Url(_) => "Bad link",
            Error::Qr(_) => "Link is too long to share",
        }
    }
}
