//! Error types for the reqwest-proxy-supply crate.

use reqwest::StatusCode;
use thiserror::Error;

/// Longest vendor body excerpt kept inside a [`Error::MalformedResponse`].
const BODY_EXCERPT_LEN: usize = 256;

/// Errors that can end a retrieval call.
#[derive(Debug, Error)]
pub enum Error {
    /// The vendor endpoint could not be reached or the body could not be read.
    #[error("vendor call to {url} failed: {source}")]
    VendorCall {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The vendor endpoint answered with something other than 200.
    #[error("vendor call to {url} returned status {status}")]
    VendorStatus { url: String, status: StatusCode },

    /// The vendor body is not a plain list of `ip:port` tokens.
    #[error("vendor returned a malformed proxy list: {body:?}")]
    MalformedResponse { body: String },

    /// The vendor listed proxies but none survived normalization.
    #[error("vendor listed {listed} proxies but none are usable")]
    NoUsableProxies { listed: usize },

    /// The retry policy gave up.
    #[error("gave up after {attempts} failed vendor attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<Error> },

    /// The caller cancelled the retrieval.
    #[error("retrieval cancelled")]
    Cancelled,

    /// A reqwest client could not be built, usually because of a bad proxy URL.
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    /// The connectivity probe through a proxy failed at the transport level.
    #[error("probe through {proxy} failed: {source}")]
    Probe {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    /// A retrieval finished without producing a proxy.
    #[error("No proxy available")]
    NoProxyAvailable,
}

impl Error {
    /// True for both flavours of vendor call failure (transport and status).
    pub fn is_vendor_call(&self) -> bool {
        matches!(self, Error::VendorCall { .. } | Error::VendorStatus { .. })
    }

    pub(crate) fn malformed(body: &str) -> Self {
        let body = match body.char_indices().nth(BODY_EXCERPT_LEN) {
            Some((idx, _)) => format!("{}...", &body[..idx]),
            None => body.to_string(),
        };
        Error::MalformedResponse { body }
    }
}

/// A single raw candidate could not be turned into a proxy.
///
/// Never escalated: the pipeline drops the candidate and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid proxy {raw:?}: {reason}")]
pub struct ProxyFormatError {
    pub raw: String,
    pub reason: &'static str,
}

impl ProxyFormatError {
    pub(crate) fn new(raw: &str, reason: &'static str) -> Self {
        Self {
            raw: raw.to_string(),
            reason,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
