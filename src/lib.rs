//! # reqwest-proxy-supply
//!
//! Acquire verified HTTP proxies from a vendor endpoint.
//!
//! A [`VendorSource`] calls the vendor until it has collected the requested
//! number of `ip:port` candidates, normalizes them into `http://` proxy URLs
//! and, for the checked modes, probes each one concurrently through reqwest.
//! Results are available as a blocking batch or as a [`ProxyReceiver`]
//! stream. A [`TunnelSource`] satisfies the same [`ProxySource`] interface
//! with a single fixed endpoint.
//!
//! This is a one-shot acquisition pipeline: it does not keep, rotate or
//! balance proxies it has already returned.

pub mod cancel;
pub mod checker;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod logger;
pub mod parse;
pub mod proxy;
pub mod source;
pub mod stream;
pub mod tunnel;
pub mod vendor;

pub use cancel::{CancelHandle, CancelToken};
pub use checker::{CheckResult, ConnectivityChecker};
pub use config::{
    CheckerConfig, CheckerConfigBuilder, RetryPolicy, TunnelConfig, VendorConfig,
    VendorConfigBuilder,
};
pub use error::{Error, ProxyFormatError, Result};
pub use fetcher::VendorFetcher;
pub use logger::{ConsoleLogger, LogFacade, Logger, NoopLogger};
pub use parse::{is_proxy_list_only, split_proxy_list};
pub use proxy::{normalize, NormalizedProxy};
pub use source::{FetchRequest, ProxySource};
pub use stream::ProxyReceiver;
pub use tunnel::TunnelSource;
pub use vendor::VendorSource;
