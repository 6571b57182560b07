//! Fetch checked proxies from a vendor endpoint.
//!
//! ```sh
//! PROXY_VENDOR_URL='https://vendor.example.com/get?num=${num}' cargo run --example fetch
//! ```
//!
//! Set `PROXY_CONSOLE_LOG=1` to print pipeline messages as plain `[INFO]` /
//! `[WARN]` lines instead of going through `env_logger`.

use futures::StreamExt;
use reqwest_proxy_supply::{
    CheckerConfig, ConsoleLogger, FetchRequest, ProxySource, RetryPolicy, VendorConfig,
    VendorSource,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let endpoint = std::env::var("PROXY_VENDOR_URL")?;
    let config = VendorConfig::builder()
        .endpoint(endpoint)
        .credentials(
            std::env::var("PROXY_USERNAME").unwrap_or_default(),
            std::env::var("PROXY_PASSWORD").unwrap_or_default(),
        )
        // give up after five consecutive vendor failures
        .retry(RetryPolicy::bounded(Duration::from_secs(1), 5))
        .build();

    let mut source = VendorSource::new(config)?.with_checker(
        CheckerConfig::builder()
            .target_url("http://httpbin.org/ip")
            .timeout(Duration::from_secs(3))
            .build(),
    );
    if std::env::var_os("PROXY_CONSOLE_LOG").is_some() {
        source = source.with_logger(Arc::new(ConsoleLogger));
    }

    println!("Fetching 3 checked proxies...");
    let proxies = source.get_checked_proxies(&FetchRequest::new(3)).await?;
    for proxy in &proxies {
        println!("  {}", proxy);
    }

    println!("Streaming 2 checked proxies...");
    let mut stream = source.stream_checked_proxies(&FetchRequest::new(2).exit_on_error(true));
    while let Some(proxy) = stream.next().await {
        println!("  {}", proxy?);
    }

    Ok(())
}
