use async_trait::async_trait;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::ReadAt;
use anyhow::{anyhow, bail, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 10;

/// Remote archive source backed by HTTP Range requests.
///
/// Only the byte ranges the parser asks for are fetched, so listing a
/// large remote archive costs little more than its central directory.
pub struct HttpRangeSource {
    client: Client,
    url: String,
    size: u64,
    transferred: AtomicU64,
}

impl HttpRangeSource {
    /// Probe the server with a HEAD request, verifying Range support and
    /// learning the archive size.
    pub async fn connect(url: String) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        let resp = client.head(&url).send().await?;
        if !resp.status().is_success() {
            bail!("HTTP request failed with status: {}", resp.status());
        }

        let accepts_ranges = resp
            .headers()
            .get("accept-ranges")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("bytes"));
        if !accepts_ranges {
            bail!("Remote server does not support Range requests");
        }

        let size = resp
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| anyhow!("Remote server did not return Content-Length"))?;

        Ok(Self {
            client,
            url,
            size,
            transferred: AtomicU64::new(0),
        })
    }

    /// Total bytes fetched from the network so far.
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ReadAt for HttpRangeSource {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let end = (offset + buf.len() as u64 - 1).min(self.size - 1);
        let wanted = (end - offset + 1) as usize;

        let mut received = 0;
        let mut retries = 0;

        // Servers may return short bodies; keep requesting the remainder
        // until the range is complete or retries run out.
        while received < wanted {
            let range = format!("bytes={}-{}", offset + received as u64, end);
            let result = self
                .client
                .get(&self.url)
                .header("Range", &range)
                .send()
                .await;

            match result {
                Ok(resp) => {
                    if resp.status() != reqwest::StatusCode::PARTIAL_CONTENT {
                        bail!("HTTP request failed with status: {}", resp.status());
                    }

                    let bytes = resp.bytes().await?;
                    let n = bytes.len().min(wanted - received);
                    buf[received..received + n].copy_from_slice(&bytes[..n]);
                    received += n;
                    self.transferred.fetch_add(n as u64, Ordering::Relaxed);
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retries += 1;
                    if retries >= MAX_RETRIES {
                        bail!("Max retries exceeded");
                    }
                    eprintln!("Connection error, retry {}/{}: {}", retries, MAX_RETRIES, e);
                    tokio::time::sleep(Duration::from_millis(500 * retries as u64)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(received)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
