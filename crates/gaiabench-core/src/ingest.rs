//! Dataset ingestion: scrape the listing page for direct-download links,
//! fetch each file, and mirror it into the object store under the configured
//! prefix.
//!
//! Best-effort and non-transactional. A failure in one file's pipeline is
//! logged and skipped; the batch continues. A rerun re-downloads and
//! re-uploads everything.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use gaiabench_store::ObjectStore;

/// Marker identifying direct-download links on the dataset listing page.
const RESOLVE_MARKER: &str = "resolve/main";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub listing_url: String,
    /// Hugging Face access token, supplied out-of-band via `HF_TOKEN`.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            listing_url:
                "https://huggingface.co/datasets/gaia-benchmark/GAIA/tree/main/2023/validation/"
                    .to_string(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub found: usize,
    pub uploaded: usize,
    pub failed: usize,
}

/// Pull anchor hrefs out of the listing page, keep only direct-download
/// links, and normalize them to absolute URLs against the page base.
pub fn extract_file_urls(html: &str, base: &Url) -> Result<Vec<String>> {
    let href = Regex::new(r#"<a\s[^>]*?href="([^"]+)""#).context("invalid href pattern")?;
    let mut urls = Vec::new();
    for captures in href.captures_iter(html) {
        let link = &captures[1];
        if !link.contains(RESOLVE_MARKER) {
            continue;
        }
        match base.join(link) {
            Ok(url) => urls.push(url.to_string()),
            Err(err) => warn!(link, %err, "skipping unparsable link"),
        }
    }
    Ok(urls)
}

/// File name for a download URL: the final path segment, with any query
/// suffix (e.g. `?download=true`) stripped.
pub fn file_name_of(file_url: &str) -> Option<String> {
    let url = Url::parse(file_url).ok()?;
    let name = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    Some(name.to_string())
}

/// Seam for the per-file transfer steps, so the batch loop can be exercised
/// without live endpoints.
#[async_trait]
pub trait FilePipeline: Send + Sync {
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<()>;
}

struct HttpPipeline<'a> {
    client: Client,
    token: Option<&'a str>,
    store: &'a ObjectStore,
}

#[async_trait]
impl FilePipeline for HttpPipeline<'_> {
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = authorized(self.client.get(url), self.token).send().await?;
        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {status}");
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<()> {
        let key = self.store.key(name);
        self.store.put_object(&key, bytes).await?;
        Ok(())
    }
}

pub async fn run(config: &IngestConfig, store: &ObjectStore) -> Result<IngestReport> {
    let client = Client::new();
    let base = Url::parse(&config.listing_url)
        .with_context(|| format!("invalid listing url '{}'", config.listing_url))?;

    let response = authorized(client.get(base.clone()), config.token.as_deref())
        .send()
        .await
        .context("failed to fetch dataset listing page")?;
    let status = response.status();
    if !status.is_success() {
        bail!("dataset listing page returned HTTP {status}");
    }
    let html = response.text().await.context("failed to read dataset listing page")?;

    let urls = extract_file_urls(&html, &base)?;
    info!(found = urls.len(), "scraped dataset listing");

    let pipeline = HttpPipeline { client, token: config.token.as_deref(), store };
    Ok(mirror_files(&pipeline, &urls).await)
}

/// Sequential download→upload loop. A failure in one file's pipeline is
/// logged and counted; the remaining files still go through.
pub async fn mirror_files(pipeline: &dyn FilePipeline, urls: &[String]) -> IngestReport {
    let mut report = IngestReport { found: urls.len(), ..Default::default() };
    for file_url in urls {
        let Some(name) = file_name_of(file_url) else {
            warn!(url = %file_url, "skipping link without a file name");
            report.failed += 1;
            continue;
        };
        let bytes = match pipeline.download(file_url).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(url = %file_url, %err, "download failed");
                report.failed += 1;
                continue;
            }
        };
        match pipeline.upload(&name, bytes).await {
            Ok(()) => {
                info!(%name, "uploaded");
                report.uploaded += 1;
            }
            Err(err) => {
                warn!(%name, %err, "upload failed");
                report.failed += 1;
            }
        }
    }
    report
}

fn authorized(req: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
    match token {
        Some(token) => req.bearer_auth(token),
        None => req,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Fails downloads whose URL contains the given marker; records uploads.
    struct StubPipeline {
        fail_marker: &'static str,
        uploads: Mutex<Vec<String>>,
    }

    impl StubPipeline {
        fn new(fail_marker: &'static str) -> Self {
            Self { fail_marker, uploads: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl FilePipeline for StubPipeline {
        async fn download(&self, url: &str) -> Result<Vec<u8>> {
            if url.contains(self.fail_marker) {
                bail!("HTTP 500 Internal Server Error");
            }
            Ok(b"content".to_vec())
        }

        async fn upload(&self, name: &str, _bytes: Vec<u8>) -> Result<()> {
            self.uploads.lock().unwrap().push(name.to_string());
            Ok(())
        }
    }

    const LISTING: &str = r#"
        <html><body>
        <a class="file" href="/datasets/gaia-benchmark/GAIA/resolve/main/2023/validation/a.pdf?download=true">a.pdf</a>
        <a href="/datasets/gaia-benchmark/GAIA/resolve/main/2023/validation/b.csv">b.csv</a>
        <a href="https://huggingface.co/datasets/gaia-benchmark/GAIA/resolve/main/2023/validation/c.xlsx">c.xlsx</a>
        <a href="/datasets/gaia-benchmark/GAIA/tree/main/2023">unrelated</a>
        </body></html>
    "#;

    fn base() -> Url {
        Url::parse("https://huggingface.co/datasets/gaia-benchmark/GAIA/tree/main/2023/validation/")
            .unwrap()
    }

    #[test]
    fn keeps_only_resolve_links() {
        let urls = extract_file_urls(LISTING, &base()).unwrap();
        assert_eq!(urls.len(), 3);
        assert!(urls.iter().all(|u| u.starts_with("https://huggingface.co/")));
        assert!(urls.iter().all(|u| u.contains(RESOLVE_MARKER)));
    }

    #[test]
    fn relative_links_are_made_absolute() {
        let urls = extract_file_urls(LISTING, &base()).unwrap();
        assert_eq!(
            urls[1],
            "https://huggingface.co/datasets/gaia-benchmark/GAIA/resolve/main/2023/validation/b.csv"
        );
    }

    #[test]
    fn no_links_yields_empty_list() {
        let urls = extract_file_urls("<html><body>nothing here</body></html>", &base()).unwrap();
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn one_failed_download_does_not_stop_the_batch() {
        let urls: Vec<String> = extract_file_urls(LISTING, &base()).unwrap();
        assert_eq!(urls.len(), 3);

        let pipeline = StubPipeline::new("b.csv");
        let report = mirror_files(&pipeline, &urls).await;

        assert_eq!(report, IngestReport { found: 3, uploaded: 2, failed: 1 });
        let uploads = pipeline.uploads.lock().unwrap();
        assert_eq!(*uploads, vec!["a.pdf".to_string(), "c.xlsx".to_string()]);
    }

    #[tokio::test]
    async fn upload_failure_is_counted_and_skipped() {
        struct RejectingPipeline;

        #[async_trait]
        impl FilePipeline for RejectingPipeline {
            async fn download(&self, _url: &str) -> Result<Vec<u8>> {
                Ok(Vec::new())
            }
            async fn upload(&self, name: &str, _bytes: Vec<u8>) -> Result<()> {
                if name.ends_with(".csv") {
                    bail!("HTTP 403");
                }
                Ok(())
            }
        }

        let urls: Vec<String> = extract_file_urls(LISTING, &base()).unwrap();
        let report = mirror_files(&RejectingPipeline, &urls).await;
        assert_eq!(report, IngestReport { found: 3, uploaded: 2, failed: 1 });
    }

    #[test]
    fn file_name_strips_query_suffix() {
        assert_eq!(
            file_name_of("https://huggingface.co/x/resolve/main/v/a.pdf?download=true").as_deref(),
            Some("a.pdf")
        );
        assert_eq!(
            file_name_of("https://huggingface.co/x/resolve/main/v/b.csv").as_deref(),
            Some("b.csv")
        );
        assert_eq!(file_name_of("not a url"), None);
    }
}
