use crate::config::IngestConfig;
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Command-line face of the job. Every flag falls back to the environment
/// variable the Lambda deployment reads, so both entry points share one set
/// of defaults.
#[derive(Debug, Clone, Parser)]
#[command(name = "page-ingest")]
#[command(about = "Copy paginated REST endpoints into date-partitioned CSV files")]
pub struct CliConfig {
    #[arg(long, env = "BUCKET_NAME")]
    pub bucket_name: Option<String>,

    #[arg(long, env = "BASE_URL")]
    pub base_url: Option<String>,

    /// Comma-separated endpoint paths
    #[arg(long, env = "TABLE_ENDPOINTS")]
    pub table_endpoints: Option<String>,

    #[arg(long, env = "S3_PREFIX")]
    pub s3_prefix: Option<String>,

    /// Page number query parameter; pass an empty string to fetch one page only
    #[arg(long, env = "PAGE_PARAM")]
    pub page_param: Option<String>,

    #[arg(long, env = "START_PAGE")]
    pub start_page: Option<String>,

    #[arg(long, env = "PAGE_SIZE_PARAM")]
    pub page_size_param: Option<String>,

    #[arg(long, env = "PAGE_SIZE")]
    pub page_size: Option<String>,

    /// Stop after this many pages per endpoint (0 = no limit)
    #[arg(long, env = "MAX_PAGES")]
    pub max_pages: Option<String>,

    #[arg(long, env = "HTTP_TIMEOUT_SECONDS")]
    pub http_timeout_seconds: Option<String>,

    #[arg(long, env = "HTTP_RETRIES")]
    pub http_retries: Option<String>,

    #[arg(long, env = "HTTP_BACKOFF_MS")]
    pub http_backoff_ms: Option<String>,

    /// Local directory standing in for object storage; files land under <output>/<bucket>/
    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    fn value_for(&self, name: &str) -> Option<String> {
        let value = match name {
            "BUCKET_NAME" => &self.bucket_name,
            "BASE_URL" => &self.base_url,
            "TABLE_ENDPOINTS" => &self.table_endpoints,
            "S3_PREFIX" => &self.s3_prefix,
            "PAGE_PARAM" => &self.page_param,
            "START_PAGE" => &self.start_page,
            "PAGE_SIZE_PARAM" => &self.page_size_param,
            "PAGE_SIZE" => &self.page_size,
            "MAX_PAGES" => &self.max_pages,
            "HTTP_TIMEOUT_SECONDS" => &self.http_timeout_seconds,
            "HTTP_RETRIES" => &self.http_retries,
            "HTTP_BACKOFF_MS" => &self.http_backoff_ms,
            _ => return None,
        };
        value.clone()
    }

    pub fn ingest_config(&self) -> Result<IngestConfig> {
        IngestConfig::from_lookup(|name| self.value_for(name))
    }

    /// Root directory for the local stand-in of `bucket`.
    pub fn bucket_root(&self, bucket: &str) -> PathBuf {
        Path::new(&self.output_path).join(bucket)
    }
}

/// Filesystem storage rooted at one directory; object keys become relative paths.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Storage for LocalStorage {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.base_path.join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&full_path, data).await?;
        tracing::debug!("Wrote {}", full_path.display());
        Ok(())
    }
}
