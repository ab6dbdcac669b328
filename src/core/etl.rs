use crate::config::IngestConfig;
use crate::core::csv_writer::CsvUploader;
use crate::core::fetch::Paginator;
use crate::domain::model::{RunSummary, TableResult};
use crate::domain::ports::{JsonSource, Storage};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};

/// Compact UTC stamp shared by every object of one run, e.g. `20240102T030405Z`.
pub const RUN_STAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Table name for an endpoint: its last path segment, lowercased.
pub fn table_name(endpoint: &str) -> String {
    endpoint
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// `<prefix>/<table>/<yyyy>/<mm>/<dd>/run=<stamp>/<table>_<stamp>.csv`
pub fn destination_key(prefix: &str, table: &str, run_at: DateTime<Utc>) -> String {
    let stamp = run_at.format(RUN_STAMP_FORMAT);
    let separator = if prefix.is_empty() || prefix.ends_with('/') {
        ""
    } else {
        "/"
    };
    format!(
        "{}{}{}/{}/run={}/{}_{}.csv",
        prefix,
        separator,
        table,
        run_at.format("%Y/%m/%d"),
        stamp,
        table,
        stamp
    )
}

/// Runs every configured endpoint through fetch and upload, one after another.
pub struct EtlEngine<J: JsonSource, S: Storage> {
    source: J,
    storage: S,
    config: IngestConfig,
}

impl<J: JsonSource, S: Storage> EtlEngine<J, S> {
    pub fn new(source: J, storage: S, config: IngestConfig) -> Self {
        Self {
            source,
            storage,
            config,
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        self.run_at(Utc::now()).await
    }

    /// Runs with a fixed stamp. The first failing endpoint aborts the run;
    /// objects already written for earlier endpoints are left in place.
    pub async fn run_at(&self, run_at: DateTime<Utc>) -> Result<RunSummary> {
        tracing::info!(
            "Starting ingestion of {} endpoint(s) from {}",
            self.config.endpoints.len(),
            self.config.base_url
        );

        let uploader = CsvUploader::new(&self.storage);
        let mut summary = RunSummary::default();

        for endpoint in &self.config.endpoints {
            let table = table_name(endpoint);
            let key = destination_key(&self.config.s3_prefix, &table, run_at);

            let rows = Paginator::new(&self.source, self.config.page_request(endpoint))
                .collect_rows()
                .await?;
            let count = uploader.upload(&rows, &key).await?;

            summary.record(table, TableResult { rows: count, s3_key: key });
        }

        tracing::info!(
            "Ingestion finished: {} rows across {} table(s)",
            summary.total_rows,
            summary.results.len()
        );
        Ok(summary)
    }
}
