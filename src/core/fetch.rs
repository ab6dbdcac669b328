use crate::core::flatten::flatten_record;
use crate::domain::model::{FlatRow, Page};
use crate::domain::ports::JsonSource;
use crate::utils::error::Result;
use url::form_urlencoded;

/// Where one endpoint lives and how to walk its pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub base_url: String,
    pub endpoint: String,
    /// Query parameter carrying the page number; empty disables paging.
    pub page_param: String,
    pub start_page: u64,
    /// Query parameter carrying the page size; empty omits it.
    pub page_size_param: String,
    pub page_size: u64,
    /// Upper bound on fetched pages, 0 for no bound.
    pub max_pages: u64,
}

impl PageRequest {
    pub fn page_url(&self, page: u64) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if !self.page_param.is_empty() {
            query.append_pair(&self.page_param, &page.to_string());
        }
        if !self.page_size_param.is_empty() && self.page_size > 0 {
            query.append_pair(&self.page_size_param, &self.page_size.to_string());
        }
        let query = query.finish();

        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        );
        if query.is_empty() {
            url
        } else {
            format!("{}?{}", url, query)
        }
    }
}

/// Walks one endpoint page by page, flattening records as each page arrives.
///
/// Nothing is requested until [`Paginator::next_batch`] is called, and the
/// walk cannot be restarted once it has finished.
pub struct Paginator<'a, J: JsonSource> {
    source: &'a J,
    request: PageRequest,
    page: u64,
    fetched: u64,
    finished: bool,
}

impl<'a, J: JsonSource> Paginator<'a, J> {
    pub fn new(source: &'a J, request: PageRequest) -> Self {
        Self {
            page: request.start_page,
            source,
            request,
            fetched: 0,
            finished: false,
        }
    }

    /// Rows of the next page, or `None` once the endpoint is exhausted.
    ///
    /// A page whose records were all malformed yields `Some` of an empty batch;
    /// only an empty page ends the walk.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<FlatRow>>> {
        if self.finished {
            return Ok(None);
        }

        let url = self.request.page_url(self.page);
        tracing::info!("Fetching {}", url);
        let page: Page = serde_json::from_value(self.source.get_json(&url).await?)?;
        let records = page.into_records();

        if records.is_empty() {
            tracing::info!(
                "No data at page={}; stopping endpoint={}",
                self.page,
                self.request.endpoint
            );
            self.finished = true;
            return Ok(None);
        }

        let mut rows = Vec::with_capacity(records.len());
        for record in &records {
            match flatten_record(record) {
                Ok(row) => rows.push(row),
                Err(e) => tracing::warn!("Skipping bad record: {}", e),
            }
        }

        self.fetched += 1;
        if self.request.max_pages > 0 && self.fetched >= self.request.max_pages {
            tracing::info!(
                "Reached max_pages={} for endpoint={}",
                self.request.max_pages,
                self.request.endpoint
            );
            self.finished = true;
        } else if self.request.page_param.is_empty() {
            self.finished = true;
        } else {
            self.page += 1;
        }

        Ok(Some(rows))
    }

    /// Drains every remaining page into one buffer.
    pub async fn collect_rows(mut self) -> Result<Vec<FlatRow>> {
        let mut rows = Vec::new();
        while let Some(batch) = self.next_batch().await? {
            rows.extend(batch);
        }
        Ok(rows)
    }

    pub fn pages_fetched(&self) -> u64 {
        self.fetched
    }
}
