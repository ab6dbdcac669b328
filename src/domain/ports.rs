use crate::utils::error::Result;
use serde_json::Value;

/// Destination for finished objects. Writes replace whatever is stored under `path`.
pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Anything that can answer a GET with a decoded JSON document.
pub trait JsonSource: Send + Sync {
    fn get_json(&self, url: &str) -> impl std::future::Future<Output = Result<Value>> + Send;
}
