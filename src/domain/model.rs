use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A record reduced to one level: dotted-path keys in traversal order, scalar values.
pub type FlatRow = serde_json::Map<String, Value>;

/// Key used when a page is a bare scalar rather than an object or list.
pub const PAYLOAD_KEY: &str = "_payload";

/// One API response, classified by shape.
///
/// Variant order matters: a list is a bare list, an object carrying a `data`
/// array is a wrapped list, and everything else is a single payload. `List`
/// must come before `Wrapped`, which would otherwise accept `[[...]]` as a
/// sequence-encoded struct.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Page {
    List(Vec<Value>),
    Wrapped { data: Vec<Value> },
    Single(Value),
}

impl Page {
    /// The records carried by this page, in response order.
    pub fn into_records(self) -> Vec<Value> {
        match self {
            Page::Wrapped { data } => data,
            Page::List(items) => items,
            Page::Single(object @ Value::Object(_)) => vec![object],
            Page::Single(other) => {
                let mut wrapper = serde_json::Map::new();
                wrapper.insert(PAYLOAD_KEY.to_string(), Value::String(other.to_string()));
                vec![Value::Object(wrapper)]
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableResult {
    pub rows: usize,
    pub s3_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_rows: usize,
    pub results: BTreeMap<String, TableResult>,
}

#[derive(Serialize)]
struct ResponseBody<'a> {
    message: &'a str,
    #[serde(flatten)]
    summary: &'a RunSummary,
}

impl RunSummary {
    pub fn record(&mut self, table: String, result: TableResult) {
        self.total_rows += result.rows;
        self.results.insert(table, result);
    }

    /// JSON text returned to the trigger: `message`, `total_rows`, `results`.
    pub fn response_body(&self, message: &str) -> serde_json::Result<String> {
        serde_json::to_string(&ResponseBody {
            message,
            summary: self,
        })
    }
}
