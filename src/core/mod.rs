pub mod csv_writer;
pub mod etl;
pub mod fetch;
pub mod flatten;
pub mod http;

pub use crate::domain::model::{FlatRow, Page, RunSummary, TableResult};
pub use crate::domain::ports::{JsonSource, Storage};
pub use crate::utils::error::Result;
