// Records API module.
// Provides the HTTP client and the source trait the updater pulls records through.

pub mod client;
pub mod types;

pub use client::RecordsClient;
pub use types::{Element, ElementResult, Stats};

use crate::error::Result;

/// Anything that can report a record count and serve records by 1-based index.
#[allow(async_fn_in_trait)]
pub trait RecordSource {
    async fn total_records(&self) -> Result<u64>;
    async fn element(&self, index: u64) -> Result<Element>;
}

impl RecordSource for RecordsClient {
    async fn total_records(&self) -> Result<u64> {
        let response = self.get("/stats").await?;
        let stats: Stats = response.json().await?;
        Ok(stats.total_records)
    }

    async fn element(&self, index: u64) -> Result<Element> {
        let response = self.get(&self.element_endpoint(index)).await?;
        let element: Element = response.json().await?;
        Ok(element)
    }
}
