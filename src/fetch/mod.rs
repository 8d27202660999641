// src/fetch/mod.rs

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::error::FetchError;

pub mod http;
pub mod snapshot;

pub use http::HttpSource;

/// Jurisdictions listed in the report's state selector.
pub const STATE_COUNT: u32 = 56;

static OPTION: Lazy<Selector> = Lazy::new(|| Selector::parse("option").expect("option selector"));

/// One fetched report page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub year: u32,
    pub state_index: u32,
    pub state_name: String,
    pub body: String,
}

/// Where report pages come from. One call per (year, state), no retries.
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn fetch(&self, year: u32, state_index: u32) -> Result<FetchResult, FetchError>;
}

/// Reject indexes outside `1..=STATE_COUNT` before any request goes out.
pub fn check_state_index(state_index: u32) -> Result<(), FetchError> {
    if (1..=STATE_COUNT).contains(&state_index) {
        Ok(())
    } else {
        Err(FetchError::InvalidStateIndex(state_index))
    }
}

/// Resolve the 1-based `state_index` against the page's `<option>` list.
pub fn state_name_from_options(body: &str, state_index: u32) -> Result<String, FetchError> {
    let doc = Html::parse_document(body);
    let names: Vec<String> = doc
        .select(&OPTION)
        .map(|o| o.text().collect::<String>().trim().to_string())
        .collect();

    state_index
        .checked_sub(1)
        .and_then(|i| names.get(i as usize))
        .cloned()
        .ok_or(FetchError::StateNotListed {
            index: state_index,
            available: names.len(),
        })
}
