//! Record source backed by the Delaware legislation JSON endpoint.
//!
//! The endpoint is the one the public "All Legislation" page calls: a form
//! POST returning `{ "Total": n, "Data": [...] }`. It expects browser-like
//! headers, so we send the same ones the site does.

use legisync_core::error::SourceError;
use legisync_core::record::RawRecord;
use legisync_core::source::{Page, RecordSource};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, REFERER, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str =
    "https://legis.delaware.gov/json/AllLegislation/GetAllLegislation";
const REFERER_URL: &str = "https://legis.delaware.gov/AllLegislation";
const BROWSER_UA: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15";

/// Form body for one page request.
pub fn form_fields(partition_key: u32, page: u32, page_size: u32) -> Vec<(&'static str, String)> {
    vec![
        ("sort", String::new()),
        ("page", page.to_string()),
        ("pageSize", page_size.to_string()),
        ("group", String::new()),
        ("filter", String::new()),
        ("selectedGA[0]", partition_key.to_string()),
        ("sponsorName", String::new()),
        ("fromIntroDate", String::new()),
        ("toIntroDate", String::new()),
        ("coSponsorCheck", "false".to_string()),
    ]
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(rename = "Total")]
    total: u64,
    #[serde(rename = "Data", default)]
    data: Option<Vec<Value>>,
}

/// Decode a response body into a [`Page`].
pub fn parse_page(body: &str) -> Result<Page, SourceError> {
    let response: ListResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Decode(e.to_string()))?;
    let mut records = Vec::new();
    for (i, item) in response.data.unwrap_or_default().into_iter().enumerate() {
        let record = RawRecord::from_value(item)
            .ok_or_else(|| SourceError::Decode(format!("Data[{i}] is not an object")))?;
        records.push(record);
    }
    Ok(Page {
        total: response.total,
        records,
    })
}

pub struct LegisClient {
    client: Client,
    endpoint: String,
}

impl LegisClient {
    pub fn new() -> Result<Self, SourceError> {
        Self::with_endpoint(DEFAULT_ENDPOINT, Duration::from_secs(30))
    }

    pub fn with_endpoint(endpoint: &str, timeout: Duration) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded; charset=UTF-8"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
        headers.insert(REFERER, HeaderValue::from_static(REFERER_URL));
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

impl RecordSource for LegisClient {
    fn fetch_page(
        &mut self,
        partition_key: u32,
        page: u32,
        page_size: u32,
    ) -> Result<Page, SourceError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .form(&form_fields(partition_key, page, page_size))
            .send()
            .map_err(|e| SourceError::Transport(format!("POST {}: {e}", self.endpoint)))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| SourceError::Transport(format!("failed to read body: {e}")))?;
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body: truncate(&body, 512),
            });
        }
        parse_page(&body)
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
