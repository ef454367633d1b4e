//! Google Sheets v4 row store.
//!
//! Talks to the REST API directly with a bearer token. Ranges always span
//! the canonical column count (`A:O` for fifteen columns).

use legisync_core::error::StoreError;
use legisync_core::schema::{header_labels, Column};
use legisync_core::store::{RowPatch, RowStore};
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
pub const DRIVE_API: &str = "https://www.googleapis.com/drive/v3/files";
pub const TOKEN_ENV: &str = "LEGISYNC_SHEETS_TOKEN";

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("missing access token: set {TOKEN_ENV}")]
    MissingToken,

    #[error("http error: {0}")]
    Http(String),

    #[error("sheets api returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

// ============================================================================
// A1 notation helpers
// ============================================================================

/// Column letter for a 1-based column number (1 → A, 27 → AA).
pub fn column_letter(mut n: usize) -> String {
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Last column letter of the canonical schema.
pub fn last_column() -> String {
    column_letter(Column::ALL.len())
}

/// Quote a sheet title for use in A1 notation.
pub fn quote_sheet(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

/// `'<sheet>'!A:O`
pub fn full_range(sheet: &str) -> String {
    format!("{}!A:{}", quote_sheet(sheet), last_column())
}

/// `'<sheet>'!A<first>:O<last>` for `count` rows starting at `first`.
pub fn row_range(sheet: &str, first: usize, count: usize) -> String {
    let last = first + count.max(1) - 1;
    format!("{}!A{first}:{}{last}", quote_sheet(sheet), last_column())
}

/// Decode a `values.get` response into a string grid.
///
/// Sheets omits `values` entirely for an empty sheet and trims trailing
/// empty cells from each row.
pub fn parse_values(body: &Value) -> Vec<Vec<String>> {
    let Some(rows) = body.get("values").and_then(Value::as_array) else {
        return Vec::new();
    };
    rows.iter()
        .map(|row| {
            row.as_array()
                .map(|cells| cells.iter().map(cell_to_string).collect())
                .unwrap_or_default()
        })
        .collect()
}

fn cell_to_string(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A cell as sent under `USER_ENTERED`.
///
/// The display-link column is entered as a formula and `HasAmendments` as a
/// boolean. Every other non-empty cell gets a leading `'` so Sheets keeps it
/// as literal text: `FORMATTED_VALUE` then reads back exactly what the
/// reconciler wrote, with no number, date, or formula parsing.
pub fn user_entered_cell(label: Option<&str>, cell: &str) -> String {
    if cell.is_empty() {
        return String::new();
    }
    match label.and_then(Column::from_label) {
        Some(Column::DisplayLink) => cell.to_string(),
        Some(Column::HasAmendments) if cell == "TRUE" || cell == "FALSE" => cell.to_string(),
        _ => format!("'{cell}"),
    }
}

/// Encode a row laid out under `header`.
pub fn encode_row(header: &[String], cells: &[String]) -> Vec<String> {
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| user_entered_cell(header.get(i).map(String::as_str), cell))
        .collect()
}

/// Body for a `values:batchUpdate` covering every patch.
pub fn batch_update_body(sheet: &str, header: &[String], patches: &[RowPatch]) -> Value {
    let data: Vec<Value> = patches
        .iter()
        .map(|p| {
            json!({
                "range": row_range(sheet, p.position, 1),
                "majorDimension": "ROWS",
                "values": [encode_row(header, &p.cells)],
            })
        })
        .collect();
    json!({ "valueInputOption": "USER_ENTERED", "data": data })
}

// ============================================================================
// Store
// ============================================================================

pub struct SheetsRowStore {
    client: Client,
    token: String,
    spreadsheet_id: String,
    sheet: String,
    api_base: String,
    /// Last header seen on read or written; decides how cells are entered.
    header: Vec<String>,
}

impl SheetsRowStore {
    pub fn new(token: &str, spreadsheet_id: &str, sheet: &str) -> Result<Self, SheetsError> {
        Self::with_api_base(token, spreadsheet_id, sheet, SHEETS_API)
    }

    pub fn with_api_base(
        token: &str,
        spreadsheet_id: &str,
        sheet: &str,
        api_base: &str,
    ) -> Result<Self, SheetsError> {
        if token.trim().is_empty() {
            return Err(SheetsError::MissingToken);
        }
        Ok(Self {
            client: build_client()?,
            token: token.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet: sheet.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            header: header_labels(),
        })
    }

    /// Read the token from [`TOKEN_ENV`].
    pub fn token_from_env() -> Result<String, SheetsError> {
        std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or(SheetsError::MissingToken)
    }

    /// Find a spreadsheet by title through Drive, creating it if absent.
    pub fn open_by_name(token: &str, name: &str, sheet: &str) -> Result<Self, SheetsError> {
        if token.trim().is_empty() {
            return Err(SheetsError::MissingToken);
        }
        let client = build_client()?;
        let query = format!(
            "name = '{}' and mimeType = '{SPREADSHEET_MIME}' and trashed = false",
            name.replace('\\', "\\\\").replace('\'', "\\'")
        );
        let found = send(
            client
                .get(DRIVE_API)
                .bearer_auth(token)
                .query(&[("q", query.as_str()), ("fields", "files(id,name)"), ("pageSize", "1")]),
        )?;

        let existing = found
            .get("files")
            .and_then(Value::as_array)
            .and_then(|files| files.first())
            .and_then(|f| f.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let spreadsheet_id = match existing {
            Some(id) => {
                tracing::info!(spreadsheet = %id, name, "opened spreadsheet by name");
                id
            }
            None => {
                let created = send(client.post(SHEETS_API).bearer_auth(token).json(&json!({
                    "properties": { "title": name },
                    "sheets": [{ "properties": { "title": sheet } }],
                })))?;
                let id = created
                    .get("spreadsheetId")
                    .and_then(Value::as_str)
                    .ok_or_else(|| SheetsError::Decode("create response lacks spreadsheetId".into()))?
                    .to_string();
                tracing::info!(spreadsheet = %id, name, "created spreadsheet");
                id
            }
        };

        Ok(Self {
            client,
            token: token.to_string(),
            spreadsheet_id,
            sheet: sheet.to_string(),
            api_base: SHEETS_API.to_string(),
            header: header_labels(),
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// `<base>/<id>/values/<range><suffix>`
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, SheetsError> {
        let mut url = Url::parse(&self.api_base).map_err(|e| SheetsError::Http(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::Http(format!("{} cannot be a base", self.api_base)))?
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&format!("{range}{suffix}"));
        Ok(url)
    }

    fn batch_url(&self) -> Result<Url, SheetsError> {
        let mut url = Url::parse(&self.api_base).map_err(|e| SheetsError::Http(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::Http(format!("{} cannot be a base", self.api_base)))?
            .push(&self.spreadsheet_id)
            .push("values:batchUpdate");
        Ok(url)
    }

    fn encode(&self, rows: &[Vec<String>]) -> Vec<Vec<String>> {
        rows.iter().map(|row| encode_row(&self.header, row)).collect()
    }

    fn put_rows(&self, range: &str, rows: &[Vec<String>], input: &str) -> Result<(), SheetsError> {
        let url = self.values_url(range, "")?;
        send(
            self.client
                .put(url)
                .bearer_auth(&self.token)
                .query(&[("valueInputOption", input)])
                .json(&json!({ "range": range, "majorDimension": "ROWS", "values": rows })),
        )?;
        Ok(())
    }
}

impl RowStore for SheetsRowStore {
    fn read_all(&mut self) -> Result<Vec<Vec<String>>, StoreError> {
        let range = full_range(&self.sheet);
        let url = self
            .values_url(&range, "")
            .map_err(|e| StoreError::Read(e.to_string()))?;
        let body = send(
            self.client
                .get(url)
                .bearer_auth(&self.token)
                .query(&[("majorDimension", "ROWS"), ("valueRenderOption", "FORMATTED_VALUE")]),
        )
        .map_err(|e| StoreError::Read(e.to_string()))?;
        let grid = parse_values(&body);
        if let Some(header) = grid.first() {
            self.header = header.clone();
        }
        Ok(grid)
    }

    fn write_header(&mut self, labels: &[String]) -> Result<(), StoreError> {
        let range = row_range(&self.sheet, 1, 1);
        self.put_rows(&range, &[labels.to_vec()], "RAW")
            .map_err(|e| StoreError::Header(e.to_string()))?;
        self.header = labels.to_vec();
        Ok(())
    }

    fn append_rows(&mut self, rows: &[Vec<String>]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let range = full_range(&self.sheet);
        let rows = self.encode(rows);
        let result = self.values_url(&range, ":append").and_then(|url| {
            send(
                self.client
                    .post(url)
                    .bearer_auth(&self.token)
                    .query(&[
                        ("valueInputOption", "USER_ENTERED"),
                        ("insertDataOption", "INSERT_ROWS"),
                    ])
                    .json(&json!({ "majorDimension": "ROWS", "values": rows })),
            )
        });
        result.map(|_| ()).map_err(|e| StoreError::Append(e.to_string()))
    }

    fn patch_range(&mut self, position: usize, rows: &[Vec<String>]) -> Result<(), StoreError> {
        if position == 0 {
            return Err(StoreError::Patch {
                position,
                message: "positions are 1-based".into(),
            });
        }
        let range = row_range(&self.sheet, position, rows.len());
        self.put_rows(&range, &self.encode(rows), "USER_ENTERED")
            .map_err(|e| StoreError::Patch {
                position,
                message: e.to_string(),
            })
    }

    fn patch_rows(&mut self, patches: &[RowPatch]) -> Result<(), StoreError> {
        let Some(first) = patches.first() else {
            return Ok(());
        };
        let position = first.position;
        let body = batch_update_body(&self.sheet, &self.header, patches);
        let result = self.batch_url().and_then(|url| {
            send(self.client.post(url).bearer_auth(&self.token).json(&body))
        });
        result.map(|_| ()).map_err(|e| StoreError::Patch {
            position,
            message: e.to_string(),
        })
    }
}

fn build_client() -> Result<Client, SheetsError> {
    Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(|e| SheetsError::Http(format!("failed to build http client: {e}")))
}

fn send(request: RequestBuilder) -> Result<Value, SheetsError> {
    let resp = request.send().map_err(|e| SheetsError::Http(e.to_string()))?;
    let status = resp.status();
    let text = resp.text().map_err(|e| SheetsError::Http(e.to_string()))?;
    if !status.is_success() {
        return Err(SheetsError::Status {
            status: status.as_u16(),
            body: text.chars().take(512).collect(),
        });
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| SheetsError::Decode(e.to_string()))
}
