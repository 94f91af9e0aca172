//! Google Sheets v4 REST backend.
//!
//! # Responsibility
//! - Fetch whole sheets via `values.get`.
//! - Write a status cell's text and fill in one `updateCells` batch.
//!
//! # Invariants
//! - Every HTTP request waits for its own `RequestPacer` slot.
//! - An unknown sheet title maps to `GridError::SheetNotFound`.
//! - Sheet ids needed for formatting are fetched once and cached.

use crate::config::SheetsCredentials;
use crate::grid::client::{
    CellFill, GridClient, GridError, GridResult, RequestPacer, SheetValues,
};
use crate::grid::layout::GridPosition;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: SheetValues,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

/// `GridClient` talking to the Google Sheets REST API with a bearer token.
pub struct SheetsApiClient {
    agent: ureq::Agent,
    credentials: SheetsCredentials,
    pacer: RequestPacer,
    sheet_ids: Mutex<Option<HashMap<String, i64>>>,
}

impl SheetsApiClient {
    /// Client paced at the backend limit of one request per second.
    pub fn new(credentials: SheetsCredentials) -> Self {
        Self::with_pacer(credentials, RequestPacer::new())
    }

    pub fn with_pacer(credentials: SheetsCredentials, pacer: RequestPacer) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(HTTP_TIMEOUT).build();
        Self {
            agent,
            credentials,
            pacer,
            sheet_ids: Mutex::new(None),
        }
    }

    /// Paced GET of `url`.
    fn get(&self, url: &str, query: &[(&str, &str)], sheet: &str) -> GridResult<ureq::Response> {
        let mut request = self
            .agent
            .get(url)
            .set("Authorization", &self.authorization());
        for (name, value) in query {
            request = request.query(name, value);
        }
        self.pacer.wait_turn();
        request.call().map_err(|err| map_ureq_error(err, sheet))
    }

    /// Paced POST of a JSON body to `url`.
    fn post_json(&self, url: &str, body: serde_json::Value, sheet: &str) -> GridResult<()> {
        let request = self
            .agent
            .post(url)
            .set("Authorization", &self.authorization());
        self.pacer.wait_turn();
        request
            .send_json(body)
            .map_err(|err| map_ureq_error(err, sheet))?;
        Ok(())
    }

    fn spreadsheet_url(&self) -> String {
        format!(
            "{}/v4/spreadsheets/{}",
            self.credentials.api_base.trim_end_matches('/'),
            urlencoding::encode(&self.credentials.spreadsheet_id)
        )
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/values/{}",
            self.spreadsheet_url(),
            urlencoding::encode(range)
        )
    }

    fn authorization(&self) -> String {
        format!("Bearer {}", self.credentials.access_token)
    }

    fn sheet_id(&self, sheet: &str) -> GridResult<i64> {
        let mut cache = match self.sheet_ids.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if cache.is_none() {
            let response = self.get(
                &self.spreadsheet_url(),
                &[("fields", "sheets.properties(sheetId,title)")],
                sheet,
            )?;
            let meta: SpreadsheetMeta = response
                .into_json()
                .map_err(|err| GridError::InvalidResponse(err.to_string()))?;
            *cache = Some(
                meta.sheets
                    .into_iter()
                    .map(|entry| (entry.properties.title, entry.properties.sheet_id))
                    .collect(),
            );
        }

        cache
            .as_ref()
            .and_then(|ids| ids.get(sheet).copied())
            .ok_or_else(|| GridError::SheetNotFound(sheet.to_string()))
    }
}

impl GridClient for SheetsApiClient {
    fn read_sheet(&self, sheet: &str) -> GridResult<SheetValues> {
        let response = self.get(&self.values_url(&quote_sheet_title(sheet)), &[], sheet)?;
        let range: ValueRange = response
            .into_json()
            .map_err(|err| GridError::InvalidResponse(err.to_string()))?;
        Ok(range.values)
    }

    fn write_cell(
        &self,
        sheet: &str,
        position: GridPosition,
        text: &str,
        fill: CellFill,
    ) -> GridResult<()> {
        let sheet_id = self.sheet_id(sheet)?;
        self.post_json(
            &format!("{}:batchUpdate", self.spreadsheet_url()),
            update_cell_request(sheet_id, position, text, fill),
            sheet,
        )
    }
}

/// `batchUpdate` body setting one cell's text and background together.
fn update_cell_request(
    sheet_id: i64,
    position: GridPosition,
    text: &str,
    fill: CellFill,
) -> serde_json::Value {
    let (red, green, blue) = fill.rgb();
    json!({
        "requests": [{
            "updateCells": {
                "start": {
                    "sheetId": sheet_id,
                    "rowIndex": position.row,
                    "columnIndex": position.column,
                },
                "rows": [{
                    "values": [{
                        "userEnteredValue": { "stringValue": text },
                        "userEnteredFormat": {
                            "backgroundColor": { "red": red, "green": green, "blue": blue }
                        },
                    }]
                }],
                "fields": "userEnteredValue,userEnteredFormat.backgroundColor",
            }
        }]
    })
}

/// Quotes a sheet title for A1 ranges (`'it''s'`).
fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn map_ureq_error(err: ureq::Error, sheet: &str) -> GridError {
    match err {
        ureq::Error::Status(status, response) => {
            let message = response.into_string().unwrap_or_default();
            if is_missing_sheet(status, &message) {
                GridError::SheetNotFound(sheet.to_string())
            } else {
                GridError::Http { status, message }
            }
        }
        ureq::Error::Transport(transport) => GridError::Transport(transport.to_string()),
    }
}

fn is_missing_sheet(status: u16, body: &str) -> bool {
    status == 400 && body.contains("Unable to parse range")
}

#[cfg(test)]
mod tests {
    use super::{is_missing_sheet, quote_sheet_title, update_cell_request, SheetsApiClient};
    use crate::config::SheetsCredentials;
    use crate::grid::client::CellFill;
    use crate::grid::layout::GridPosition;

    fn client() -> SheetsApiClient {
        SheetsApiClient::new(SheetsCredentials {
            spreadsheet_id: "abc123".to_string(),
            access_token: "token".to_string(),
            api_base: "https://sheets.example.test/".to_string(),
        })
    }

    #[test]
    fn builds_encoded_value_urls() {
        let url = client().values_url(&quote_sheet_title("1"));
        assert_eq!(
            url,
            "https://sheets.example.test/v4/spreadsheets/abc123/values/%271%27"
        );
    }

    #[test]
    fn quotes_titles_with_apostrophes() {
        assert_eq!(quote_sheet_title("команды"), "'команды'");
        assert_eq!(quote_sheet_title("it's"), "'it''s'");
    }

    #[test]
    fn recognizes_unknown_range_errors() {
        assert!(is_missing_sheet(400, "Unable to parse range: '11'"));
        assert!(!is_missing_sheet(400, "Invalid value"));
        assert!(!is_missing_sheet(403, "Unable to parse range"));
    }

    #[test]
    fn status_write_is_a_single_update_cells_request() {
        let body = update_cell_request(7, GridPosition::new(1, 11), "Сделано", CellFill::Done);

        let requests = body["requests"].as_array().expect("requests array");
        assert_eq!(requests.len(), 1);
        let update = &requests[0]["updateCells"];
        assert_eq!(update["start"]["sheetId"], 7);
        assert_eq!(update["start"]["rowIndex"], 11);
        assert_eq!(update["start"]["columnIndex"], 1);
        let cell = &update["rows"][0]["values"][0];
        assert_eq!(cell["userEnteredValue"]["stringValue"], "Сделано");
        assert!(cell["userEnteredFormat"]["backgroundColor"].is_object());
        assert_eq!(
            update["fields"],
            "userEnteredValue,userEnteredFormat.backgroundColor"
        );
    }
}
