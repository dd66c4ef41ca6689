//! Google Sheets API v4 client.

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{rows_from_values, RowSource, ServiceAccount, SheetRow, SheetsError};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Deserialize)]
struct Spreadsheet { #[serde(default)] sheets: Vec<Sheet> }

#[derive(Debug, Deserialize)]
struct Sheet { properties: SheetProperties }

#[derive(Debug, Deserialize)]
struct SheetProperties { title: String, #[serde(default)] index: u32 }

#[derive(Debug, Deserialize)]
struct ValueRange { #[serde(default)] values: Vec<Vec<String>> }

/// Reads catalog rows from the first sheet of a spreadsheet.
#[derive(Clone, Debug)]
pub struct GoogleSheetsSource {
    http: reqwest::Client,
    account: ServiceAccount,
    spreadsheet_id: String,
}

impl GoogleSheetsSource {
    pub fn new(account: ServiceAccount, spreadsheet_id: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), account, spreadsheet_id: spreadsheet_id.into() }
    }

    fn url(&self, segments: &[&str]) -> Result<Url, SheetsError> {
        let mut url = Url::parse(SHEETS_API).map_err(|e| SheetsError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| SheetsError::InvalidUrl(SHEETS_API.to_string()))?
            .push(&self.spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    async fn first_sheet_title(&self, token: &str) -> Result<String, SheetsError> {
        let mut url = self.url(&[])?;
        url.query_pairs_mut().append_pair("fields", "sheets.properties(title,index)");
        let response = self.http.get(url).bearer_auth(token).send().await?;
        let spreadsheet: Spreadsheet = read_json(response).await?;
        spreadsheet
            .sheets
            .into_iter()
            .min_by_key(|s| s.properties.index)
            .map(|s| s.properties.title)
            .ok_or(SheetsError::NoSheets)
    }
}

#[async_trait]
impl RowSource for GoogleSheetsSource {
    #[instrument(skip(self), fields(spreadsheet_id = %self.spreadsheet_id))]
    async fn fetch_rows(&self) -> Result<Vec<SheetRow>, SheetsError> {
        let token = self.account.access_token(&self.http).await?;
        let title = self.first_sheet_title(&token).await?;
        let range = format!("'{}'", title.replace('\'', "''"));
        let url = self.url(&["values", &range])?;
        let response = self.http.get(url).bearer_auth(&token).send().await?;
        let grid: ValueRange = read_json(response).await?;
        debug!(sheet = %title, lines = grid.values.len(), "Fetched sheet values");
        rows_from_values(grid.values)
    }
}

/// Decodes a JSON body, turning non-success statuses into [`SheetsError::Status`].
pub(super) async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SheetsError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SheetsError::Status {
            status: status.as_u16(),
            body: body.chars().take(ERROR_BODY_LIMIT).collect(),
        });
    }
    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_url_escapes_title() {
        let source = GoogleSheetsSource::new(ServiceAccount::new("svc@example.com", "k"), "abc123");
        let url = source.url(&["values", "'Hoja 1'"]).unwrap();
        assert_eq!(url.as_str(), "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/'Hoja%201'");
    }

    #[test]
    fn test_spreadsheet_metadata_parses() {
        let json = r#"{"sheets":[{"properties":{"title":"Stock","index":1}},{"properties":{"title":"Catalogo"}}]}"#;
        let sheet: Spreadsheet = serde_json::from_str(json).unwrap();
        let first = sheet.sheets.into_iter().min_by_key(|s| s.properties.index).unwrap();
        assert_eq!(first.properties.title, "Catalogo");
    }

    #[test]
    fn test_empty_value_range() {
        let grid: ValueRange = serde_json::from_str(r#"{"range":"A1:Z1000","majorDimension":"ROWS"}"#).unwrap();
        assert!(grid.values.is_empty());
    }
}
