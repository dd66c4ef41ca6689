//! Tabular product feed.
//!
//! The catalog is maintained by hand in a spreadsheet, one row per variant.
//! [`RowSource`] abstracts where those rows come from so the snapshot cache can
//! be driven by the Google Sheets client in production and by fixed rows in
//! tests.

mod auth;
mod client;

use async_trait::async_trait;
use thiserror::Error;

pub use auth::{normalize_private_key, ServiceAccount};
pub use client::GoogleSheetsSource;

/// Column headers of the catalog sheet.
pub mod columns {
    pub const MODEL_ID: &str = "ID_Modelo";
    pub const NAME: &str = "Nombre";
    pub const CATEGORY: &str = "Categoria";
    pub const STORAGE: &str = "Almacenamiento";
    pub const CONDITION: &str = "Condicion";
    pub const IMAGE: &str = "Imagen";
    pub const FEATURED: &str = "Destacado";
    pub const ACTIVE: &str = "Activo";
}

/// One unvalidated sheet row. Cells the sheet left blank are `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SheetRow {
    pub model_id: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub storage: Option<String>,
    pub condition: Option<String>,
    pub image: Option<String>,
    pub featured: Option<String>,
    pub active: Option<String>,
}

impl SheetRow {
    /// Builds a row from a header line and the cells beneath it. Unknown
    /// headers are ignored; missing trailing cells stay `None`.
    pub fn from_cells(headers: &[String], cells: &[String]) -> Self {
        let mut row = Self::default();
        for (header, cell) in headers.iter().zip(cells) {
            if cell.is_empty() { continue; }
            let slot = match header.trim() {
                columns::MODEL_ID => &mut row.model_id,
                columns::NAME => &mut row.name,
                columns::CATEGORY => &mut row.category,
                columns::STORAGE => &mut row.storage,
                columns::CONDITION => &mut row.condition,
                columns::IMAGE => &mut row.image,
                columns::FEATURED => &mut row.featured,
                columns::ACTIVE => &mut row.active,
                _ => continue,
            };
            *slot = Some(cell.clone());
        }
        row
    }
}

#[derive(Error, Debug)]
pub enum SheetsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Google API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid service account key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Spreadsheet has no sheets")]
    NoSheets,

    #[error("Sheet has no header row")]
    MissingHeader,
}

/// Anything that can hand back the full list of catalog rows in sheet order.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_rows(&self) -> Result<Vec<SheetRow>, SheetsError>;
}

/// Splits a raw values grid into rows keyed by the first line's headers.
pub fn rows_from_values(values: Vec<Vec<String>>) -> Result<Vec<SheetRow>, SheetsError> {
    let mut lines = values.into_iter();
    let headers = lines.next().ok_or(SheetsError::MissingHeader)?;
    Ok(lines
        .filter(|cells| cells.iter().any(|c| !c.is_empty()))
        .map(|cells| SheetRow::from_cells(&headers, &cells))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> { cells.iter().map(|c| c.to_string()).collect() }

    #[test]
    fn test_rows_from_values() {
        let values = vec![
            strings(&["ID_Modelo", "Nombre", "Categoria", "Almacenamiento", "Condicion", "Imagen", "Destacado", "Activo"]),
            strings(&["IP14", "iPhone 14", "iphone", "128GB", "Sellado", "", "TRUE", "TRUE"]),
            strings(&["", "", ""]),
            strings(&["IP13", "iPhone 13", "iphone", "256GB", "Usado excelente"]),
        ];
        let rows = rows_from_values(values).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].model_id.as_deref(), Some("IP14"));
        assert_eq!(rows[0].image, None);
        assert_eq!(rows[0].featured.as_deref(), Some("TRUE"));
        assert_eq!(rows[1].condition.as_deref(), Some("Usado excelente"));
        assert_eq!(rows[1].active, None);
    }

    #[test]
    fn test_columns_follow_header_order() {
        let headers = strings(&["Activo", "Extra", "ID_Modelo"]);
        let row = SheetRow::from_cells(&headers, &strings(&["TRUE", "ignored", "MBA"]));
        assert_eq!(row.active.as_deref(), Some("TRUE"));
        assert_eq!(row.model_id.as_deref(), Some("MBA"));
        assert_eq!(row.name, None);
    }

    #[test]
    fn test_empty_grid_has_no_header() {
        assert!(matches!(rows_from_values(vec![]), Err(SheetsError::MissingHeader)));
    }
}
