//! Pure DataGOL table API client.
//!
//! Reads rows from workspace tables and appends rows one at a time.

pub mod error;

pub use error::{DatagolError, Result};

use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};

/// Rows requested per table read. Tables this client serves are small
/// lookup lists, so a single page is enough.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

pub struct DatagolClient {
    client: reqwest::Client,
    base_url: String,
    workspace_id: String,
    token: String,
}

#[derive(Serialize)]
struct PageRequest {
    #[serde(rename = "requestPageDetails")]
    request_page_details: PageDetails,
}

#[derive(Serialize)]
struct PageDetails {
    #[serde(rename = "pageNumber")]
    page_number: u32,
    #[serde(rename = "pageSize")]
    page_size: u32,
}

#[derive(Serialize)]
struct RowRequest<'a> {
    position: u32,
    #[serde(rename = "cellValues")]
    cell_values: &'a Map<String, Value>,
}

impl DatagolClient {
    pub fn new(base_url: &str, workspace_id: &str, token: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            workspace_id: workspace_id.to_string(),
            token: token.to_string(),
        }
    }

    /// Read the first page of a table's rows as raw JSON objects.
    pub async fn table_rows(&self, table_id: &str, page_size: u32) -> Result<Vec<Value>> {
        let url = format!(
            "{}/workspaces/{}/tables/{}/data/external",
            self.base_url, self.workspace_id, table_id
        );
        let body = PageRequest {
            request_page_details: PageDetails {
                page_number: 1,
                page_size,
            },
        };

        let resp = self
            .client
            .post(&url)
            .header("x-auth-token", &self.token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(DatagolError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let value: Value = resp.json().await?;
        let rows = extract_rows(value);
        tracing::debug!(table_id, count = rows.len(), "Fetched DataGOL rows");
        Ok(rows)
    }

    /// Append one row to a table.
    pub async fn add_row(&self, table_id: &str, cell_values: &Map<String, Value>) -> Result<()> {
        let url = format!(
            "{}/workspaces/{}/tables/{}/rows",
            self.base_url, self.workspace_id, table_id
        );
        let body = RowRequest {
            position: 0,
            cell_values,
        };

        let resp = self
            .client
            .post(&url)
            .header("x-auth-token", &self.token)
            .header("Accept", "*/*")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(DatagolError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

/// Row arrays come back under `data`, `list` or `items`, or as a bare array.
fn extract_rows(value: Value) -> Vec<Value> {
    match value {
        Value::Array(rows) => rows,
        Value::Object(mut obj) => ["data", "list", "items"]
            .iter()
            .find_map(|key| match obj.remove(*key) {
                Some(Value::Array(rows)) => Some(rows),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rows_found_under_any_envelope() {
        assert_eq!(extract_rows(json!({"data": [{"a": 1}]})).len(), 1);
        assert_eq!(extract_rows(json!({"list": [{"a": 1}, {"a": 2}]})).len(), 2);
        assert_eq!(extract_rows(json!({"items": []})).len(), 0);
        assert_eq!(extract_rows(json!([{"a": 1}])).len(), 1);
    }

    #[test]
    fn unexpected_shapes_yield_no_rows() {
        assert!(extract_rows(json!({"data": "nope"})).is_empty());
        assert!(extract_rows(json!(42)).is_empty());
        assert!(extract_rows(json!({"other": [1]})).is_empty());
    }

    #[test]
    fn row_request_serializes_cell_values() {
        let mut cells = Map::new();
        cells.insert("title".into(), json!("Analyst"));
        let body = serde_json::to_value(RowRequest {
            position: 0,
            cell_values: &cells,
        })
        .unwrap();
        assert_eq!(body, json!({"position": 0, "cellValues": {"title": "Analyst"}}));
    }
}
