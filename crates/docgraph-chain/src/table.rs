//! Table-row query shapes (`/v1/chain/get_table_rows`).

use serde::{Deserialize, Serialize};

/// Key type of a secondary index, as named by the table API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    I64,
    Name,
    Sha256,
}

/// A range query against one contract table.
///
/// Built with the chained setters; serializes directly to the request body
/// the chain node expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRowsRequest {
    pub code: String,
    pub scope: String,
    pub table: String,
    pub json: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_type: Option<KeyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<String>,
    pub limit: u32,
    pub reverse: bool,
}

impl TableRowsRequest {
    /// Query `table` in `code`'s contract, scoped to `scope`. Defaults to the
    /// primary index, unbounded, ten rows, forward order.
    pub fn new(code: impl Into<String>, scope: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            scope: scope.into(),
            table: table.into(),
            json: true,
            index_position: None,
            key_type: None,
            lower_bound: None,
            upper_bound: None,
            limit: 10,
            reverse: false,
        }
    }

    pub fn index(mut self, position: impl Into<String>, key_type: KeyType) -> Self {
        self.index_position = Some(position.into());
        self.key_type = Some(key_type);
        self
    }

    pub fn bounds(mut self, lower: impl Into<String>, upper: impl Into<String>) -> Self {
        self.lower_bound = Some(lower.into());
        self.upper_bound = Some(upper.into());
        self
    }

    /// Equality query expressed as a degenerate range.
    pub fn exact(self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.bounds(key.clone(), key)
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }
}

/// Raw rows returned by a table query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRows {
    #[serde(default)]
    pub rows: Vec<serde_json::Value>,
    /// Whether more rows exist past `limit`.
    #[serde(default)]
    pub more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_key: Option<String>,
}

impl TableRows {
    /// Decode every row into `T`.
    pub fn decode<T: serde::de::DeserializeOwned>(self) -> Result<Vec<T>, serde_json::Error> {
        self.rows.into_iter().map(serde_json::from_value).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_query_serializes_degenerate_range() {
        let req = TableRowsRequest::new("docs.hypha", "docs.hypha", "edges")
            .index("2", KeyType::Sha256)
            .exact("abcd")
            .limit(1000);

        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["index_position"], "2");
        assert_eq!(body["key_type"], "sha256");
        assert_eq!(body["lower_bound"], "abcd");
        assert_eq!(body["upper_bound"], "abcd");
        assert_eq!(body["limit"], 1000);
        assert_eq!(body["json"], true);
        assert_eq!(body["reverse"], false);
    }

    #[test]
    fn primary_query_omits_index_fields() {
        let req = TableRowsRequest::new("docs.hypha", "docs.hypha", "documents")
            .limit(1)
            .reverse();
        let body = serde_json::to_value(&req).unwrap();
        assert!(body.get("index_position").is_none());
        assert!(body.get("lower_bound").is_none());
        assert_eq!(body["reverse"], true);
    }

    #[test]
    fn rows_response_tolerates_missing_fields() {
        let rows: TableRows = serde_json::from_str(r#"{"rows":[]}"#).unwrap();
        assert!(rows.rows.is_empty());
        assert!(!rows.more);
    }
}
