//! Order records keyed by order identifier
//!
//! An [`OrderBook`] maps a trimmed order identifier to one [`OrderRecord`].
//! Ingestion accepts:
//! - a JSON list of objects, keyed by their `numero_commande` field;
//! - a JSON object `{order_id: {...}}` (non-object values become `{"value": v}`);
//! - CSV with a `numero_commande` column (delimiter sniffed from the header).
//!
//! String values are trimmed on ingestion. Duplicate keys: last write wins.

use crate::error::RecordError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use std::path::Path;

/// Column / field holding the order identifier
pub const KEY_COLUMN: &str = "numero_commande";

const CSV_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Corrections for one contract
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderRecord {
    fields: IndexMap<String, Value>,
}

impl OrderRecord {
    /// Create empty record
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a field value
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a field; string values are trimmed
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let value = match value.into() {
            Value::String(s) => Value::String(s.trim().to_string()),
            other => other,
        };
        self.fields.insert(key.into(), value);
    }

    /// Raw field value
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Field rendered as trimmed text (`None` when absent)
    ///
    /// Null renders as empty; numbers and booleans as their JSON text.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<String> {
        self.fields.get(key).map(|value| render(value).trim().to_string())
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if record has no field
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in ingestion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn from_object(object: serde_json::Map<String, Value>) -> Self {
        let mut record = Self::new();
        for (key, value) in object {
            record.insert(key, value);
        }
        record
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for OrderRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

/// All order records of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderBook {
    records: IndexMap<String, OrderRecord>,
}

impl OrderBook {
    /// Create empty book
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under a trimmed key
    ///
    /// Blank keys are ignored. Returns the replaced record, if any.
    pub fn insert(&mut self, order_id: &str, record: OrderRecord) -> Option<OrderRecord> {
        let key = order_id.trim();
        if key.is_empty() {
            return None;
        }
        self.records.insert(key.to_string(), record)
    }

    /// With a record
    #[must_use]
    pub fn with(mut self, order_id: &str, record: OrderRecord) -> Self {
        self.insert(order_id, record);
        self
    }

    /// Record for an order identifier (exact match; blank never matches)
    #[must_use]
    pub fn get(&self, order_id: &str) -> Option<&OrderRecord> {
        if order_id.is_empty() {
            return None;
        }
        self.records.get(order_id)
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if book is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Order identifiers in ingestion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Parse from JSON string
    ///
    /// # Errors
    /// Returns error if JSON is invalid or neither a list nor an object
    pub fn from_json_str(json: &str) -> Result<Self, RecordError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json_value(value)
    }

    /// Build from a parsed JSON value
    ///
    /// # Errors
    /// Returns `RecordError::UnexpectedShape` for scalars
    pub fn from_json_value(value: Value) -> Result<Self, RecordError> {
        let mut book = Self::new();
        match value {
            Value::Array(rows) => {
                for row in rows {
                    let Value::Object(object) = row else {
                        tracing::warn!("skipping non-object order row");
                        continue;
                    };
                    let key = object.get(KEY_COLUMN).map(render).unwrap_or_default();
                    book.insert(&key, OrderRecord::from_object(object));
                }
            }
            Value::Object(map) => {
                for (key, row) in map {
                    let record = match row {
                        Value::Object(object) => OrderRecord::from_object(object),
                        other => OrderRecord::new().with("value", other),
                    };
                    book.insert(&key, record);
                }
            }
            _ => return Err(RecordError::UnexpectedShape),
        }
        Ok(book)
    }

    /// Parse CSV text
    ///
    /// # Errors
    /// Returns error if CSV is malformed or lacks the key column
    pub fn from_csv_str(csv_text: &str) -> Result<Self, RecordError> {
        let csv_text = csv_text.trim_start_matches('\u{feff}');
        let delimiter = sniff_delimiter(csv_text);
        Self::from_csv_reader(csv_text.as_bytes(), delimiter)
    }

    /// Parse CSV from a reader with a known delimiter
    ///
    /// Every cell is read as a trimmed string.
    ///
    /// # Errors
    /// Returns error if CSV is malformed or lacks the key column
    pub fn from_csv_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self, RecordError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let key_index = headers
            .iter()
            .position(|h| h == KEY_COLUMN)
            .ok_or_else(|| RecordError::MissingKeyColumn(KEY_COLUMN.to_string()))?;

        let mut book = Self::new();
        for row in csv_reader.records() {
            let row = row?;
            let Some(key) = row.get(key_index) else {
                continue;
            };
            let record: OrderRecord = headers
                .iter()
                .zip(row.iter())
                .map(|(header, cell)| (header.clone(), cell.to_string()))
                .collect();
            book.insert(key, record);
        }
        Ok(book)
    }

    /// Load from file by extension (`.json`, `.csv`, `.txt`)
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed, or has an unknown extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        let content = || std::fs::read_to_string(path).map_err(|e| RecordError::io_error(path, e));

        match extension.as_str() {
            "json" => Self::from_json_str(&content()?),
            "csv" | "txt" => Self::from_csv_str(&content()?),
            _ => Err(RecordError::UnsupportedFormat(extension)),
        }
    }
}

/// Text form of a JSON value
fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Most frequent candidate delimiter in the header line
fn sniff_delimiter(csv_text: &str) -> u8 {
    let header = csv_text.lines().next().unwrap_or_default();
    CSV_DELIMITERS
        .into_iter()
        .map(|d| (d, header.bytes().filter(|b| *b == d).count()))
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map_or(b',', |(d, _)| d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_list_is_keyed_by_order_number() {
        let book = OrderBook::from_json_str(
            r#"[
                {"numero_commande": " CMD-1 ", "statut": " actif "},
                {"numero_commande": 42, "code_site": "S1"},
                {"numero_commande": "", "statut": "ignored"}
            ]"#,
        )
        .unwrap();
        assert_eq!(book.len(), 2);
        assert_eq!(book.get("CMD-1").unwrap().text("statut").as_deref(), Some("actif"));
        assert!(book.get("42").is_some());
    }

    #[test]
    fn json_object_is_keyed_by_property() {
        let book = OrderBook::from_json_str(r#"{" CMD-1 ": {"statut": "actif"}, "CMD-2": "raw"}"#).unwrap();
        assert_eq!(book.keys().collect::<Vec<_>>(), vec!["CMD-1", "CMD-2"]);
        assert_eq!(book.get("CMD-2").unwrap().text("value").as_deref(), Some("raw"));
    }

    #[test]
    fn json_scalar_is_rejected() {
        assert!(matches!(OrderBook::from_json_str("3"), Err(RecordError::UnexpectedShape)));
        assert!(matches!(OrderBook::from_json_str("{"), Err(RecordError::InvalidJson(_))));
    }

    #[test]
    fn duplicate_keys_last_write_wins() {
        let book = OrderBook::from_json_str(
            r#"[{"numero_commande": "A", "statut": "one"}, {"numero_commande": "A", "statut": "two"}]"#,
        )
        .unwrap();
        assert_eq!(book.len(), 1);
        assert_eq!(book.get("A").unwrap().text("statut").as_deref(), Some("two"));
    }

    #[test]
    fn csv_with_semicolons_is_sniffed() {
        let book = OrderBook::from_csv_str("numero_commande;statut;code_site\nCMD-1; actif ;S1\n;x;y\nCMD-2;;S2\n").unwrap();
        assert_eq!(book.len(), 2);
        let first = book.get("CMD-1").unwrap();
        assert_eq!(first.text("statut").as_deref(), Some("actif"));
        assert_eq!(book.get("CMD-2").unwrap().text("statut").as_deref(), Some(""));
    }

    #[test]
    fn csv_without_key_column_fails() {
        let err = OrderBook::from_csv_str("order,statut\n1,actif\n").unwrap_err();
        assert!(matches!(err, RecordError::MissingKeyColumn(_)));
    }

    #[test]
    fn record_text_renders_scalars() {
        let record = OrderRecord::new()
            .with("n", json!(7))
            .with("b", json!(true))
            .with("z", Value::Null)
            .with("s", "  padded  ");
        assert_eq!(record.text("n").as_deref(), Some("7"));
        assert_eq!(record.text("b").as_deref(), Some("true"));
        assert_eq!(record.text("z").as_deref(), Some(""));
        assert_eq!(record.text("s").as_deref(), Some("padded"));
        assert_eq!(record.text("missing"), None);
    }

    #[test]
    fn blank_identifier_never_matches() {
        let book = OrderBook::new().with("A", OrderRecord::new());
        assert!(book.get("").is_none());
        assert!(book.get("A").is_some());
        assert!(book.get(" A").is_none());
    }

    #[test]
    fn from_path_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("orders.json");
        std::fs::write(&json_path, r#"[{"numero_commande": "A"}]"#).unwrap();
        assert_eq!(OrderBook::from_path(&json_path).unwrap().len(), 1);

        let csv_path = dir.path().join("orders.csv");
        std::fs::write(&csv_path, "numero_commande,statut\nA,actif\nB,inactif\n").unwrap();
        assert_eq!(OrderBook::from_path(&csv_path).unwrap().len(), 2);

        let other = dir.path().join("orders.xlsx");
        assert!(matches!(OrderBook::from_path(&other), Err(RecordError::UnsupportedFormat(_))));
    }
}
