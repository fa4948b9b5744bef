use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Response of `GET /api/compare-stocks/`.
///
/// Prices and changes are kept as raw JSON: the backend sends numbers for
/// known symbols and error strings for unknown ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockComparison {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub prices: BTreeMap<String, Value>,
    #[serde(default)]
    pub changes: BTreeMap<String, Value>,
}

impl StockComparison {
    /// Rows of (symbol, price, change) in symbol order
    pub fn rows(&self) -> Vec<(String, String, String)> {
        self.prices
            .iter()
            .map(|(symbol, price)| {
                let change = self
                    .changes
                    .get(symbol)
                    .map(render_value)
                    .unwrap_or_else(|| "-".to_string());
                (symbol.clone(), render_value(price), change)
            })
            .collect()
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
