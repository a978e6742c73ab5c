//! Versioned per-model price table.
//!
//! The table is an injected configuration value, constructed from compiled
//! defaults or a TOML file. There is no process-wide price list: every
//! `CostGuard` owns the table it was built with, and the table's version
//! string is stamped on each ledger entry it prices.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CostError, CostResult};

/// Price per 1000 units for one model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ModelPrice {
    /// Cost per 1000 input units
    pub input_per_1k: f64,
    /// Cost per 1000 output units
    pub output_per_1k: f64,
}

impl ModelPrice {
    /// Calculate the cost of one invocation.
    pub fn calculate(&self, input_units: u64, output_units: u64) -> f64 {
        let input_cost = (input_units as f64 / 1000.0) * self.input_per_1k;
        let output_cost = (output_units as f64 / 1000.0) * self.output_per_1k;
        input_cost + output_cost
    }
}

/// A versioned table of per-model prices with a fallback rate.
///
/// An unrecognized model never fails the run; it is priced at the
/// conservative default rate and the lookup reports the miss so the caller
/// can warn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTable {
    /// Version identifier recorded on every ledger entry
    pub version: String,
    /// Fallback price for unrecognized models
    pub default: ModelPrice,
    /// Per-model prices keyed by model identifier
    #[serde(default)]
    pub models: HashMap<String, ModelPrice>,
}

impl PriceTable {
    /// Compiled-in defaults, usable without any configuration file.
    pub fn builtin() -> Self {
        let mut models = HashMap::new();
        models.insert(
            "gpt-5.2".to_string(),
            ModelPrice { input_per_1k: 0.005, output_per_1k: 0.015 },
        );
        models.insert(
            "gpt-5-mini".to_string(),
            ModelPrice { input_per_1k: 0.0003, output_per_1k: 0.0012 },
        );
        models.insert(
            "gpt-5-nano".to_string(),
            ModelPrice { input_per_1k: 0.0001, output_per_1k: 0.0004 },
        );
        models.insert(
            "claude-opus-4.5".to_string(),
            ModelPrice { input_per_1k: 0.015, output_per_1k: 0.075 },
        );
        models.insert(
            "claude-sonnet-4.5".to_string(),
            ModelPrice { input_per_1k: 0.003, output_per_1k: 0.015 },
        );

        Self {
            version: "builtin-1".to_string(),
            default: ModelPrice { input_per_1k: 0.01, output_per_1k: 0.03 },
            models,
        }
    }

    /// Parse a table from TOML text.
    pub fn from_toml_str(text: &str) -> CostResult<Self> {
        let table: Self =
            toml::from_str(text).map_err(|e| CostError::PriceTable(e.to_string()))?;
        if table.version.trim().is_empty() {
            return Err(CostError::PriceTable("version must not be empty".to_string()));
        }
        Ok(table)
    }

    /// Load a table from a TOML file.
    pub fn load(path: &Path) -> CostResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Look up the price for a model.
    ///
    /// Returns the price and whether the model was found in the table;
    /// a miss falls back to the default rate.
    pub fn price_for(&self, model_id: &str) -> (ModelPrice, bool) {
        match self.models.get(model_id) {
            Some(price) => (*price, true),
            None => (self.default, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_calculation() {
        let price = ModelPrice { input_per_1k: 0.0003, output_per_1k: 0.0012 };
        // 1000 input + 500 output = 0.0003 + 0.0006
        let cost = price.calculate(1000, 500);
        assert!((cost - 0.0009).abs() < 1e-9);
    }

    #[test]
    fn test_known_model_lookup() {
        let table = PriceTable::builtin();
        let (price, known) = table.price_for("gpt-5-mini");
        assert!(known);
        assert_eq!(price.input_per_1k, 0.0003);
    }

    #[test]
    fn test_unknown_model_falls_back_to_default() {
        let table = PriceTable::builtin();
        let (price, known) = table.price_for("mystery-model-9000");
        assert!(!known);
        assert_eq!(price, table.default);
    }

    #[test]
    fn test_from_toml() {
        let text = r#"
version = "2026-08"

[default]
input_per_1k = 0.02
output_per_1k = 0.06

[models."tiny-model"]
input_per_1k = 0.0001
output_per_1k = 0.0002
"#;
        let table = PriceTable::from_toml_str(text).unwrap();
        assert_eq!(table.version, "2026-08");
        let (price, known) = table.price_for("tiny-model");
        assert!(known);
        assert_eq!(price.output_per_1k, 0.0002);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("prices.toml");
        std::fs::write(
            &path,
            r#"
version = "2026-08"

[default]
input_per_1k = 0.02
output_per_1k = 0.06
"#,
        )
        .unwrap();

        let table = PriceTable::load(&path).unwrap();
        assert_eq!(table.version, "2026-08");
        assert_eq!(table.default.input_per_1k, 0.02);

        let missing = PriceTable::load(&dir.path().join("absent.toml"));
        assert!(missing.is_err());
    }

    #[test]
    fn test_empty_version_rejected() {
        let text = r#"
version = ""

[default]
input_per_1k = 0.02
output_per_1k = 0.06
"#;
        assert!(PriceTable::from_toml_str(text).is_err());
    }
}
