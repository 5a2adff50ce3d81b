//! Configuration types and defaults for the interaction pipeline

use serde::{Deserialize, Serialize};

use crate::error::{CastError, CastResult};
use crate::network::context::DEFAULT_CONTEXT_WINDOW;

/// Quotation glyphs that toggle a dialogue span
pub const DEFAULT_QUOTE_GLYPHS: &[&str] = &["\"", "«", "»", "“", "”", "„"];

// =============================================================================
// GraphConfig
// =============================================================================

/// Knobs for scoring, aggregation and normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Recency window used to disambiguate shared aliases. Default: 5
    pub context_window: usize,
    /// Edges below this accumulated weight are dropped. Default: 2.0
    pub min_edge_weight: f64,
    /// Nodes whose remaining outgoing weight is below this are dropped. Default: 3.0
    pub min_node_weight: f64,
    /// Tokens that open/close a dialogue span
    pub quote_glyphs: Vec<String>,
    /// Document worker pool size. Default: 4
    pub workers: usize,
    /// Re-evaluate node strength until stable instead of a single pass. Default: false
    pub prune_to_fixpoint: bool,
    /// Characters resolved in fewer documents than this are dropped before
    /// thresholding. Default: 0 (off)
    pub min_documents: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            context_window: DEFAULT_CONTEXT_WINDOW,
            min_edge_weight: 2.0,
            min_node_weight: 3.0,
            quote_glyphs: DEFAULT_QUOTE_GLYPHS.iter().map(|g| g.to_string()).collect(),
            workers: 4,
            prune_to_fixpoint: false,
            min_documents: 0,
        }
    }
}

impl GraphConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> CastResult<Self> {
        let config: GraphConfig = serde_json::from_str(json)
            .map_err(|e| CastError::config(format!("invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Single-threaded preset (WASM, tests)
    pub fn sequential() -> Self {
        Self {
            workers: 1,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> CastResult<()> {
        if self.context_window == 0 {
            return Err(CastError::config("context_window must be at least 1"));
        }
        if self.workers == 0 {
            return Err(CastError::config("workers must be at least 1"));
        }
        if !self.min_edge_weight.is_finite() || self.min_edge_weight < 0.0 {
            return Err(CastError::config("min_edge_weight must be a non-negative number"));
        }
        if !self.min_node_weight.is_finite() || self.min_node_weight < 0.0 {
            return Err(CastError::config("min_node_weight must be a non-negative number"));
        }
        if self.quote_glyphs.iter().any(|g| g.is_empty()) {
            return Err(CastError::config("quote glyphs must be non-empty strings"));
        }
        Ok(())
    }

    pub fn is_quote_glyph(&self, token: &str) -> bool {
        self.quote_glyphs.iter().any(|g| g == token)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GraphConfig::default();
        assert_eq!(config.context_window, 5);
        assert_eq!(config.min_edge_weight, 2.0);
        assert_eq!(config.min_node_weight, 3.0);
        assert_eq!(config.workers, 4);
        assert!(!config.prune_to_fixpoint);
        assert_eq!(config.min_documents, 0);
        assert!(config.is_quote_glyph("«"));
        assert!(config.is_quote_glyph("\""));
        assert!(!config.is_quote_glyph("-"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = GraphConfig::from_json(r#"{ "workers": 2, "min_edge_weight": 1.5 }"#).unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.min_edge_weight, 1.5);
        assert_eq!(config.context_window, 5, "missing fields keep defaults");
    }

    #[test]
    fn test_from_json_rejects_zero_window() {
        let err = GraphConfig::from_json(r#"{ "context_window": 0 }"#).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_validate_rejects_negative_threshold() {
        let config = GraphConfig {
            min_node_weight: -1.0,
            ..GraphConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
