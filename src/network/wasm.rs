use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::config::GraphConfig;
use crate::network::aggregate::RelationAggregator;
use crate::network::annotate::Sentence;
use crate::network::normalize::FinalGraph;
use crate::network::pipeline::{DocumentSource, Pipeline};

/// Browser-side entry point. Documents are processed one after another;
/// there is no worker pool inside WASM.
#[wasm_bindgen]
pub struct CastNetwork {
    inner: Pipeline,
}

#[wasm_bindgen]
impl CastNetwork {
    /// `characters`: one full name per entry. `config_json`: optional
    /// partial `GraphConfig` as JSON.
    #[wasm_bindgen(constructor)]
    pub fn new(characters: Vec<String>, config_json: Option<String>) -> Result<CastNetwork, JsValue> {
        let mut config = match config_json {
            Some(json) => GraphConfig::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => GraphConfig::sequential(),
        };
        config.workers = 1;

        let inner = Pipeline::from_lines(characters, config)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(CastNetwork { inner })
    }

    /// Build the graph from raw texts using the built-in lexicon annotator.
    /// Returns `{ "Name": { "Other Name": weight } }`.
    #[wasm_bindgen(js_name = buildGraph)]
    pub fn build_graph(&self, texts: Vec<String>) -> Result<JsValue, JsValue> {
        let documents: Vec<DocumentSource> = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| DocumentSource::text(format!("document-{}", i), text))
            .collect();

        let output = self
            .inner
            .run(&documents)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        for report in output.failed() {
            web_sys::console::error_1(&format!("[CastNetwork] {} failed: {:?}", report.id, report.status).into());
        }
        to_js(&output.graph)
    }

    /// Build the graph from documents annotated by an external NLP service:
    /// an array of documents, each an array of `{ tokens, mentions }` sentences.
    #[wasm_bindgen(js_name = buildGraphAnnotated)]
    pub fn build_graph_annotated(&self, documents: JsValue) -> Result<JsValue, JsValue> {
        let documents: Vec<Vec<Sentence>> = serde_wasm_bindgen::from_value(documents)
            .map_err(|e| JsValue::from_str(&format!("Invalid documents: {}", e)))?;

        let aggregator = RelationAggregator::new();
        for sentences in &documents {
            aggregator.merge(&self.inner.score_sentences(sentences));
        }
        let graph = self
            .inner
            .normalizer()
            .normalize_aggregate(&aggregator.into_inner());
        to_js(&graph)
    }

    /// Canonical names sharing an alias
    #[wasm_bindgen(js_name = resolveAlias)]
    pub fn resolve_alias(&self, token: &str) -> Vec<String> {
        self.inner.registry().resolve_alias(token).iter().cloned().collect()
    }

    #[wasm_bindgen(js_name = characterCount)]
    pub fn character_count(&self) -> usize {
        self.inner.registry().len()
    }
}

fn to_js(graph: &FinalGraph) -> Result<JsValue, JsValue> {
    graph
        .formatted()
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}
