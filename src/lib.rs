//! CastNet: Character Interaction Graphs from Book Text
//!
//! A Rust/WASM implementation of the character-network pipeline: resolve
//! character mentions in a book series to canonical identities and score how
//! strongly pairs of characters interact.
//!
//! # Architecture
//!
//! ## Resolution
//! - `registry.rs` - CharacterRegistry: canonical names + first/last-name alias index
//! - `context.rs` - ContextTracker: bounded recency window for shared aliases
//! - `dialogue.rs` - DialogueSegmenter: quote-span toggling, speaker-attribution hook
//! - `annotate.rs` - TextAnnotator trait + Aho-Corasick LexiconAnnotator
//!
//! ## Scoring & Graph
//! - `scorer.rs` - InteractionScorer: per-sentence pairwise weights (0.5 / 1.0)
//! - `table.rs` - InteractionTable: symmetric weighted co-mention table
//! - `aggregate.rs` - RelationAggregator: merges per-document tables
//! - `normalize.rs` - GraphNormalizer: edge/node thresholds, formatted output
//! - `pipeline.rs` - Pipeline: worker pool driving all of the above
//!
//! # Usage (Rust)
//! ```rust,ignore
//! use castnet::{DocumentSource, GraphConfig, Pipeline};
//!
//! let pipeline = Pipeline::from_lines(["Гарри Поттер", "Рон Уизли"], GraphConfig::default())?;
//! let output = pipeline.run(&[DocumentSource::text("book-1", text)])?;
//! println!("{}", output.graph.to_json()?);
//! ```
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { CastNetwork } from 'castnet';
//!
//! await init();
//! const net = new CastNetwork(['Гарри Поттер', 'Рон Уизли']);
//! const graph = net.buildGraph([bookText]);
//! // { "Гарри Поттер": { "Рон Уизли": 12.5 }, ... }
//! ```

pub mod config;
pub mod error;
pub mod network;

pub use config::*;
pub use error::*;
pub use network::*;

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("castnet v{}", env!("CARGO_PKG_VERSION"))
}
