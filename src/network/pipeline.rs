//! Pipeline - end-to-end driver
//!
//! ```text
//! characters ─► CharacterRegistry
//!                     │
//! documents ──► [worker pool] annotate ─► InteractionScorer (fresh per document)
//!                     │
//!                     ▼
//!              RelationAggregator ─► GraphNormalizer ─► FinalGraph
//! ```
//!
//! # Usage
//! ```rust,ignore
//! let pipeline = Pipeline::from_lines(["Гарри Поттер", "Рон Уизли"], GraphConfig::default())?;
//! let output = pipeline.run(&DocumentSource::from_dir("books")?)?;
//! println!("{}", output.graph.to_json()?);
//! ```

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::aggregate::{Aggregate, RelationAggregator};
use super::annotate::{LexiconAnnotator, Sentence, TextAnnotator};
use super::dialogue::{NoSpeakerAttribution, SpeakerAttribution};
use super::normalize::{FinalGraph, GraphNormalizer};
use super::registry::CharacterRegistry;
use super::scorer::{DocumentScore, InteractionScorer, ScoreStats};
use crate::config::GraphConfig;
use crate::error::{CastError, CastResult};

// =============================================================================
// Documents
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Text { id: String, text: String },
    File(PathBuf),
}

impl DocumentSource {
    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        DocumentSource::Text {
            id: id.into(),
            text: text.into(),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        DocumentSource::File(path.into())
    }

    /// Every `*.txt` file in `dir`, sorted by path
    pub fn from_dir(dir: impl AsRef<Path>) -> CastResult<Vec<Self>> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| CastError::io(dir, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| CastError::io(dir, e))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths.into_iter().map(DocumentSource::File).collect())
    }

    pub fn id(&self) -> String {
        match self {
            DocumentSource::Text { id, .. } => id.clone(),
            DocumentSource::File(path) => path.display().to_string(),
        }
    }

    pub fn load(&self) -> CastResult<Cow<'_, str>> {
        match self {
            DocumentSource::Text { text, .. } => Ok(Cow::Borrowed(text)),
            DocumentSource::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|e| CastError::io(path, e)),
        }
    }
}

// =============================================================================
// Reports
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentStatus {
    Processed,
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub id: String,
    #[serde(flatten)]
    pub status: DocumentStatus,
    /// Distinct characters resolved in the document
    pub characters: usize,
    pub stats: ScoreStats,
    pub elapsed_us: u64,
}

impl DocumentReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, DocumentStatus::Failed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub graph: FinalGraph,
    pub aggregate: Aggregate,
    /// One report per input document, in input order
    pub reports: Vec<DocumentReport>,
}

impl PipelineOutput {
    pub fn failed(&self) -> impl Iterator<Item = &DocumentReport> {
        self.reports.iter().filter(|r| r.is_failed())
    }
}

// =============================================================================
// Pipeline
// =============================================================================

pub struct Pipeline {
    registry: CharacterRegistry,
    config: GraphConfig,
    annotator: Box<dyn TextAnnotator>,
    speakers: Box<dyn SpeakerAttribution>,
}

impl Pipeline {
    /// Pipeline with the built-in lexicon annotator and no speaker attribution
    pub fn new(registry: CharacterRegistry, config: GraphConfig) -> CastResult<Self> {
        config.validate()?;
        let annotator = LexiconAnnotator::new(&registry)?;
        Ok(Pipeline {
            registry,
            config,
            annotator: Box::new(annotator),
            speakers: Box::new(NoSpeakerAttribution),
        })
    }

    pub fn from_lines<I, S>(lines: I, config: GraphConfig) -> CastResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(CharacterRegistry::from_lines(lines)?, config)
    }

    pub fn with_annotator(mut self, annotator: impl TextAnnotator + 'static) -> Self {
        self.annotator = Box::new(annotator);
        self
    }

    pub fn with_speakers(mut self, speakers: impl SpeakerAttribution + 'static) -> Self {
        self.speakers = Box::new(speakers);
        self
    }

    pub fn registry(&self) -> &CharacterRegistry {
        &self.registry
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Annotate and score a single document with fresh narrative state
    pub fn score_document(&self, source: &DocumentSource) -> CastResult<DocumentScore> {
        let text = source.load()?;
        let sentences = self.annotator.annotate(&text)?;
        Ok(self.score_sentences(&sentences))
    }

    /// Score sentences that were annotated elsewhere
    pub fn score_sentences(&self, sentences: &[Sentence]) -> DocumentScore {
        InteractionScorer::new(&self.registry, &self.config, self.speakers.as_ref())
            .score_document(sentences)
    }

    /// Normalizer built from the config's thresholds and `min_documents`
    pub fn normalizer(&self) -> GraphNormalizer {
        GraphNormalizer::from_config(&self.config)
    }

    /// Process every document, merge, normalize. Per-document failures are
    /// reported, never raised.
    pub fn run(&self, documents: &[DocumentSource]) -> CastResult<PipelineOutput> {
        let aggregator = RelationAggregator::new();

        let reports = if self.config.workers > 1 && documents.len() > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.workers)
                .build()
            {
                Ok(pool) => pool.install(|| {
                    documents
                        .par_iter()
                        .map(|doc| self.process(doc, &aggregator))
                        .collect::<Vec<_>>()
                }),
                Err(e) => {
                    let err = CastError::Pool(e.to_string());
                    warn!(error = %err, "processing documents inline");
                    self.process_inline(documents, &aggregator)
                }
            }
        } else {
            self.process_inline(documents, &aggregator)
        };

        let aggregate = aggregator.into_inner();
        let graph = self.normalizer().normalize_aggregate(&aggregate);
        info!(
            documents = documents.len(),
            merged = aggregate.documents,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "interaction graph built"
        );

        Ok(PipelineOutput {
            graph,
            aggregate,
            reports,
        })
    }

    fn process_inline(
        &self,
        documents: &[DocumentSource],
        aggregator: &RelationAggregator,
    ) -> Vec<DocumentReport> {
        documents
            .iter()
            .map(|doc| self.process(doc, aggregator))
            .collect()
    }

    fn process(&self, doc: &DocumentSource, aggregator: &RelationAggregator) -> DocumentReport {
        let start = instant::Instant::now();
        let id = doc.id();

        match self.score_document(doc) {
            Ok(score) => {
                aggregator.merge(&score);
                let characters = score.mentions.len();
                info!(document = %id, characters, "document processed");
                DocumentReport {
                    id,
                    status: DocumentStatus::Processed,
                    characters,
                    stats: score.stats,
                    elapsed_us: start.elapsed().as_micros() as u64,
                }
            }
            Err(e) => {
                warn!(document = %id, error = %e, "document skipped");
                DocumentReport {
                    id,
                    status: DocumentStatus::Failed {
                        error: e.to_string(),
                    },
                    characters: 0,
                    stats: ScoreStats::default(),
                    elapsed_us: start.elapsed().as_micros() as u64,
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_document_source_text() {
        let doc = DocumentSource::text("book-1", "Гарри.");
        assert_eq!(doc.id(), "book-1");
        assert_eq!(doc.load().unwrap(), "Гарри.");
    }

    #[test]
    fn test_document_source_missing_file() {
        let doc = DocumentSource::file("/nonexistent/book.txt");
        assert!(matches!(doc.load(), Err(CastError::Io { .. })));
    }

    #[test]
    fn test_from_dir_picks_txt_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.txt", "a.txt", "notes.md"] {
            let mut f = std::fs::File::create(dir.path().join(name)).unwrap();
            writeln!(f, "Гарри и Рон.").unwrap();
        }

        let docs = DocumentSource::from_dir(dir.path()).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[0].id().ends_with("a.txt"));
        assert!(docs[1].id().ends_with("b.txt"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GraphConfig {
            workers: 0,
            ..GraphConfig::default()
        };
        let err = Pipeline::from_lines(["Гарри Поттер"], config).err().unwrap();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_report_serializes_status() {
        let report = DocumentReport {
            id: "x".into(),
            status: DocumentStatus::Failed {
                error: "boom".into(),
            },
            characters: 0,
            stats: ScoreStats::default(),
            elapsed_us: 1,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "boom");
    }
}
