//! Search engine: the indexing and query pipelines over the two stores.
//!
//! Refit policy: every upload refits the model over the entire stored
//! corpus plus the new document, then re-vectorizes every existing record
//! under the new model before committing the new record. After a successful
//! upload all records therefore share the current model version; vectors
//! from a partially reconciled state (crash, foreign data directory) are
//! caught by the search-time compatibility filter instead of poisoning
//! results.

use crate::error::{EngineError, Result};
use crate::similarity::cosine_similarity;
use crate::store::corpus_log::{CorpusLog, DocumentRecord};
use crate::store::model_store::ModelStore;
use crate::vector::Vector;
use rayon::prelude::*;
use std::path::Path;
use tracing::{info, warn};

/// Default number of results returned by a search.
pub const DEFAULT_K: usize = 5;

/// Configuration for the search engine.
pub struct EngineConfig {
    /// Compact the corpus log once this many superseded entries accumulate.
    pub compact_slack: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { compact_slack: 1000 }
    }
}

/// Outcome of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub id: u64,
    pub name: String,
    pub model_version: u64,
}

/// A single ranked search result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: u64,
    pub name: String,
    pub score: f32,
}

/// Ranked hits plus the number of records skipped as incompatible.
///
/// `skipped_incompatible` lets callers tell "no compatible data" apart
/// from an empty result over a fully compatible corpus.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub hits: Vec<SearchHit>,
    pub skipped_incompatible: usize,
}

/// Indexes documents into the shared vector space and answers
/// nearest-neighbor queries against it.
pub struct SearchEngine {
    model_store: ModelStore,
    corpus: CorpusLog,
    config: EngineConfig,
}

impl SearchEngine {
    /// Open or create an engine rooted at the given data directory.
    pub fn open(data_dir: impl AsRef<Path>, config: EngineConfig) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;

        let model_store = ModelStore::new(data_dir)?;
        let corpus = CorpusLog::open(data_dir.join("corpus.log"))?;

        Ok(Self {
            model_store,
            corpus,
            config,
        })
    }

    /// Index one document: refit the model over the full corpus plus the
    /// new text, persist it, reconcile stored vectors, insert the record.
    ///
    /// The model is saved durably before any record references its version,
    /// so a failure partway leaves no record pointing at an unsaved model.
    pub fn upload(&mut self, name: &str, text: &str) -> Result<UploadReceipt> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EngineError::Extraction {
                reason: "document contains no extractable text".to_string(),
            });
        }

        let mut corpus_texts: Vec<&str> = self.corpus.texts().collect();
        corpus_texts.push(text);
        let model = self.model_store.load()?.fit(&corpus_texts);

        self.model_store.save(&model)?;

        // Reconcile existing records under the new model, then commit the
        // new record last; its fsync covers the whole batch.
        let reconciled: Vec<(u64, Vector)> = self
            .corpus
            .scan_all()
            .map(|r| (r.id, model.transform(&r.raw_text)))
            .collect();
        for (id, vector) in reconciled {
            self.corpus.revector(id, vector, model.version())?;
        }

        let vector = model.transform(text);
        let id = self.corpus.insert(name, text, vector, model.version())?;

        self.maybe_compact()?;

        info!(
            id,
            name,
            model_version = model.version(),
            dimension = model.dimension(),
            "document indexed"
        );

        Ok(UploadReceipt {
            id,
            name: name.to_string(),
            model_version: model.version(),
        })
    }

    /// Rank stored documents by cosine similarity to the query text.
    ///
    /// Records whose vector dimension differs from the query vector are
    /// skipped and counted, never failing the request. Ties keep insertion
    /// order (stable sort).
    pub fn search(&self, query: &str, k: usize) -> Result<SearchOutcome> {
        let model = self.model_store.load()?;
        if model.is_untrained() || self.corpus.is_empty() {
            return Err(EngineError::NoData);
        }

        let query_vector = model.transform(query);

        let records: Vec<&DocumentRecord> = self.corpus.scan_all().collect();
        let scored: Vec<Option<SearchHit>> = records
            .par_iter()
            .map(|record| {
                if !record.vector.has_same_dimension(&query_vector) {
                    return None;
                }
                let score = cosine_similarity(&query_vector, &record.vector).unwrap_or(0.0);
                Some(SearchHit {
                    id: record.id,
                    name: record.name.clone(),
                    score,
                })
            })
            .collect();

        let skipped_incompatible = scored.iter().filter(|s| s.is_none()).count();
        if skipped_incompatible > 0 {
            warn!(
                skipped_incompatible,
                query_dimension = query_vector.dimension(),
                model_version = model.version(),
                "skipped records with incompatible vector dimensions"
            );
        }

        let mut hits: Vec<SearchHit> = scored.into_iter().flatten().collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);

        Ok(SearchOutcome {
            hits,
            skipped_incompatible,
        })
    }

    /// Iterate over all stored records in insertion order.
    pub fn documents(&self) -> impl Iterator<Item = &DocumentRecord> {
        self.corpus.scan_all()
    }

    /// Number of indexed documents.
    pub fn document_count(&self) -> usize {
        self.corpus.len()
    }

    /// Version of the current model (0 if untrained).
    pub fn model_version(&self) -> Result<u64> {
        Ok(self.model_store.load()?.version())
    }

    fn maybe_compact(&mut self) -> Result<()> {
        if self.corpus.entry_count() - self.corpus.len() >= self.config.compact_slack {
            self.corpus.compact()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    fn engine(dir: &TempDir) -> SearchEngine {
        SearchEngine::open(dir.path().join("db"), EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_upload_assigns_sequential_ids_and_versions() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);

        let r1 = engine.upload("alice", "rust systems engineer").unwrap();
        let r2 = engine.upload("bob", "python data analyst").unwrap();

        assert_eq!(r1.id, 1);
        assert_eq!(r2.id, 2);
        assert_eq!(r1.model_version, 1);
        assert_eq!(r2.model_version, 2);
    }

    #[test]
    fn test_upload_empty_text_fails() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);
        let err = engine.upload("alice", "   \n  ").unwrap_err();
        assert!(matches!(err, EngineError::Extraction { .. }));
        assert_eq!(engine.document_count(), 0);
    }

    #[test]
    fn test_refit_reconciles_all_records() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);

        engine.upload("alice", "rust tokio services").unwrap();
        engine.upload("bob", "embedded firmware in c").unwrap();
        engine.upload("carol", "python machine learning").unwrap();

        let version = engine.model_version().unwrap();
        assert_eq!(version, 3);
        for record in engine.documents() {
            assert_eq!(record.model_version, version);
        }
    }

    #[test]
    fn test_dimension_invariant_holds() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);

        engine.upload("alice", "rust tokio").unwrap();
        engine.upload("bob", "haskell lenses and monads").unwrap();

        let model = engine.model_store.load().unwrap();
        for record in engine.documents() {
            assert_eq!(record.vector.dimension(), model.dimension());
        }
    }

    #[test]
    fn test_search_empty_store_is_no_data() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        assert!(matches!(engine.search("rust", 5), Err(EngineError::NoData)));
    }

    #[test]
    fn test_search_ranks_by_similarity() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);

        engine.upload("pure", "rust rust rust").unwrap();
        engine.upload("mixed", "rust python").unwrap();
        engine.upload("off-topic", "cooking baking pastry").unwrap();

        let outcome = engine.search("rust", 2).unwrap();
        assert_eq!(outcome.hits.len(), 2);
        assert_eq!(outcome.hits[0].name, "pure");
        assert_eq!(outcome.hits[1].name, "mixed");
        assert!(outcome.hits[0].score > outcome.hits[1].score);
        assert_relative_eq!(outcome.hits[0].score, 1.0, epsilon = 1e-5);
        assert_eq!(outcome.skipped_incompatible, 0);
    }

    #[test]
    fn test_search_unknown_query_terms_score_zero() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);
        engine.upload("alice", "rust systems").unwrap();

        let outcome = engine.search("quantum chromodynamics", 5).unwrap();
        assert_eq!(outcome.hits.len(), 1);
        assert_relative_eq!(outcome.hits[0].score, 0.0);
    }

    #[test]
    fn test_search_k_limits_results() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);
        for i in 0..8 {
            engine
                .upload(&format!("doc{i}"), &format!("rust document number {i}"))
                .unwrap();
        }
        let outcome = engine.search("rust", DEFAULT_K).unwrap();
        assert_eq!(outcome.hits.len(), DEFAULT_K);
    }

    #[test]
    fn test_reopen_preserves_state() {
        let dir = TempDir::new().unwrap();
        {
            let mut engine = engine(&dir);
            engine.upload("alice", "rust systems engineer").unwrap();
            engine.upload("bob", "python data analyst").unwrap();
        }

        let engine = SearchEngine::open(dir.path().join("db"), EngineConfig::default()).unwrap();
        assert_eq!(engine.document_count(), 2);
        assert_eq!(engine.model_version().unwrap(), 2);

        let outcome = engine.search("rust engineer", 5).unwrap();
        assert_eq!(outcome.hits[0].name, "alice");
    }

    #[test]
    fn test_compaction_keeps_search_results() {
        let dir = TempDir::new().unwrap();
        let mut engine = SearchEngine::open(
            dir.path().join("db"),
            EngineConfig { compact_slack: 4 },
        )
        .unwrap();

        for i in 0..6 {
            engine
                .upload(&format!("doc{i}"), &format!("rust document number {i}"))
                .unwrap();
        }

        let outcome = engine.search("rust", 10).unwrap();
        assert_eq!(outcome.hits.len(), 6);

        // State after compaction survives reopen
        drop(engine);
        let engine = SearchEngine::open(dir.path().join("db"), EngineConfig::default()).unwrap();
        assert_eq!(engine.document_count(), 6);
    }
}
