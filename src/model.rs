//! The shared TF-IDF vectorization model
//!
//! A `TfidfModel` is an immutable value: `fit` returns a new model with a
//! bumped version instead of mutating in place. The version is the lineage
//! marker stored alongside every document vector — vectors produced under
//! different versions are not comparable.

use crate::text::tokenize;
use crate::vector::Vector;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A trained mapping from raw text to a fixed-dimensional vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfModel {
    /// Term -> dimension index, in lexicographic term order.
    vocabulary: BTreeMap<String, usize>,
    /// Inverse-document-frequency weight per dimension.
    idf: Vec<f32>,
    /// Monotonic version, bumped by every `fit`. 0 means untrained.
    version: u64,
}

impl TfidfModel {
    /// A fresh, untrained model: version 0, empty vocabulary.
    pub fn untrained() -> Self {
        Self {
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
            version: 0,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of vocabulary terms == vector dimension.
    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    /// Whether this model has never been fitted.
    pub fn is_untrained(&self) -> bool {
        self.version == 0 && self.vocabulary.is_empty()
    }

    /// Fit a new model over `corpus`, bumping the version.
    ///
    /// The vocabulary is derived solely from the documents passed here;
    /// nothing is merged from the previous vocabulary. Callers that want
    /// continuity across uploads must pass the full document history.
    ///
    /// Weights use smoothed idf: ln((1 + n) / (1 + df)) + 1, so terms
    /// appearing in every document still carry a positive weight.
    pub fn fit<S: AsRef<str>>(&self, corpus: &[S]) -> TfidfModel {
        let n_docs = corpus.len();
        let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();

        for doc in corpus {
            let mut seen: Vec<String> = tokenize(doc.as_ref());
            seen.sort();
            seen.dedup();
            for term in seen {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(doc_freq.len());
        for (index, (term, df)) in doc_freq.into_iter().enumerate() {
            vocabulary.insert(term, index);
            let weight = ((1.0 + n_docs as f64) / (1.0 + df as f64)).ln() + 1.0;
            idf.push(weight as f32);
        }

        TfidfModel {
            vocabulary,
            idf,
            version: self.version + 1,
        }
    }

    /// Transform text into a vector under this model's vocabulary.
    ///
    /// Deterministic and pure: term counts are weighted by idf and the
    /// result is L2-normalized. Terms outside the vocabulary contribute
    /// nothing; a text with no known terms yields the zero vector.
    pub fn transform(&self, text: &str) -> Vector {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let terms = tokenize(text);
        for term in &terms {
            *counts.entry(term.as_str()).or_insert(0) += 1;
        }

        let mut vector = Vector::zeros(self.dimension());
        for (term, count) in counts {
            if let Some(&index) = self.vocabulary.get(term) {
                vector.set(index, count as f32 * self.idf[index]);
            }
        }
        vector.normalize();
        vector
    }
}
