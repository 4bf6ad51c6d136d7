//! # Resumatch
//!
//! Indexes free-text resumes into a shared TF-IDF vector space and answers
//! nearest-neighbor relevance queries against it.
//!
//! This library provides:
//! - A versioned, immutable vectorization model (`TfidfModel`)
//! - Durable stores for the model blob and the document corpus
//! - An indexing pipeline that keeps every stored vector consistent with
//!   the current model
//! - Cosine-similarity top-k search with incompatibility filtering
//!
//! ## Example
//!
//! ```no_run
//! use resumatch::{EngineConfig, SearchEngine};
//!
//! # fn main() -> resumatch::Result<()> {
//! let mut engine = SearchEngine::open("./data", EngineConfig::default())?;
//!
//! engine.upload("alice", "Rust engineer with distributed systems experience")?;
//! engine.upload("bob", "Data analyst, Python and SQL")?;
//!
//! let outcome = engine.search("rust distributed services", 5)?;
//! for hit in &outcome.hits {
//!     println!("{} (score: {:.4})", hit.name, hit.score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod model;
pub mod server;
pub mod similarity;
pub mod store;
pub mod text;
pub mod vector;

pub use engine::{EngineConfig, SearchEngine, SearchHit, SearchOutcome, UploadReceipt, DEFAULT_K};
pub use error::{EngineError, Result};
pub use extract::{PlainTextExtractor, TextExtractor};
pub use model::TfidfModel;
pub use store::corpus_log::DocumentRecord;
pub use vector::Vector;
