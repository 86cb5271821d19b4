//! Search index builder and query engine for generated documentation
//! fragments (`search_index.js` style data).
//!
//! Build time: [`source::load_records`] -> [`builder::IndexBuilder::build`] ->
//! [`persist::save_index`]. Read time: [`persist::load_index`] ->
//! [`publish::IndexHandle`] -> [`query::Searcher`].

pub mod builder;
pub mod error;
pub mod fragment;
pub mod index;
pub mod persist;
pub mod publish;
pub mod query;
pub mod source;
pub mod tokenizer;

pub use builder::{build, BuildReport, IndexBuilder};
pub use error::{Error, FragmentError, Result};
pub use fragment::{Category, Fragment, FragmentId, FragmentRecord, FragmentStore, SkippedFragment};
pub use index::{FragmentStats, InvertedIndex, Posting};
pub use publish::{IndexHandle, PublishedIndex};
pub use query::{search, Page, ScoredFragment, ScoringConfig, SearchResults, Searcher};
pub use tokenizer::{tokenize, Tokenizer, TokenizerConfig};
