//! Free-text search over a built [`InvertedIndex`].
//!
//! Ranking keys, in order: number of distinct query terms matched
//! (descending), TF-IDF score with title boost (descending), fragment id
//! (ascending).

use crate::fragment::{Fragment, FragmentId};
use crate::index::InvertedIndex;
use crate::tokenizer::Tokenizer;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

pub const DEFAULT_TITLE_BOOST: f32 = 2.0;

/// Tunable scoring constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Multiplier for occurrences inside the title offset range. Must exceed 1.
    pub title_boost: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { title_boost: DEFAULT_TITLE_BOOST }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.title_boost.is_finite() || self.title_boost <= 1.0 {
            return Err(Error::InvalidQueryParameter(format!(
                "title boost must be a finite number above 1, got {}",
                self.title_boost
            )));
        }
        Ok(())
    }
}

/// Validated pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    pub fn new(limit: usize, offset: usize) -> Result<Self> {
        if limit == 0 {
            return Err(Error::InvalidQueryParameter("limit must be positive".into()));
        }
        Ok(Self { limit, offset })
    }

    /// Validate parameters arriving from outside (HTTP, CLI) where negative
    /// values are representable.
    pub fn from_signed(limit: i64, offset: i64) -> Result<Self> {
        if limit <= 0 {
            return Err(Error::InvalidQueryParameter(format!("limit must be positive, got {limit}")));
        }
        if offset < 0 {
            return Err(Error::InvalidQueryParameter(format!("offset must not be negative, got {offset}")));
        }
        Self::new(limit as usize, offset as usize)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredFragment<'a> {
    pub fragment: &'a Fragment,
    pub score: f32,
    pub matched_terms: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResults<'a> {
    /// Ranked matches before pagination.
    pub total_hits: usize,
    pub hits: Vec<ScoredFragment<'a>>,
}

#[derive(Default)]
struct Accumulator {
    score: f32,
    matched: BTreeSet<String>,
}

/// Query engine bound to one immutable index.
pub struct Searcher<'a> {
    index: &'a InvertedIndex,
    tokenizer: Tokenizer,
    config: ScoringConfig,
}

impl<'a> Searcher<'a> {
    pub fn new(index: &'a InvertedIndex, config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { index, tokenizer: Tokenizer::new(index.tokenizer_config()), config })
    }

    pub fn search(&self, query: &str, limit: usize, offset: usize) -> Result<SearchResults<'a>> {
        let page = Page::new(limit, offset)?;
        Ok(self.search_page(query, page))
    }

    pub fn search_page(&self, query: &str, page: Page) -> SearchResults<'a> {
        let terms: BTreeSet<String> = self.tokenizer.tokenize(query).into_iter().map(|(t, _)| t).collect();
        if terms.is_empty() {
            return SearchResults::default();
        }

        let n = self.index.fragment_count() as f32;
        let mut scores: HashMap<FragmentId, Accumulator> = HashMap::new();
        for term in terms {
            let postings = self.index.postings(&term);
            if postings.is_empty() {
                continue;
            }
            let idf = (1.0 + n / postings.len() as f32).ln();
            for p in postings {
                let Some(stats) = self.index.stats(p.fragment_id) else { continue };
                let weighted_tf: f32 = p
                    .positions
                    .iter()
                    .map(|&pos| if stats.is_title_position(pos) { self.config.title_boost } else { 1.0 })
                    .sum();
                let acc = scores.entry(p.fragment_id).or_default();
                acc.score += weighted_tf * idf;
                acc.matched.insert(term.clone());
            }
        }

        let mut ranked: Vec<(FragmentId, Accumulator)> = scores.into_iter().collect();
        ranked.sort_by(|(a_id, a), (b_id, b)| rank_order(*a_id, a, *b_id, b));
        let total_hits = ranked.len();

        let hits = ranked
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .filter_map(|(id, acc)| {
                self.index.fragment(id).map(|fragment| ScoredFragment {
                    fragment,
                    score: acc.score,
                    matched_terms: acc.matched,
                })
            })
            .collect();

        SearchResults { total_hits, hits }
    }
}

fn rank_order(a_id: FragmentId, a: &Accumulator, b_id: FragmentId, b: &Accumulator) -> Ordering {
    b.matched
        .len()
        .cmp(&a.matched.len())
        .then_with(|| b.score.total_cmp(&a.score))
        .then_with(|| a_id.cmp(&b_id))
}

/// Search with the default scoring configuration.
pub fn search<'a>(index: &'a InvertedIndex, query: &str, limit: usize, offset: usize) -> Result<SearchResults<'a>> {
    Searcher::new(index, ScoringConfig::default())?.search(query, limit, offset)
}
