use crate::fragment::{Fragment, FragmentId, FragmentStore};
use crate::tokenizer::TokenizerConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Offset gap inserted between the last title word and the first body word.
pub const TITLE_BODY_GAP: u32 = 16;

/// Occurrences of one term within one fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub fragment_id: FragmentId,
    pub term_frequency: u32,
    /// Ascending token offsets within the fragment's title + body.
    pub positions: Vec<u32>,
}

/// Per-fragment length statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentStats {
    /// Indexed tokens in title and body combined.
    pub token_count: u32,
    pub title_tokens: u32,
    /// First body offset; anything below it came from the title.
    pub body_start: u32,
}

impl FragmentStats {
    #[inline]
    pub fn is_title_position(&self, position: u32) -> bool { position < self.body_start }
}

/// Token -> postings, plus the fragment store and per-fragment stats.
/// Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub(crate) tokenizer: TokenizerConfig,
    pub(crate) fragments: FragmentStore,
    pub(crate) stats: Vec<FragmentStats>,
    pub(crate) postings: BTreeMap<String, Vec<Posting>>, // postings sorted by fragment_id
}

impl InvertedIndex {
    pub fn tokenizer_config(&self) -> TokenizerConfig { self.tokenizer }

    pub fn fragments(&self) -> &FragmentStore { &self.fragments }

    pub fn fragment(&self, id: FragmentId) -> Option<&Fragment> { self.fragments.get(id) }

    pub fn stats(&self, id: FragmentId) -> Option<&FragmentStats> { self.stats.get(id as usize) }

    pub fn fragment_count(&self) -> usize { self.fragments.len() }

    pub fn term_count(&self) -> usize { self.postings.len() }

    /// Postings for `term`, empty when the term is not indexed.
    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn document_frequency(&self, term: &str) -> usize { self.postings(term).len() }

    pub fn average_fragment_len(&self) -> f32 {
        if self.stats.is_empty() {
            return 0.0;
        }
        let total: u64 = self.stats.iter().map(|s| s.token_count as u64).sum();
        total as f32 / self.stats.len() as f32
    }

    /// Check the structural invariants a loaded index must satisfy before it
    /// is trusted for scoring.
    pub fn validate(&self) -> Result<()> {
        if !self.fragments.ids_are_dense() {
            return Err(Error::Corrupt("fragment ids are not dense".into()));
        }
        if self.stats.len() != self.fragments.len() {
            return Err(Error::Corrupt(format!(
                "{} stats entries for {} fragments",
                self.stats.len(),
                self.fragments.len()
            )));
        }
        let n = self.fragments.len();
        for (term, plist) in &self.postings {
            if plist.is_empty() {
                return Err(Error::Corrupt(format!("empty posting list for {term:?}")));
            }
            let mut prev: Option<FragmentId> = None;
            for p in plist {
                if p.fragment_id as usize >= n {
                    return Err(Error::Corrupt(format!(
                        "posting for {term:?} references missing fragment {}",
                        p.fragment_id
                    )));
                }
                if prev.is_some_and(|prev| prev >= p.fragment_id) {
                    return Err(Error::Corrupt(format!("postings for {term:?} are not sorted")));
                }
                if p.term_frequency == 0 || p.term_frequency as usize != p.positions.len() {
                    return Err(Error::Corrupt(format!(
                        "term frequency mismatch for {term:?} in fragment {}",
                        p.fragment_id
                    )));
                }
                prev = Some(p.fragment_id);
            }
        }
        Ok(())
    }
}
