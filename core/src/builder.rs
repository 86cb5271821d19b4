use crate::fragment::{Fragment, FragmentRecord, FragmentStore, SkippedFragment};
use crate::index::{FragmentStats, InvertedIndex, Posting, TITLE_BODY_GAP};
use crate::tokenizer::{Tokenizer, TokenizerConfig};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Outcome of a build besides the index itself.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub indexed: usize,
    pub skipped: Vec<SkippedFragment>,
}

/// Terms of one fragment with their merged title/body positions.
struct Analyzed {
    terms: BTreeMap<String, Vec<u32>>,
    stats: FragmentStats,
}

pub struct IndexBuilder {
    tokenizer: Tokenizer,
}

impl IndexBuilder {
    pub fn new(config: TokenizerConfig) -> Self {
        Self { tokenizer: Tokenizer::new(config) }
    }

    /// Ingest raw records and build a fresh index. Malformed records are
    /// skipped and listed in the report.
    pub fn build<I>(&self, records: I) -> (InvertedIndex, BuildReport)
    where
        I: IntoIterator<Item = FragmentRecord>,
    {
        let (store, skipped) = FragmentStore::ingest(records);
        let index = self.build_store(store);
        let report = BuildReport { indexed: index.fragment_count(), skipped };
        tracing::info!(
            indexed = report.indexed,
            skipped = report.skipped.len(),
            terms = index.term_count(),
            "index build complete"
        );
        (index, report)
    }

    /// Build from an already ingested store. Tokenization runs in parallel;
    /// postings are assembled sequentially in fragment id order.
    pub fn build_store(&self, store: FragmentStore) -> InvertedIndex {
        let analyzed: Vec<Analyzed> = store.as_slice().par_iter().map(|f| self.analyze(f)).collect();

        let mut postings: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
        let mut stats = Vec::with_capacity(analyzed.len());
        for (fragment, a) in store.iter().zip(analyzed) {
            for (term, positions) in a.terms {
                postings.entry(term).or_default().push(Posting {
                    fragment_id: fragment.id,
                    term_frequency: positions.len() as u32,
                    positions,
                });
            }
            stats.push(a.stats);
        }

        InvertedIndex { tokenizer: self.tokenizer.config(), fragments: store, stats, postings }
    }

    fn analyze(&self, fragment: &Fragment) -> Analyzed {
        let (title_tokens, title_span) = self.tokenizer.tokenize_with_span(&fragment.title);
        let body_tokens = self.tokenizer.tokenize(&fragment.text);
        let body_start = title_span as u32 + TITLE_BODY_GAP;

        let stats = FragmentStats {
            token_count: (title_tokens.len() + body_tokens.len()) as u32,
            title_tokens: title_tokens.len() as u32,
            body_start,
        };

        let mut terms: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        for (term, pos) in title_tokens {
            terms.entry(term).or_default().push(pos as u32);
        }
        for (term, pos) in body_tokens {
            terms.entry(term).or_default().push(body_start + pos as u32);
        }
        Analyzed { terms, stats }
    }
}

impl Default for IndexBuilder {
    fn default() -> Self { Self::new(TokenizerConfig::default()) }
}

/// Build with the default tokenizer configuration.
pub fn build<I>(records: I) -> (InvertedIndex, BuildReport)
where
    I: IntoIterator<Item = FragmentRecord>,
{
    IndexBuilder::default().build(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Category;

    fn rec(title: &str, text: &str) -> FragmentRecord {
        FragmentRecord::new("page/#anchor", "Page", title, text, Category::Section)
    }

    #[test]
    fn title_and_body_positions_are_separated() {
        let (index, _) = build(vec![rec("Type instability", "type inference")]);
        let stats = index.stats(0).unwrap();
        assert_eq!(stats.title_tokens, 2);
        assert_eq!(stats.token_count, 4);
        assert_eq!(stats.body_start, 2 + TITLE_BODY_GAP);

        let p = &index.postings("type")[0];
        assert_eq!(p.term_frequency, 2);
        assert_eq!(p.positions, vec![0, stats.body_start]);
        assert!(stats.is_title_position(p.positions[0]));
        assert!(!stats.is_title_position(p.positions[1]));
    }

    #[test]
    fn postings_are_sorted_by_fragment() {
        let (index, report) = build(vec![rec("alpha", "beta"), rec("", "alpha gamma"), rec("beta", "alpha")]);
        assert_eq!(report.indexed, 3);
        let ids: Vec<u32> = index.postings("alpha").iter().map(|p| p.fragment_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(index.document_frequency("beta"), 2);
        index.validate().unwrap();
    }

    #[test]
    fn malformed_records_do_not_abort() {
        let mut bad = rec("title", "text");
        bad.location = None;
        let (index, report) = build(vec![bad, rec("", ""), rec("kept", "")]);
        assert_eq!(index.fragment_count(), 1);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(index.fragment(0).unwrap().title, "kept");
    }
}
