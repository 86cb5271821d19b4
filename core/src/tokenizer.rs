use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}]+").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could",
            "did","do","does","doing","down","during",
            "each","few","for","from","further",
            "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","it","its","itself",
            "me","more","most","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","should","so","some","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","very",
            "was","we","were","what","when","where","which","while","who","whom","why","with","would",
            "you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

pub const DEFAULT_MIN_TOKEN_LEN: usize = 2;

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Normalization settings. Persisted with the index so queries are
/// tokenized exactly like the fragments were.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// Tokens with fewer characters are dropped.
    pub min_token_len: usize,
    /// Apply English Snowball stemming after stop-word removal.
    pub stem: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self { min_token_len: DEFAULT_MIN_TOKEN_LEN, stem: false }
    }
}

pub struct Tokenizer {
    config: TokenizerConfig,
    stemmer: Option<Stemmer>,
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        let stemmer = config.stem.then(|| Stemmer::create(Algorithm::English));
        Self { config, stemmer }
    }

    pub fn config(&self) -> TokenizerConfig { self.config }

    /// Tokenize text into (term, offset). The offset is the ordinal of the
    /// word before filtering, so gaps mark dropped stop words.
    pub fn tokenize(&self, text: &str) -> Vec<(String, usize)> {
        self.tokenize_with_span(text).0
    }

    /// Like [`Tokenizer::tokenize`], also returning the raw word count.
    pub fn tokenize_with_span(&self, text: &str) -> (Vec<(String, usize)>, usize) {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        let mut tokens = Vec::new();
        let mut span = 0;
        for (pos, mat) in RE.find_iter(&normalized).enumerate() {
            span = pos + 1;
            let token = mat.as_str();
            if token.chars().count() < self.config.min_token_len || is_stopword(token) { continue; }
            let term = match &self.stemmer {
                Some(stemmer) => stemmer.stem(token).into_owned(),
                None => token.to_string(),
            };
            tokens.push((term, pos));
        }
        (tokens, span)
    }
}

impl Default for Tokenizer {
    fn default() -> Self { Self::new(TokenizerConfig::default()) }
}

/// Tokenize with the default configuration: NFKC, lowercase, alphanumeric
/// runs of at least two characters, stop words removed, no stemming.
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    Tokenizer::default().tokenize(text)
}
