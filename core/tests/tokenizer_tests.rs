use docsearch_core::tokenizer::{tokenize, Tokenizer, TokenizerConfig};

#[test]
fn it_normalizes_and_splits() {
    let toks = tokenize("Type-instability: GLOBAL_variable café ＡＢＣ");
    let words: Vec<String> = toks.into_iter().map(|(w, _)| w).collect();
    assert_eq!(words, vec!["type", "instability", "global", "variable", "café", "abc"]);
}

#[test]
fn it_filters_stopwords_and_short_tokens() {
    let toks = tokenize("The quick brown fox and the lazy dog x = 5");
    let words: Vec<String> = toks.into_iter().map(|(w, _)| w).collect();
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert!(!words.contains(&"x".to_string()));
    assert!(!words.contains(&"5".to_string()));
    assert!(words.contains(&"lazy".to_string()));
}

#[test]
fn it_is_deterministic_and_order_preserving() {
    let text = "julia> function f() s = 0 for val in x s = s + val end return s end";
    let a = tokenize(text);
    let b = tokenize(text);
    assert_eq!(a, b);
    assert!(a.windows(2).all(|w| w[0].1 < w[1].1));
}

#[test]
fn it_honors_min_token_len() {
    let t = Tokenizer::new(TokenizerConfig { min_token_len: 4, stem: false });
    let words: Vec<String> = t.tokenize("abc abcd").into_iter().map(|(w, _)| w).collect();
    assert_eq!(words, vec!["abcd"]);
}
