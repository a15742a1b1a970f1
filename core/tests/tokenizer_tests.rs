use hybrid_core::tokenizer::{assert_single_term, stem, tokenize_only, StopWords, TextNormalizer};

#[test]
fn it_lowercases_and_stems() {
    let words = TextNormalizer::default().clean("Running Runners RUN! The knights' armor.");
    assert!(words.contains(&"run".to_string()));
    assert!(words.contains(&"knight".to_string()));
}

#[test]
fn stem_matches_the_cleaning_pipeline() {
    assert_eq!(stem("bears"), "bear");
    assert_eq!(stem("running"), "run");
    let cleaned = TextNormalizer::new(StopWords::new(Vec::<String>::new())).clean("hunting");
    assert_eq!(cleaned, vec![stem("hunting")]);
}

#[test]
fn it_filters_stopwords() {
    let words = TextNormalizer::default().clean("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert_eq!(words.len(), 5);
}

#[test]
fn raw_tokens_keep_stopwords_and_order() {
    assert_eq!(tokenize_only("The quick, brown fox"), vec!["the", "quick", "brown", "fox"]);
}

#[test]
fn stopwords_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stopwords.txt");
    std::fs::write(&path, "the\n  a \n\nquick\n").unwrap();
    let stopwords = StopWords::from_file(&path).unwrap();
    assert_eq!(stopwords.len(), 3);
    let words = TextNormalizer::new(stopwords).clean("The quick brown fox");
    assert_eq!(words, vec!["brown", "fox"]);
}

#[test]
fn single_term_validation() {
    assert!(assert_single_term("batman").is_ok());
    assert!(assert_single_term("dark knight").is_err());
}
