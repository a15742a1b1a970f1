use crate::error::{IndexError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

lazy_static! {
    // ASCII punctuation: !"#$%&'()*+,-./:;<=>?@[\]^_`{|}~
    static ref PUNCT: Regex = Regex::new(r"[[:punct:]]").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

const ENGLISH_STOPWORDS: &[&str] = &[
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
    "you","your","yours","yourself","yourselves",
];

/// A flat set of lowercase words dropped during cleaning.
#[derive(Debug, Clone, Default)]
pub struct StopWords(HashSet<String>);

impl StopWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(words.into_iter().map(Into::into).collect())
    }

    /// Built-in English list for callers without a stopword file.
    pub fn english() -> Self {
        Self::new(ENGLISH_STOPWORDS.iter().copied())
    }

    /// One word per line; surrounding whitespace and blank lines are ignored.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(Self::new(raw.lines().map(str::trim).filter(|l| !l.is_empty())))
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Lowercase, strip ASCII punctuation and split on whitespace.
///
/// Used on its own to measure raw document length before stopword removal.
pub fn tokenize_only(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    PUNCT
        .replace_all(&lowered, "")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

pub fn stem(token: &str) -> String {
    STEMMER.stem(token).into_owned()
}

/// Fails with `InvalidTerm` when `text` holds more than one token.
pub fn assert_single_term(text: &str) -> Result<()> {
    let tokens = tokenize_only(text);
    if tokens.len() > 1 {
        return Err(IndexError::InvalidTerm { term: text.to_string(), tokens: tokens.len() });
    }
    Ok(())
}

/// Full cleaning pipeline: lowercase, strip punctuation, split, drop
/// stopwords, stem. Never fails; empty input yields no tokens.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    stopwords: StopWords,
}

impl TextNormalizer {
    pub fn new(stopwords: StopWords) -> Self {
        Self { stopwords }
    }

    pub fn stopwords(&self) -> &StopWords {
        &self.stopwords
    }

    pub fn clean(&self, text: &str) -> Vec<String> {
        self.finish(tokenize_only(text))
    }

    /// Remaining steps after `tokenize_only`: stopword removal then stemming.
    pub fn finish(&self, tokens: Vec<String>) -> Vec<String> {
        tokens
            .into_iter()
            .filter(|t| !self.stopwords.contains(t))
            .map(|t| stem(&t))
            .collect()
    }

    /// Normalize a single lookup term to its indexed form.
    ///
    /// Returns `None` when the term holds no token at all (e.g. only punctuation).
    pub fn term_key(&self, term: &str) -> Result<Option<String>> {
        let tokens = tokenize_only(term);
        match tokens.len() {
            0 => Ok(None),
            1 => Ok(tokens.first().map(|t| stem(t))),
            n => Err(IndexError::InvalidTerm { term: term.to_string(), tokens: n }),
        }
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(StopWords::english())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_clean() {
        let t = TextNormalizer::default().clean("Running, runner's run!");
        assert!(t.iter().any(|w| w == "run"));
    }

    #[test]
    fn tokenize_only_keeps_stopwords() {
        let toks = tokenize_only("The Dark, Knight!");
        assert_eq!(toks, vec!["the", "dark", "knight"]);
    }

    #[test]
    fn punctuation_is_removed_not_split() {
        assert_eq!(tokenize_only("spider-man's"), vec!["spidermans"]);
        assert_eq!(tokenize_only("  ...  "), Vec::<String>::new());
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(TextNormalizer::default().clean("").is_empty());
        assert!(tokenize_only("").is_empty());
    }

    #[test]
    fn single_term_guard() {
        assert!(assert_single_term("batman").is_ok());
        assert!(assert_single_term("Batman!").is_ok());
        let err = assert_single_term("dark knight").unwrap_err();
        assert!(matches!(err, IndexError::InvalidTerm { tokens: 2, .. }));
    }

    #[test]
    fn term_key_stems_and_lowercases() {
        let n = TextNormalizer::default();
        assert_eq!(n.term_key("Knights").unwrap(), Some("knight".to_string()));
        assert_eq!(n.term_key("?!").unwrap(), None);
        assert!(n.term_key("two words").is_err());
    }

    #[test]
    fn custom_stopwords_apply_after_lowercasing() {
        let n = TextNormalizer::new(StopWords::new(["bear"]));
        assert_eq!(n.clean("BEAR attack"), vec!["attack"]);
    }
}
