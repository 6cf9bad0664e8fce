//! TF-IDF vectorizer with word and padded character n-gram analyzers.
//!
//! Weights follow the usual smooth formulation: raw term counts times
//! `ln((1 + n_docs) / (1 + df)) + 1`, then each row is scaled to unit L2 norm.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Analyzer {
    /// `\b\w\w+\b` tokens joined into n-grams with single spaces.
    Word,
    /// Character n-grams taken inside each whitespace-separated word padded with one space per side.
    CharWb,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfConfig {
    pub analyzer: Analyzer,
    pub ngram_range: (usize, usize),
    pub max_features: Option<usize>,
    pub strip_accents: bool,
}

impl TfidfConfig {
    pub fn word(min_n: usize, max_n: usize) -> Self {
        Self {
            analyzer: Analyzer::Word,
            ngram_range: (min_n, max_n),
            max_features: None,
            strip_accents: false,
        }
    }

    pub fn char_wb(min_n: usize, max_n: usize) -> Self {
        Self {
            analyzer: Analyzer::CharWb,
            ngram_range: (min_n, max_n),
            max_features: None,
            strip_accents: false,
        }
    }

    pub fn max_features(mut self, limit: usize) -> Self {
        self.max_features = Some(limit);
        self
    }

    pub fn strip_accents(mut self) -> Self {
        self.strip_accents = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TfidfError {
    #[error("empty vocabulary; the documents only contain stop words or no tokens")]
    EmptyVocabulary,
    #[error("vectorizer used before fit")]
    NotFitted,
}

/// Sparse row with strictly increasing feature indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    fn from_map(weights: HashMap<usize, f64>) -> Self {
        let mut entries: Vec<(usize, f64)> = weights.into_iter().collect();
        entries.sort_by_key(|(index, _)| *index);
        Self { entries }
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    /// Set feature `index` to `value`, keeping indices ordered.
    pub fn push(&mut self, index: usize, value: f64) {
        match self.entries.binary_search_by_key(&index, |(i, _)| *i) {
            Ok(position) => self.entries[position].1 = value,
            Err(position) => self.entries.insert(position, (index, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dot(&self, other: &Self) -> f64 {
        let (mut left, mut right) = (0, 0);
        let mut total = 0.0;
        while left < self.entries.len() && right < other.entries.len() {
            let (li, lv) = self.entries[left];
            let (ri, rv) = other.entries[right];
            match li.cmp(&ri) {
                std::cmp::Ordering::Less => left += 1,
                std::cmp::Ordering::Greater => right += 1,
                std::cmp::Ordering::Equal => {
                    total += lv * rv;
                    left += 1;
                    right += 1;
                }
            }
        }
        total
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt()
    }

    /// Cosine similarity; `0.0` when either row is all zeros.
    pub fn cosine(&self, other: &Self) -> f64 {
        let denominator = self.norm() * other.norm();
        if denominator == 0.0 {
            return 0.0;
        }
        self.dot(other) / denominator
    }

    fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for (_, value) in &mut self.entries {
                *value /= norm;
            }
        }
    }
}

/// Fitted vocabulary and inverse document frequencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    config: TfidfConfig,
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn new(config: TfidfConfig) -> Self {
        Self {
            config,
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
        }
    }

    pub fn config(&self) -> &TfidfConfig {
        &self.config
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    pub fn feature_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<(), TfidfError> {
        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        let mut total_frequency: HashMap<String, usize> = HashMap::new();

        for document in documents {
            let mut seen = HashSet::new();
            for term in self.analyze(document.as_ref()) {
                *total_frequency.entry(term.clone()).or_default() += 1;
                if seen.insert(term.clone()) {
                    *document_frequency.entry(term).or_default() += 1;
                }
            }
        }

        if document_frequency.is_empty() {
            return Err(TfidfError::EmptyVocabulary);
        }

        let mut terms: Vec<String> = document_frequency.keys().cloned().collect();
        if let Some(limit) = self.config.max_features {
            if terms.len() > limit {
                terms.sort_by(|a, b| total_frequency[b].cmp(&total_frequency[a]).then_with(|| a.cmp(b)));
                terms.truncate(limit);
            }
        }
        terms.sort();

        let n_documents = documents.len() as f64;
        self.idf = terms
            .iter()
            .map(|term| {
                let df = document_frequency[term] as f64;
                ((1.0 + n_documents) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        self.vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(index, term)| (term, index))
            .collect();
        Ok(())
    }

    /// Unit-norm TF-IDF row of `document`; terms outside the vocabulary are ignored.
    pub fn transform(&self, document: &str) -> Result<SparseVector, TfidfError> {
        if !self.is_fitted() {
            return Err(TfidfError::NotFitted);
        }
        let mut weights: HashMap<usize, f64> = HashMap::new();
        for term in self.analyze(document) {
            if let Some(&index) = self.vocabulary.get(&term) {
                *weights.entry(index).or_default() += 1.0;
            }
        }
        for (index, weight) in weights.iter_mut() {
            *weight *= self.idf[*index];
        }
        let mut row = SparseVector::from_map(weights);
        row.normalize();
        Ok(row)
    }

    pub fn fit_transform<S: AsRef<str>>(
        &mut self,
        documents: &[S],
    ) -> Result<Vec<SparseVector>, TfidfError> {
        self.fit(documents)?;
        documents
            .iter()
            .map(|document| self.transform(document.as_ref()))
            .collect()
    }

    fn preprocess(&self, document: &str) -> String {
        let lowered = document.to_lowercase();
        if self.config.strip_accents {
            lowered.nfkd().filter(|c| !is_combining_mark(*c)).collect()
        } else {
            lowered
        }
    }

    fn analyze(&self, document: &str) -> Vec<String> {
        let text = self.preprocess(document);
        let (min_n, max_n) = self.config.ngram_range;
        match self.config.analyzer {
            Analyzer::Word => word_ngrams(&text, min_n, max_n),
            Analyzer::CharWb => char_wb_ngrams(&text, min_n, max_n),
        }
    }
}

fn word_ngrams(text: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let tokens: Vec<&str> = TOKEN_RE.find_iter(text).map(|m| m.as_str()).collect();
    let mut grams = Vec::new();
    for n in min_n.max(1)..=max_n {
        if n > tokens.len() {
            break;
        }
        grams.extend(tokens.windows(n).map(|window| window.join(" ")));
    }
    grams
}

fn char_wb_ngrams(text: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let mut grams = Vec::new();
    for word in text.split_whitespace() {
        let padded: Vec<char> = std::iter::once(' ')
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect();
        for n in min_n.max(1)..=max_n {
            if padded.len() <= n {
                // A word no longer than n yields itself once, for the smallest such n only.
                grams.push(padded.iter().collect());
                break;
            }
            grams.extend(padded.windows(n).map(|window| window.iter().collect::<String>()));
        }
    }
    grams
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_ngrams_skip_single_characters() {
        let grams = word_ngrams("a dev rust e go", 1, 2);
        assert_eq!(grams, vec!["dev", "rust", "go", "dev rust", "rust go"]);
    }

    #[test]
    fn char_wb_pads_words_and_counts_short_words_once() {
        let grams = char_wb_ngrams("go rust", 3, 5);
        assert_eq!(
            grams,
            vec![
                " go", "go ", " go ", // "go" padded has 4 chars
                " ru", "rus", "ust", "st ", " rus", "rust", "ust ", " rust", "rust ",
            ]
        );
    }

    #[test]
    fn char_wb_word_shorter_than_min_n_is_emitted_whole() {
        assert_eq!(char_wb_ngrams("a", 3, 5), vec![" a "]);
    }

    #[test]
    fn idf_is_smooth_and_rows_unit_norm() {
        let mut vectorizer = TfidfVectorizer::new(TfidfConfig::word(1, 1));
        let rows = vectorizer
            .fit_transform(&["rust go", "rust"])
            .expect("fit");

        let rust = vectorizer.feature_index("rust").expect("rust");
        let go = vectorizer.feature_index("go").expect("go");
        let idf_go = (3.0f64 / 2.0).ln() + 1.0;
        let norm = (1.0 + idf_go * idf_go).sqrt();

        let first: HashMap<usize, f64> = rows[0].entries().iter().copied().collect();
        assert!((first[&rust] - 1.0 / norm).abs() < 1e-12);
        assert!((first[&go] - idf_go / norm).abs() < 1e-12);
        assert!((rows[1].norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn max_features_keeps_most_frequent_terms() {
        let mut vectorizer = TfidfVectorizer::new(TfidfConfig::word(1, 1).max_features(2));
        vectorizer
            .fit(&["sql sql python", "sql java python", "rust"])
            .expect("fit");
        assert_eq!(vectorizer.vocabulary_len(), 2);
        assert!(vectorizer.feature_index("sql").is_some());
        assert!(vectorizer.feature_index("python").is_some());
        assert!(vectorizer.feature_index("rust").is_none());
    }

    #[test]
    fn accents_are_stripped_when_configured() {
        let mut vectorizer = TfidfVectorizer::new(TfidfConfig::word(1, 1).strip_accents());
        vectorizer.fit(&["Gestão de PROJETOS"]).expect("fit");
        assert!(vectorizer.feature_index("gestao").is_some());
        assert!(vectorizer.feature_index("projetos").is_some());
    }

    #[test]
    fn empty_vocabulary_is_an_error() {
        let mut vectorizer = TfidfVectorizer::new(TfidfConfig::word(1, 2));
        assert_eq!(
            vectorizer.fit(&["a b c", ""]),
            Err(TfidfError::EmptyVocabulary)
        );
        assert_eq!(vectorizer.transform("x"), Err(TfidfError::NotFitted));
    }

    #[test]
    fn cosine_of_disjoint_rows_is_zero() {
        let mut vectorizer = TfidfVectorizer::new(TfidfConfig::word(1, 1));
        let rows = vectorizer.fit_transform(&["rust", "java"]).expect("fit");
        assert_eq!(rows[0].cosine(&rows[1]), 0.0);
        assert!((rows[0].cosine(&rows[0]) - 1.0).abs() < 1e-12);
    }
}
