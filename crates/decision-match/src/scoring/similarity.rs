use tracing::debug;

use super::tfidf::{TfidfConfig, TfidfVectorizer};

const WORD_MAX_FEATURES: usize = 30_000;
const CHAR_MAX_FEATURES: usize = 40_000;

/// Similarity of each candidate text to the job text.
///
/// Two TF-IDF spaces are fitted on `{job} ∪ candidates`: word 1-2 grams and
/// padded character 3-5 grams, both accent-stripped. Each candidate gets the
/// larger of its two cosine similarities. A space whose vocabulary comes out
/// empty contributes zeros; an empty job text or all-empty candidates give zeros.
pub fn compute_similarity<S: AsRef<str>>(job_text: &str, cand_texts: &[S]) -> Vec<f64> {
    let zeros = vec![0.0; cand_texts.len()];
    if job_text.is_empty() || cand_texts.iter().all(|text| text.as_ref().is_empty()) {
        return zeros;
    }

    let mut corpus = Vec::with_capacity(cand_texts.len() + 1);
    corpus.push(job_text);
    corpus.extend(cand_texts.iter().map(|text| text.as_ref()));

    let word = cosine_to_first(
        TfidfConfig::word(1, 2)
            .max_features(WORD_MAX_FEATURES)
            .strip_accents(),
        &corpus,
    );
    let chars = cosine_to_first(
        TfidfConfig::char_wb(3, 5)
            .max_features(CHAR_MAX_FEATURES)
            .strip_accents(),
        &corpus,
    );

    match (word, chars) {
        (Some(word), Some(chars)) => word.iter().zip(&chars).map(|(w, c)| w.max(*c)).collect(),
        (Some(only), None) | (None, Some(only)) => only,
        (None, None) => zeros,
    }
}

/// Cosine of every document after the first against the first, or `None` when
/// the space cannot be fitted.
fn cosine_to_first(config: TfidfConfig, corpus: &[&str]) -> Option<Vec<f64>> {
    let analyzer = config.analyzer;
    let mut vectorizer = TfidfVectorizer::new(config);
    match vectorizer.fit_transform(corpus) {
        Ok(rows) => {
            let (job, candidates) = rows.split_first()?;
            Some(candidates.iter().map(|row| row.cosine(job)).collect())
        }
        Err(err) => {
            debug!(?analyzer, error = %err, "similarity space skipped");
            None
        }
    }
}
