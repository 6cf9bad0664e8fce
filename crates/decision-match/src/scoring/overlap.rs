use std::collections::HashSet;

fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .replace(['/', ','], " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Jaccard overlap of the lowercase word sets of the two texts, with `/` and
/// `,` treated as separators. `0.0` when either side has no words.
pub fn score_tecnico(job_text: &str, cand_text: &str) -> f64 {
    let job = word_set(job_text);
    let cand = word_set(cand_text);
    if job.is_empty() || cand.is_empty() {
        return 0.0;
    }
    let shared = job.intersection(&cand).count();
    let union = job.len() + cand.len() - shared;
    shared as f64 / union as f64
}
