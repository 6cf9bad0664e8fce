//! Text normalization shared by every stage.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http\S+|www\.\S+").expect("valid url regex"));
static NOISE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s\.,!\?\-:;]").expect("valid noise regex"));
static MULTI_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid whitespace regex"));
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z0-9]+").expect("valid word regex"));

/// Clean free text for keyword analytics.
///
/// Lowercases, folds accents to ASCII, drops URLs, turns anything outside
/// letters, digits, whitespace and simple punctuation into spaces, and collapses
/// repeated whitespace. `None` cleans to an empty string. Idempotent.
pub fn basic_clean(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };

    let folded = fold_to_ascii(&raw.trim().to_lowercase());
    let without_urls = URL_RE.replace_all(&folded, "");
    let denoised = NOISE_RE.replace_all(&without_urls, " ");
    let collapsed = MULTI_SPACE_RE.replace_all(&denoised, " ");
    collapsed.trim().to_string()
}

/// NFKD-decompose and keep only the ASCII part, dropping combining marks and
/// characters without an ASCII decomposition.
pub fn fold_to_ascii(value: &str) -> String {
    value.nfkd().filter(char::is_ascii).collect()
}

/// Canonical form of a free-text application status.
pub fn normalize_status(value: &str) -> String {
    let folded = fold_to_ascii(&value.to_lowercase());
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase and collapse whitespace; used when joining record columns.
pub fn normalize_text(value: &str) -> String {
    value
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// `[a-z0-9]+` runs of an already-lowercased text.
pub fn word_tokens(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD_RE
        .find_iter(&lowered)
        .map(|token| token.as_str().to_string())
        .collect()
}

/// Portuguese stopwords ignored by the term-frequency analytics.
pub static STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "o", "os", "as", "de", "da", "do", "das", "dos", "e", "em", "um", "uma", "uns",
        "umas", "para", "por", "com", "sem", "no", "na", "nos", "nas", "ao", "aos", "que", "se",
        "seu", "sua", "seus", "suas", "meu", "minha", "meus", "minhas", "teu", "tua", "teus",
        "tuas", "nosso", "nossa", "nossos", "nossas", "eu", "voce", "ele", "ela", "eles", "elas",
        "este", "esta", "isto", "esse", "essa", "isso", "aquele", "aquela", "aquilo", "mais",
        "menos", "tambem", "ja", "quando", "onde", "como", "porque", "entre", "sobre", "ate",
        "ser", "ter", "haver", "fazer", "vai", "vou", "foi", "era", "sao", "sera", "tem", "tinha",
        "seja", "sendo", "depois", "antes",
    ]
    .into_iter()
    .collect()
});

/// Tokens worth counting: not a stopword, longer than two characters, not purely numeric.
pub fn content_terms(text: &str) -> impl Iterator<Item = String> + '_ {
    WORD_RE
        .find_iter(text)
        .map(|token| token.as_str())
        .filter(|token| {
            token.len() > 2
                && !STOPWORDS.contains(token)
                && !token.chars().all(|c| c.is_ascii_digit())
        })
        .map(str::to_string)
}
