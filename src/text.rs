//! Tokenization shared by model fitting and query transformation

/// Split raw text into lowercase terms.
///
/// Terms are maximal runs of alphanumeric characters, lowercased; runs
/// shorter than two characters are dropped. Fitting and transformation
/// must agree on this exact rule, so both go through here.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(|t| t.to_lowercase())
        .collect()
}
