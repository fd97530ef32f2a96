use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Tokens are runs of two or more word characters.
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("token pattern is valid"));

pub fn tokenize(text: &str, lowercase: bool) -> Vec<String> {
    if lowercase {
        let lowered = text.to_lowercase();
        TOKEN_PATTERN
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect()
    } else {
        TOKEN_PATTERN
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

/// Count every n-gram with `min <= n <= max`, joining tokens with a space.
pub fn count_ngrams(tokens: &[String], (min, max): (usize, usize)) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for n in min..=max {
        for window in tokens.windows(n) {
            *counts.entry(window.join(" ")).or_insert(0) += 1;
        }
    }
    counts
}
