//! Text normalisation shared by the lexical and embedding search paths.

/// Stop words dropped before matching or hashing.
pub const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "in", "of", "to", "is", "was",
    "for", "on", "with", "this", "that", "are", "were", "be", "been",
    "by", "from", "we", "our", "their", "which", "also", "what", "how",
    "best", "use", "using", "method", "methods", "should", "i", "me",
];

/// Lowercased alphanumeric tokens, stop words and single characters removed.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 1 && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_noise() {
        assert_eq!(
            tokenize("What is the best method for CCSD(T) thermochemistry?"),
            vec!["ccsd", "thermochemistry"]
        );
        assert!(tokenize("  ").is_empty());
    }
}
