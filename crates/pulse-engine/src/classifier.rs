//! Text Classifier
//!
//! Maps free-form mention text to a reply [`Category`] by ordered keyword
//! matching. Sets are tested in priority order and the first set with any
//! keyword contained in the lower-cased text wins.

use crate::model::Category;

pub const NEGATIVE_KEYWORDS: &[&str] = &[
    "lost", "scam", "rip", "angry", "hate", "bad signal", "wrong", "dumped", "rekt", "sucks",
    "fuck", "wtf",
];

pub const GRATEFUL_KEYWORDS: &[&str] = &[
    "thank", "thx", "gracias", "cheers", "appreciate", "nice", "good call",
];

pub const PRICE_KEYWORDS: &[&str] = &["price", "btc", "eth", "bitcoin", "ethereum"];

pub const BEGINNER_KEYWORDS: &[&str] = &[
    "how to start", "beginner", "new", "first time", "guide", "help", "where to buy",
];

/// Words that make a mention worth amplifying with a repost
pub const AMPLIFY_KEYWORDS: &[&str] = &["thank", "useful", "great", "accurate"];

/// Keyword sets in priority order
const RULES: [(Category, &[&str]); 4] = [
    (Category::Negative, NEGATIVE_KEYWORDS),
    (Category::Grateful, GRATEFUL_KEYWORDS),
    (Category::PriceRequest, PRICE_KEYWORDS),
    (Category::Beginner, BEGINNER_KEYWORDS),
];

/// True if any keyword occurs as a substring of the already lower-cased text
pub fn contains_any(normalized: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| normalized.contains(kw))
}

/// Classify mention text. Never fails; unmatched and empty text is `General`.
pub fn classify(text: &str) -> Category {
    let normalized = text.to_lowercase();
    RULES
        .iter()
        .find(|(_, keywords)| contains_any(&normalized, keywords))
        .map_or(Category::General, |(category, _)| *category)
}

/// Whether a mention should also be reposted
pub fn should_amplify(text: &str) -> bool {
    contains_any(&text.to_lowercase(), AMPLIFY_KEYWORDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_category() {
        assert_eq!(classify("I got rekt on this trade, total scam"), Category::Negative);
        assert_eq!(classify("Thanks for the setup!"), Category::Grateful);
        assert_eq!(classify("what's the price of btc"), Category::PriceRequest);
        assert_eq!(classify("any guide for a beginner?"), Category::Beginner);
        assert_eq!(classify("gm frens"), Category::General);
    }

    #[test]
    fn test_empty_is_general() {
        assert_eq!(classify(""), Category::General);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("WTF IS THIS"), Category::Negative);
        assert_eq!(classify("ETHEREUM to 10k?"), Category::PriceRequest);
    }

    #[test]
    fn test_negative_beats_everything() {
        // beginner, price and gratitude keywords all present
        let text = "thanks, I'm new here and lost everything on btc";
        assert_eq!(classify(text), Category::Negative);
    }

    #[test]
    fn test_priority_order_for_lower_categories() {
        assert_eq!(classify("cheers, what's the btc price"), Category::Grateful);
        assert_eq!(classify("beginner asking about eth"), Category::PriceRequest);
    }

    #[test]
    fn test_substring_semantics() {
        // "new" inside "news" and "rip" inside "trip" match, as substrings do
        assert_eq!(classify("any news today"), Category::Beginner);
        assert_eq!(classify("what a trip"), Category::Negative);
    }

    #[test]
    fn test_deterministic() {
        for _ in 0..10 {
            assert_eq!(classify("help me pls"), Category::Beginner);
        }
    }

    #[test]
    fn test_should_amplify() {
        assert!(should_amplify("Really USEFUL thread"));
        assert!(!should_amplify("gm"));
    }
}
