pub const GREETING_KEYWORDS: [&str; 18] = [
    "hello",
    "hi",
    "hey",
    "howdy",
    "greetings",
    "sup",
    "good morning",
    "good afternoon",
    "good evening",
    "good night",
    "how are you",
    "how r you",
    "how do you do",
    "what can you do",
    "what do you do",
    "who are you",
    "what are you",
    "tell me about yourself",
];

const GREETING_FILLERS: [&str; 9] = ["a", "an", "the", "i", "me", "you", "please", "thanks", "thank"];

const PHRASE_FILLERS: [&str; 5] = ["the", "and", "for", "are", "you"];

const MIN_LENGTH: usize = 3;
const MIN_LETTERS: usize = 3;
const MAX_FILLER_WORDS: usize = 6;
const MAX_PHRASE_WORDS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Noise,
    Greeting,
    Substantive,
}

// Noise wins over greeting: a two-letter "hi" is answered as noise.
pub fn classify(text: &str) -> QueryKind {
    if is_noise(text) {
        QueryKind::Noise
    } else if is_greeting(text) {
        QueryKind::Greeting
    } else {
        QueryKind::Substantive
    }
}

pub fn is_noise(text: &str) -> bool {
    let stripped = text.trim();
    if stripped.chars().count() < MIN_LENGTH {
        return true;
    }
    stripped.chars().filter(char::is_ascii_alphabetic).count() < MIN_LETTERS
}

pub fn is_greeting(text: &str) -> bool {
    let lower = text.to_lowercase();
    let lower = lower.trim();

    if GREETING_KEYWORDS.contains(&lower) {
        return true;
    }

    let words: Vec<&str> = lower.split_whitespace().collect();
    if words.len() <= MAX_FILLER_WORDS
        && words
            .iter()
            .all(|word| GREETING_KEYWORDS.contains(word) || GREETING_FILLERS.contains(word))
    {
        return true;
    }

    if words.len() > MAX_PHRASE_WORDS {
        return false;
    }

    GREETING_KEYWORDS
        .iter()
        .filter(|phrase| lower.contains(*phrase))
        .any(|phrase| {
            let rest = lower.replace(phrase, "");
            let extra = rest
                .split_whitespace()
                .filter(|word| word.chars().count() > 2 && !PHRASE_FILLERS.contains(word))
                .count();
            extra <= 1
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_or_symbolic_input_is_noise() {
        assert!(is_noise("!!!"));
        assert!(is_noise("  ok  "));
        assert!(is_noise("12345 67"));
        assert!(is_noise("^ #$%# 1a2b"));
        assert!(!is_noise("^ #$%# asdasd 123456"));
        assert!(!is_noise("What is the sum assured?"));
    }

    #[test]
    fn three_ascii_letters_are_enough_to_not_be_noise() {
        assert!(!is_noise("abc"));
        assert!(is_noise("ab1"));
    }

    #[test]
    fn non_ascii_letters_do_not_count_as_letters() {
        assert!(is_noise("été"));
    }

    #[test]
    fn exact_keywords_are_greetings() {
        assert!(is_greeting("hello"));
        assert!(is_greeting("  Good Morning "));
        assert!(is_greeting("tell me about yourself"));
    }

    #[test]
    fn greeting_words_with_fillers_are_greetings() {
        assert!(is_greeting("hey you"));
        assert!(is_greeting("hello please"));
        assert!(is_greeting("hi hi thanks"));
        assert!(!is_greeting("hello policy terms"));
    }

    #[test]
    fn filler_only_messages_stop_at_six_words() {
        assert!(is_greeting("hello please thanks thank please thanks"));
        assert!(!is_greeting("hello please thanks thank please thanks please"));
    }

    #[test]
    fn phrase_greetings_stop_at_eight_words() {
        assert!(is_greeting("hi hi hi hi hi hi hi policy"));
        assert!(!is_greeting("hi hi hi hi hi hi hi hi policy"));
    }

    #[test]
    fn messages_dominated_by_a_phrase_are_greetings() {
        assert!(is_greeting("hi, what can you do?"));
        assert!(is_greeting("hey, how are you?"));
        assert!(is_greeting("hello policy"));
        assert!(!is_greeting("hello, what is the claim settlement ratio"));
    }

    #[test]
    fn long_messages_are_never_phrase_greetings() {
        assert!(!is_greeting(
            "hello I would like to know about the maturity benefit in this plan"
        ));
    }

    #[test]
    fn substring_matches_inside_words_are_judged_by_the_remainder() {
        // "hi" occurs inside "this" and "which", but the rest carries content.
        assert!(!is_greeting("which riders this policy offers"));
    }

    #[test]
    fn classification_order_is_noise_then_greeting() {
        assert_eq!(classify("hi"), QueryKind::Noise);
        assert_eq!(classify("hello"), QueryKind::Greeting);
        assert_eq!(
            classify("What is ICICI Pru iProtect Smart Plus?"),
            QueryKind::Substantive
        );
        assert_eq!(classify("What is the weather in Mumbai?"), QueryKind::Substantive);
    }
}
