//! Text normalization: titles, queries and rule keywords share one form.
//!
//! Normalized text is upper-case alphanumeric tokens separated by single
//! spaces. Every other character is a separator. Keyword checks work on
//! whole tokens, never on raw substrings.

/// Normalize free text into comparable token form. Total: `""` → `""`.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            for up in ch.to_uppercase() {
                out.push(fold_char(up));
            }
        } else {
            pending_space = true;
        }
    }

    out
}

/// Normalized form with separators removed (`"PS5 PRO"` → `"PS5PRO"`).
pub fn compact(text: &str) -> String {
    normalize(text).chars().filter(|c| *c != ' ').collect()
}

/// Tokens of an already normalized string.
pub fn tokens(normalized: &str) -> Vec<&str> {
    normalized.split(' ').filter(|t| !t.is_empty()).collect()
}

fn fold_char(c: char) -> char {
    match c {
        'Ё' => 'Е',
        other => other,
    }
}

/// Whole-token phrase test over normalized tokens.
///
/// `phrase` is a normalized keyword, possibly several tokens long. A token
/// ending in `*` matches any title token starting with the rest
/// (`ЗАРЯДН*` matches `ЗАРЯДНАЯ`).
pub fn contains_phrase(haystack: &[&str], phrase: &str) -> bool {
    find_phrase(haystack, phrase).is_some()
}

/// Token index where `phrase` first occurs, same matching as [`contains_phrase`].
pub fn find_phrase(haystack: &[&str], phrase: &str) -> Option<usize> {
    let needle = tokens(phrase);
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window.iter().zip(&needle).all(|(t, n)| token_matches(t, n)))
}

fn token_matches(token: &str, pattern: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => token.starts_with(prefix),
        None => token == pattern,
    }
}

/// Normalize a keyword from configuration, keeping a trailing wildcard.
pub fn normalize_keyword(keyword: &str) -> String {
    let wildcard = keyword.trim_end().ends_with('*');
    let mut norm = normalize(keyword);
    if wildcard && !norm.is_empty() {
        norm.push('*');
    }
    norm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("  Sony  PlayStation-5 (Pro), 2 ТБ "), "SONY PLAYSTATION 5 PRO 2 ТБ");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("!!! ---"), "");
    }

    #[test]
    fn test_normalize_cyrillic_and_yo() {
        assert_eq!(normalize("Чёрный чехол"), "ЧЕРНЫЙ ЧЕХОЛ");
    }

    #[test]
    fn test_compact() {
        assert_eq!(compact("ps5 pro"), "PS5PRO");
        assert_eq!(compact("RTX-5070 Ti"), "RTX5070TI");
    }

    #[test]
    fn test_contains_phrase_whole_tokens() {
        let title = normalize("Кабель HDMI для PS5");
        let toks = tokens(&title);
        assert!(contains_phrase(&toks, "КАБЕЛЬ"));
        assert!(contains_phrase(&toks, "HDMI ДЛЯ"));
        assert!(!contains_phrase(&toks, "КАБ"));
        assert!(!contains_phrase(&toks, "PS"));
        assert!(!contains_phrase(&toks, ""));
    }

    #[test]
    fn test_contains_phrase_wildcard() {
        let title = normalize("Зарядная станция для PlayStation 5 Pro");
        let toks = tokens(&title);
        assert!(contains_phrase(&toks, "ЗАРЯДН*"));
        assert!(contains_phrase(&toks, "ЗАРЯДН* СТАНЦИ*"));
        assert!(!contains_phrase(&toks, "ЗАРЯДКА*"));
    }

    #[test]
    fn test_find_phrase_position() {
        let title = normalize("Switch 2 + игра Mario Kart");
        let toks = tokens(&title);
        assert_eq!(find_phrase(&toks, "ИГРА"), Some(2));
        assert_eq!(find_phrase(&toks, "MARIO KART"), Some(3));
        assert_eq!(find_phrase(&toks, "ZELDA"), None);
    }

    #[test]
    fn test_normalize_keyword_keeps_wildcard() {
        assert_eq!(normalize_keyword("зарядн*"), "ЗАРЯДН*");
        assert_eq!(normalize_keyword("док-станция"), "ДОК СТАНЦИЯ");
    }
}
