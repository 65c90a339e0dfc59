//! Model token extraction: an ordered, hand-written pattern parser.
//!
//! Each grammar pattern reads `prefix? base modifier?` over normalized
//! tokens. Prefixes and modifiers are stored in compact form (no spaces) so
//! `PS 5`, `PS5`, `PRO MAX` and `PROMAX` all line up the same way.

use std::cmp::Reverse;
use std::fmt;

use serde::{Deserialize, Serialize};

use listguard_core::text::tokens;
use listguard_rules::{AbbreviationPolicy, GrammarPattern};

/// Canonical product identifier. Equality is exact on both parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelToken {
    pub base: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
}

impl ModelToken {
    pub fn new(base: &str, modifier: Option<&str>) -> Self {
        Self {
            base: base.to_string(),
            modifier: modifier.map(|m| m.to_string()),
        }
    }
}

impl fmt::Display for ModelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.modifier {
            Some(m) => write!(f, "{} {}", self.base, m),
            None => f.write_str(&self.base),
        }
    }
}

/// A token together with the span of text tokens it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelHit {
    pub token: ModelToken,
    /// First text token of the match.
    pub start: usize,
    /// One past the last text token of the match.
    pub end: usize,
}

/// Extract the model token of normalized text.
///
/// Patterns are tried in order and the first one that matches anywhere wins;
/// inside a pattern the leftmost occurrence wins.
pub fn extract(
    normalized: &str,
    grammar: &[GrammarPattern],
    policy: AbbreviationPolicy,
) -> Option<ModelToken> {
    extract_hit(&tokens(normalized), grammar, policy).map(|hit| hit.token)
}

/// Same as [`extract`] over pre-split tokens, keeping the span.
pub fn extract_hit(
    toks: &[&str],
    grammar: &[GrammarPattern],
    policy: AbbreviationPolicy,
) -> Option<ModelHit> {
    grammar
        .iter()
        .find_map(|pattern| (0..toks.len()).find_map(|i| match_at(toks, i, pattern, policy)))
}

/// Every non-overlapping token across all patterns, in text order.
///
/// Earlier patterns claim their spans first.
pub fn extract_all(
    toks: &[&str],
    grammar: &[GrammarPattern],
    policy: AbbreviationPolicy,
) -> Vec<ModelHit> {
    let mut covered = vec![false; toks.len()];
    let mut hits = Vec::new();

    for pattern in grammar {
        let mut i = 0;
        while i < toks.len() {
            if !covered[i] {
                if let Some(hit) = match_at(toks, i, pattern, policy) {
                    if covered[hit.start..hit.end].iter().all(|c| !c) {
                        covered[hit.start..hit.end].iter_mut().for_each(|c| *c = true);
                        i = hit.end;
                        hits.push(hit);
                        continue;
                    }
                }
            }
            i += 1;
        }
    }

    hits.sort_by_key(|h| h.start);
    hits
}

fn match_at(
    toks: &[&str],
    i: usize,
    pattern: &GrammarPattern,
    policy: AbbreviationPolicy,
) -> Option<ModelHit> {
    if pattern.prefixes.is_empty() {
        return read_model(toks, i, (i, 0), "", pattern, policy);
    }

    let mut prefixes: Vec<&str> = pattern.prefixes.iter().map(|p| p.as_str()).collect();
    prefixes.sort_by_key(|p| Reverse(p.len()));

    prefixes.into_iter().find_map(|prefix| {
        let at = match_prefix(toks, i, prefix)?;
        read_model(toks, i, at, prefix, pattern, policy)
    })
}

/// Match a compact prefix starting at token `i`.
///
/// Returns where the digits must start: a token index and a byte offset
/// inside it (non-zero when the prefix is glued, as in `PS5`).
fn match_prefix(toks: &[&str], i: usize, prefix: &str) -> Option<(usize, usize)> {
    let mut rest = prefix;
    for (j, tok) in toks.iter().enumerate().skip(i) {
        if tok.starts_with(rest) {
            return if tok.len() == rest.len() {
                Some((j + 1, 0))
            } else {
                Some((j, rest.len()))
            };
        }
        if !rest.starts_with(tok) {
            return None;
        }
        rest = &rest[tok.len()..];
    }
    None
}

/// Read `base modifier?` at token `j`, byte `offset`; `prefix` is the
/// compact prefix already matched in front of it (empty for bare patterns).
fn read_model(
    toks: &[&str],
    start: usize,
    (j, offset): (usize, usize),
    prefix: &str,
    pattern: &GrammarPattern,
    policy: AbbreviationPolicy,
) -> Option<ModelHit> {
    let text = toks.get(j)?.get(offset..)?;
    let digits = text.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits < pattern.min_digits || digits > pattern.max_digits {
        return None;
    }
    // a glued prefix must not sit in the middle of a longer number
    if offset > 0 && toks[j][..offset].ends_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let base = if pattern.prefix_in_base {
        format!("{}{}", prefix, &text[..digits])
    } else {
        text[..digits].to_string()
    };
    let tail = &text[digits..];

    if tail.is_empty() {
        let rest = toks.get(j + 1..).unwrap_or(&[]);
        let (modifier, end) = match read_modifier(None, rest, pattern) {
            Some((m, used)) => (Some(m), j + 1 + used),
            None => (None, j + 1),
        };
        return Some(ModelHit {
            token: ModelToken { base, modifier },
            start,
            end,
        });
    }

    let rest = toks.get(j + 1..).unwrap_or(&[]);
    match read_modifier(Some(tail), rest, pattern) {
        Some(_) if policy == AbbreviationPolicy::Strict => None,
        Some((m, used)) => Some(ModelHit {
            token: ModelToken {
                base,
                modifier: Some(m),
            },
            start,
            // `used` counts the glued tail, which lives in token j
            end: j + used,
        }),
        // letters that are not a modifier (`16GB`-style suffixes)
        None => Some(ModelHit {
            token: ModelToken {
                base,
                modifier: None,
            },
            start,
            end: j + 1,
        }),
    }
}

/// Longest modifier spelled by the leading pieces, with the number of
/// pieces it consumed. Aliases fold onto their canonical modifier.
fn read_modifier(
    glued: Option<&str>,
    rest: &[&str],
    pattern: &GrammarPattern,
) -> Option<(String, usize)> {
    let mut spellings: Vec<(&str, &str)> = pattern
        .modifiers
        .iter()
        .map(|m| (m.as_str(), m.as_str()))
        .chain(
            pattern
                .modifier_aliases
                .iter()
                .map(|(s, c)| (s.as_str(), c.as_str())),
        )
        .collect();
    spellings.sort_by_key(|(s, _)| Reverse(s.len()));

    for (spelling, canonical) in spellings {
        let mut acc = String::new();
        for (used, piece) in glued.into_iter().chain(rest.iter().copied()).enumerate() {
            acc.push_str(piece);
            if acc == spelling {
                return Some((canonical.to_string(), used + 1));
            }
            if acc.len() >= spelling.len() || !spelling.starts_with(acc.as_str()) {
                break;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use listguard_core::text::normalize;
    use listguard_rules::builtin;

    fn grammar(key: &str) -> (Vec<GrammarPattern>, AbbreviationPolicy) {
        let rules = builtin::all()
            .into_iter()
            .find(|r| r.key == key)
            .unwrap()
            .prepare()
            .unwrap();
        (rules.grammar, rules.abbreviation)
    }

    fn read(key: &str, text: &str) -> Option<ModelToken> {
        let (g, p) = grammar(key);
        extract(&normalize(text), &g, p)
    }

    fn tok(base: &str, modifier: Option<&str>) -> Option<ModelToken> {
        Some(ModelToken::new(base, modifier))
    }

    #[test]
    fn test_gpu_tokens() {
        assert_eq!(read("videocards", "5070"), tok("5070", None));
        assert_eq!(read("videocards", "RTX 5070"), tok("5070", None));
        assert_eq!(read("videocards", "RTX 5070 Ti"), tok("5070", Some("TI")));
        assert_eq!(read("videocards", "5070TI"), tok("5070", Some("TI")));
        assert_eq!(read("videocards", "rtx-4070 ti super 16gb"), tok("4070", Some("TISUPER")));
        assert_eq!(read("videocards", "Radeon RX 7900 XTX"), tok("7900", Some("XTX")));
        assert_eq!(read("videocards", "GeForce GTX 1650"), tok("1650", None));
    }

    #[test]
    fn test_base_run_is_maximal() {
        assert_eq!(read("videocards", "50701"), None);
        assert_eq!(read("playstation", "PS55"), None);
    }

    #[test]
    fn test_modifier_needs_boundary() {
        // TIGER is not TI followed by junk
        assert_eq!(read("videocards", "RTX 5070 Tiger"), tok("5070", None));
    }

    #[test]
    fn test_console_tokens() {
        assert_eq!(read("playstation", "ps5 pro"), tok("5", Some("PRO")));
        assert_eq!(read("playstation", "PS5PRO"), tok("5", Some("PRO")));
        assert_eq!(read("playstation", "Sony PlayStation 5 Slim Digital"), tok("5", Some("SLIM")));
        assert_eq!(read("playstation", "PlayStation5"), tok("5", None));
        assert_eq!(read("nintendo_switch", "nintendo switch 2"), tok("2", None));
        assert_eq!(read("nintendo_switch", "Switch 2 + игра"), tok("2", None));
        assert_eq!(read("nintendo_switch", "Nintendo Switch OLED"), None);
    }

    #[test]
    fn test_multi_token_prefix_and_modifier() {
        assert_eq!(read("processors", "AMD Ryzen 7 7800X3D BOX"), tok("7800", Some("X3D")));
        assert_eq!(read("processors", "Intel Core i5-13600KF"), tok("13600", Some("KF")));
        assert_eq!(read("processors", "Ryzen 7800X3D"), tok("7800", Some("X3D")));
        assert_eq!(read("iphone", "Apple iPhone 15 Pro Max 256GB"), tok("15", Some("PROMAX")));
        assert_eq!(read("iphone", "iPhone 15 Max"), tok("15", Some("PROMAX")));
    }

    #[test]
    fn test_strict_policy_rejects_glued_modifier() {
        assert_eq!(read("iphone", "iPhone 15Pro"), None);
        assert_eq!(read("iphone", "iPhone 15 Pro"), tok("15", Some("PRO")));
    }

    #[test]
    fn test_chipset_letter_stays_in_base() {
        assert_eq!(read("motherboards", "MSI PRO H670-P DDR4"), tok("H670", None));
        assert_eq!(read("motherboards", "x670"), tok("X670", None));
        assert_eq!(read("motherboards", "ASUS ROG Strix X670E-E"), tok("X670", Some("E")));
        assert_eq!(read("motherboards", "B 650"), tok("B650", None));
        assert_ne!(read("motherboards", "H670"), read("motherboards", "Z670"));
    }

    #[test]
    fn test_processor_patterns_in_order() {
        // Ryzen is listed before the Intel i-series and the bare fallback
        assert_eq!(
            read("processors", "Комплект Ryzen 7 7700 + Core i5 12400F"),
            tok("7700", None)
        );
        assert_eq!(
            read("processors", "Core i5 12400F или Ryzen 7 7700"),
            tok("7700", None)
        );
        // no Ryzen prefix: the i-series pattern wins over the bare one
        assert_eq!(read("processors", "Intel 2024 Core i7 14700K"), tok("14700", Some("K")));
    }

    #[test]
    fn test_first_pattern_wins() {
        // the prefixed pattern is tried before the bare one
        assert_eq!(read("videocards", "2024 RTX 4060"), tok("4060", None));
    }

    #[test]
    fn test_extract_all_spans() {
        let (g, p) = grammar("videocards");
        let title = normalize("RTX 5070 Ti vs RTX 4070 2024");
        let hits = extract_all(&tokens(&title), &g, p);
        let found: Vec<String> = hits.iter().map(|h| h.token.to_string()).collect();
        assert_eq!(found, vec!["5070 TI", "4070", "2024"]);
        assert_eq!((hits[0].start, hits[0].end), (0, 3));
    }

    #[test]
    fn test_extract_deterministic() {
        let (g, p) = grammar("playstation");
        let text = normalize("PS4 Pro и PS5 Slim");
        let first = extract(&text, &g, p);
        for _ in 0..10 {
            assert_eq!(extract(&text, &g, p), first);
        }
        assert_eq!(first, tok("4", Some("PRO")));
    }
}
