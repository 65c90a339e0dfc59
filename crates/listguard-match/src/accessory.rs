//! Accessory filter: first stage.
//!
//! A hard keyword rejects the listing outright. A soft keyword only makes
//! it doubtful: the listing goes on through the pipeline but always ends up
//! with the adjudicator.

use listguard_core::text::{contains_phrase, find_phrase};
use listguard_core::{FilterSettings, ReasonCode, Stage, Verdict};
use tracing::debug;

use crate::context::ListingContext;

/// Accessory keyword that rejects the title, if any.
///
/// Under the bundle exception a `bundle_tokens` keyword is tolerated when it
/// comes after a confirmed model match (`Switch 2 + игра ...`), but not when
/// it leads the title (`Игра ... для Switch 2`).
pub fn find_accessory<'r>(ctx: &ListingContext<'r>) -> Option<&'r str> {
    let rules = ctx.rules;
    let anchor = match &ctx.title_model {
        Some(hit) if rules.conflict.allow_bundles && ctx.model_equal() => Some(hit.start),
        _ => None,
    };

    rules
        .accessory_keywords
        .iter()
        .find(|keyword| match find_phrase(&ctx.title_tokens, keyword) {
            None => false,
            Some(pos) => match anchor {
                Some(start) if pos > start && rules.bundle_tokens.contains(keyword) => false,
                _ => true,
            },
        })
        .map(|k| k.as_str())
}

/// Soft accessory keyword present in the title, if any.
pub fn find_soft_accessory<'r>(ctx: &ListingContext<'r>) -> Option<&'r str> {
    ctx.rules
        .soft_accessory_keywords
        .iter()
        .find(|keyword| contains_phrase(&ctx.title_tokens, keyword))
        .map(|k| k.as_str())
}

/// Terminal `ACCESSORY` reject on a hard keyword, or an escalating
/// `SOFT_ACCESSORY` verdict on a soft one. Each tier can be switched off.
pub fn check(ctx: &ListingContext<'_>, filters: &FilterSettings) -> Option<Verdict> {
    if filters.enable_hard_filter {
        if let Some(keyword) = find_accessory(ctx) {
            debug!("Accessory keyword {:?} in {:?}", keyword, ctx.title);
            return Some(Verdict::reject(ReasonCode::Accessory, 1.0, Stage::Accessory));
        }
    }
    if filters.enable_soft_filter {
        if let Some(keyword) = find_soft_accessory(ctx) {
            debug!("Soft accessory keyword {:?} in {:?}", keyword, ctx.title);
            return Some(Verdict::escalating(
                false,
                ReasonCode::SoftAccessory,
                0.3,
                Stage::Accessory,
            ));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use listguard_core::text::normalize;
    use listguard_rules::{builtin, CategoryRuleSet};

    fn prepared(rules: CategoryRuleSet) -> CategoryRuleSet {
        rules.prepare().unwrap()
    }

    fn accessory(rules: &CategoryRuleSet, title: &str, query: &str) -> Option<String> {
        let title = normalize(title);
        let query = normalize(query);
        let ctx = ListingContext::new(rules, &title, &query);
        find_accessory(&ctx).map(|k| k.to_string())
    }

    #[test]
    fn test_charging_station_is_accessory() {
        let rules = prepared(builtin::playstation());
        let hit = accessory(&rules, "Зарядная станция для PlayStation 5 Pro", "ps5 pro");
        assert!(hit.is_some());
    }

    #[test]
    fn test_whole_token_only() {
        let rules = prepared(builtin::videocards());
        // КАБЕЛЬНЫЙ is not КАБЕЛЬ
        assert_eq!(accessory(&rules, "Видеокарта RTX 5070 кабельный менеджмент", "5070"), None);
        assert_eq!(
            accessory(&rules, "Кабель питания для RTX 5070", "5070").as_deref(),
            Some("КАБЕЛЬ")
        );
    }

    #[test]
    fn test_bundle_exception() {
        let rules = prepared(builtin::nintendo_switch());
        assert_eq!(
            accessory(&rules, "Игровая приставка Switch 2 + игра Mario Kart World", "nintendo switch 2"),
            None
        );
        // the game itself, not a bundle
        assert_eq!(
            accessory(&rules, "Игра Mario Kart World для Nintendo Switch 2", "nintendo switch 2").as_deref(),
            Some("ИГРА")
        );
        // wrong model: no exception
        assert!(accessory(&rules, "Приставка Switch 1 + игра Zelda", "nintendo switch 2").is_some());
    }

    #[test]
    fn test_bundle_exception_requires_flag() {
        let mut rules = builtin::nintendo_switch();
        rules.conflict.allow_bundles = false;
        let rules = prepared(rules);
        assert!(accessory(&rules, "Приставка Switch 2 + игра Mario Kart", "switch 2").is_some());
    }

    fn check_title(rules: &CategoryRuleSet, title: &str, query: &str, filters: FilterSettings) -> Option<Verdict> {
        let title = normalize(title);
        let query = normalize(query);
        let ctx = ListingContext::new(rules, &title, &query);
        check(&ctx, &filters)
    }

    #[test]
    fn test_check_is_terminal() {
        let rules = prepared(builtin::steam_deck());
        let verdict = check_title(
            &rules,
            "Чехол для Steam Deck OLED",
            "steam deck oled",
            FilterSettings::default(),
        )
        .unwrap();
        assert_eq!(verdict.reason_code, ReasonCode::Accessory);
        assert_eq!(verdict.confidence, 1.0);
        assert!(!verdict.is_valid);
        assert!(verdict.is_terminal());
    }

    #[test]
    fn test_soft_keyword_escalates() {
        let rules = prepared(builtin::playstation());
        let verdict = check_title(
            &rules,
            "Коробка от Sony PlayStation 5 Pro",
            "ps5 pro",
            FilterSettings::default(),
        )
        .unwrap();
        assert_eq!(verdict.reason_code, ReasonCode::SoftAccessory);
        assert_eq!(verdict.stage, Stage::Accessory);
        assert!(verdict.needs_escalation);
    }

    #[test]
    fn test_hard_keyword_beats_soft() {
        let rules = prepared(builtin::playstation());
        let verdict = check_title(&rules, "Чехол и коробка для PS5 Pro", "ps5 pro", FilterSettings::default());
        assert_eq!(verdict.unwrap().reason_code, ReasonCode::Accessory);
    }

    #[test]
    fn test_filter_switches() {
        let rules = prepared(builtin::playstation());
        let no_hard = FilterSettings {
            enable_hard_filter: false,
            ..FilterSettings::default()
        };
        assert_eq!(check_title(&rules, "Чехол для PS5 Pro", "ps5 pro", no_hard), None);
        // with the hard tier off, a soft word still escalates
        let v = check_title(&rules, "Чехол и коробка для PS5 Pro", "ps5 pro", no_hard).unwrap();
        assert_eq!(v.reason_code, ReasonCode::SoftAccessory);

        let no_soft = FilterSettings {
            enable_soft_filter: false,
            ..FilterSettings::default()
        };
        assert_eq!(check_title(&rules, "Коробка от PS5 Pro", "ps5 pro", no_soft), None);
        assert!(check_title(&rules, "Чехол для PS5 Pro", "ps5 pro", no_soft).is_some());
    }
}
