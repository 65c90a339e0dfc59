//! Built-in category rule sets.

use crate::types::{AbbreviationPolicy, CategoryRuleSet, GrammarPattern, PriceAnomalyParams};

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn price(min_pct: f64, max_suspicious: f64, z: f64) -> PriceAnomalyParams {
    PriceAnomalyParams {
        enabled: true,
        min_percentage_difference: min_pct,
        max_suspicious_price: max_suspicious,
        z_score_threshold: z,
        ..PriceAnomalyParams::default()
    }
}

/// Words shared by every console category.
const CONSOLE_ACCESSORIES: &[&str] = &[
    "контроллер", "джойстик*", "кабель", "шнур", "адаптер", "переходник", "зарядк*",
    "зарядн*", "подставка", "чехол", "кейс", "карта памяти", "наушники", "гарнитура",
    "микрофон", "накладки", "скин", "сумка", "защитн*", "силиконов*", "кожан*",
    "пластиков*", "панель", "обложка", "аксессуар*",
];

/// Words that usually mean a box, a shell or a part, escalated rather than rejected.
const SOFT_ACCESSORIES: &[&str] = &["коробк*", "упаковка", "пустая", "муляж"];

const STYLIZATION: &[&str] = &["в корпусе", "корпус", "в стиле", "стилизован*", "реплика"];

const BUNDLE_TOKENS: &[&str] = &["игра", "игры", "game", "bundle", "набор", "комплект", "включая"];

pub fn videocards() -> CategoryRuleSet {
    let mut rules = CategoryRuleSet::new("videocards", "Видеокарты");
    rules.required_keywords = words(&["видеокарт*", "geforce", "radeon", "rtx", "gtx", "rx"]);
    rules.brands = words(&[
        "nvidia", "amd", "asus", "msi", "gigabyte", "palit", "zotac", "sapphire", "powercolor",
        "inno3d", "gainward", "colorful", "pny", "asrock",
    ]);
    rules.series = words(&["rog", "tuf", "strix", "gaming", "ventus", "eagle", "aorus", "jetstream"]);
    rules.features = words(&[
        "gddr6", "gddr6x", "gddr7", "8gb", "12gb", "16gb", "24gb", "32gb", "8 гб", "12 гб",
        "16 гб", "pcie", "dlss", "hdmi", "displayport",
    ]);
    rules.min_name_length = 10;
    rules.grammar = vec![
        GrammarPattern::new(&["rtx", "gtx", "rx"], (3, 4), &["ti super", "ti", "super", "xtx", "xt", "gre"]),
        GrammarPattern::new(&[], (4, 4), &["ti super", "ti", "super", "xtx", "xt", "gre"]),
    ];
    rules.accessory_keywords = words(&[
        "кабель", "шлейф", "термопаста", "винт", "шуруп", "крепление", "подставка", "кулер",
        "радиатор", "вентилятор", "блок питания", "ssd", "hdd", "держатель", "backplate",
        "наклейка", "переходник", "райзер",
    ]);
    let mut others = Vec::new();
    for gen in ["40", "50"] {
        for tier in ["60", "70", "80", "90"] {
            others.push(format!("rtx {}{}", gen, tier));
            others.push(format!("rtx {}{} ti", gen, tier));
        }
        others.push(format!("rtx {}70 super", gen));
        others.push(format!("rtx {}80 super", gen));
    }
    for model in ["3060", "3060 ti", "3070", "3070 ti", "3080", "3090"] {
        others.push(format!("rtx {}", model));
    }
    for model in ["7600", "7700 xt", "7800 xt", "7900 xt", "7900 xtx", "9070", "9070 xt"] {
        others.push(format!("rx {}", model));
    }
    rules.soft_accessory_keywords = words(SOFT_ACCESSORIES);
    rules.soft_accessory_keywords.extend(words(&["водоблок", "охлаждение", "бокс"]));
    rules.exclusion_models = others;
    rules.price_anomaly = price(0.4, 5000.0, 2.5);
    rules
}

pub fn processors() -> CategoryRuleSet {
    let mut rules = CategoryRuleSet::new("processors", "Процессоры");
    rules.required_keywords = words(&["процессор*", "cpu", "ryzen", "core", "intel", "amd"]);
    rules.brands = words(&["intel", "amd"]);
    rules.series = words(&["ryzen", "core", "ultra", "threadripper", "xeon"]);
    rules.features = words(&[
        "am4", "am5", "lga1700", "lga1851", "box", "oem", "ядер", "потоков", "ghz", "ггц",
    ]);
    rules.min_name_length = 8;
    rules.grammar = vec![
        GrammarPattern::new(&["ryzen 9", "ryzen 7", "ryzen 5", "ryzen 3"], (4, 4), &["x3d", "xt", "x", "g", "ge"]),
        GrammarPattern::new(&["i9", "i7", "i5", "i3"], (4, 5), &["kf", "ks", "k", "f", "hx", "h", "t"]),
        GrammarPattern::new(&["ultra 9", "ultra 7", "ultra 5"], (3, 3), &["kf", "k", "f"]),
        GrammarPattern::new(&[], (4, 5), &["x3d", "kf", "ks", "k", "f", "xt", "x", "g"]),
    ];
    rules.accessory_keywords = words(&[
        "кулер", "радиатор", "вентилятор", "термопаста", "подставка", "крепление",
        "материнская плата", "ssd", "hdd", "видеокарта",
    ]);
    rules.soft_accessory_keywords = words(SOFT_ACCESSORIES);
    rules.soft_accessory_keywords.extend(words(&["крышка", "скальпирован*"]));
    rules.exclusion_models = words(&[
        "7500f", "7600", "7600x", "7700", "7700x", "7800x3d", "7900x", "7950x", "7950x3d",
        "9600x", "9700x", "9800x3d", "9900x", "9950x", "9950x3d", "12400f", "12600k",
        "13400f", "13600k", "13700k", "14400f", "14600k", "14700k", "14900k",
    ]);
    rules.price_anomaly = price(0.35, 3000.0, 2.0);
    rules
}

pub fn motherboards() -> CategoryRuleSet {
    let mut rules = CategoryRuleSet::new("motherboards", "Материнские платы");
    rules.required_keywords = words(&["материнская плата", "материнск*", "motherboard", "mainboard"]);
    rules.brands = words(&["asus", "msi", "gigabyte", "asrock", "biostar", "colorful", "maxsun"]);
    rules.series = words(&["rog", "tuf", "prime", "strix", "aorus", "tomahawk", "mortar", "steel legend"]);
    rules.features = words(&[
        "ddr4", "ddr5", "atx", "matx", "micro atx", "mini itx", "wifi", "am4", "am5", "lga1700",
        "lga1851", "pcie",
    ]);
    rules.min_name_length = 8;
    rules.grammar = vec![
        GrammarPattern::new(&["z", "b", "h", "x", "a", "w"], (3, 3), &["e"]).keep_prefix(),
    ];
    rules.accessory_keywords = words(&[
        "кабель", "шлейф", "термопаста", "винт", "шуруп", "крепление", "подставка", "кулер",
        "радиатор", "вентилятор", "блок питания", "ssd", "hdd", "заглушка",
    ]);
    rules.soft_accessory_keywords = words(SOFT_ACCESSORIES);
    rules.soft_accessory_keywords.extend(words(&["антенна", "модуль"]));
    rules.exclusion_models = words(&[
        "z890", "z790", "b860", "b850", "b760", "h810", "h610", "w880", "x870e", "x870", "x670e",
        "b650e", "b650", "a620", "a820", "b550", "a520",
    ]);
    rules.price_anomaly = price(0.3, 2000.0, 2.0);
    rules
}

pub fn playstation() -> CategoryRuleSet {
    let mut rules = CategoryRuleSet::new("playstation", "PlayStation");
    rules.strict_mode = true;
    rules.required_keywords = words(&["playstation", "ps", "приставк*", "консол*"]);
    rules.brands = words(&["sony"]);
    rules.series = words(&["slim", "pro", "digital"]);
    rules.features = words(&["1tb", "2tb", "825gb", "1 тб", "2 тб", "дисковод", "blu ray", "4k"]);
    rules.min_name_length = 5;
    rules.grammar = vec![GrammarPattern::new(&["playstation", "ps"], (1, 1), &["pro", "slim", "digital"])];
    let mut accessories = words(CONSOLE_ACCESSORIES);
    accessories.extend(words(&[
        "dualsense", "dualshock", "станция", "станция зарядки", "vr", "portal", "обертка",
        "защита", "игра",
    ]));
    rules.accessory_keywords = accessories;
    rules.soft_accessory_keywords = words(SOFT_ACCESSORIES);
    rules.soft_accessory_keywords.extend(words(&["диск", "геймпад", "пульт"]));
    rules.exclusion_models = words(&[
        "ps5 slim", "ps5 pro", "ps5 digital", "ps5", "ps4 slim", "ps4 pro", "ps4", "ps3", "ps2",
    ]);
    rules.stylization_indicators = words(STYLIZATION);
    rules.bundle_tokens = words(BUNDLE_TOKENS);
    rules.conflict.allow_bundles = true;
    rules.price_anomaly = price(0.25, 10000.0, 1.8);
    rules
}

pub fn nintendo_switch() -> CategoryRuleSet {
    let mut rules = CategoryRuleSet::new("nintendo_switch", "Nintendo Switch");
    rules.strict_mode = true;
    rules.required_keywords = words(&["nintendo", "switch", "приставк*", "консол*"]);
    rules.brands = words(&["nintendo"]);
    rules.series = words(&["oled", "lite"]);
    rules.features = words(&["32gb", "64gb", "256gb", "32 гб", "64 гб", "256 гб", "neon", "joy con"]);
    rules.min_name_length = 5;
    rules.grammar = vec![GrammarPattern::new(&["nintendo switch", "switch"], (1, 1), &[])];
    let mut accessories = words(CONSOLE_ACCESSORIES);
    accessories.extend(words(&[
        "картридж", "стики", "лапки", "кнопк*", "joy con", "joycon", "кулер", "игра",
    ]));
    rules.accessory_keywords = accessories;
    rules.soft_accessory_keywords = words(SOFT_ACCESSORIES);
    rules.soft_accessory_keywords.extend(words(&["диск", "геймпад", "пульт"]));
    rules.exclusion_models = words(&["switch oled", "switch lite", "switch 2"]);
    rules.stylization_indicators = words(STYLIZATION);
    rules.bundle_tokens = words(BUNDLE_TOKENS);
    rules.conflict.allow_bundles = true;
    rules.price_anomaly = price(0.25, 8000.0, 1.8);
    rules
}

pub fn steam_deck() -> CategoryRuleSet {
    let mut rules = CategoryRuleSet::new("steam_deck", "Steam Deck");
    rules.required_keywords = words(&["steam deck", "steamdeck", "valve"]);
    rules.brands = words(&["valve"]);
    rules.series = words(&["oled", "lcd"]);
    rules.features = words(&["64gb", "256gb", "512gb", "1tb", "256 гб", "512 гб", "1 тб"]);
    rules.min_name_length = 8;
    let mut accessories = words(CONSOLE_ACCESSORIES);
    accessories.extend(words(&[
        "игра", "держатель", "экран", "док станция", "докстанция", "станция", "стекло",
        "пленка", "наклейка", "стикер", "крышка", "ремень", "термопаста", "стики",
    ]));
    rules.accessory_keywords = accessories;
    rules.soft_accessory_keywords = words(SOFT_ACCESSORIES);
    rules.soft_accessory_keywords.extend(words(&["диск", "геймпад", "пульт"]));
    rules.exclusion_models = words(&["steam deck oled", "steam deck lcd"]);
    rules.stylization_indicators = words(STYLIZATION);
    rules.bundle_tokens = words(BUNDLE_TOKENS);
    rules.conflict.allow_bundles = true;
    rules.price_anomaly = price(0.25, 8000.0, 1.8);
    rules
}

pub fn iphone() -> CategoryRuleSet {
    let mut rules = CategoryRuleSet::new("iphone", "iPhone");
    rules.required_keywords = words(&["iphone", "смартфон*", "телефон*"]);
    rules.brands = words(&["apple"]);
    rules.series = words(&["pro", "max", "plus", "mini"]);
    rules.features = words(&["128gb", "256gb", "512gb", "1tb", "128 гб", "256 гб", "512 гб", "esim", "sim"]);
    rules.min_name_length = 8;
    rules.abbreviation = AbbreviationPolicy::Strict;
    rules.grammar = vec![
        GrammarPattern::new(&["iphone"], (1, 2), &["pro max", "pro", "plus", "mini"]).alias("max", "pro max"),
    ];
    rules.accessory_keywords = words(&[
        "чехол", "защита", "стекло", "кабель", "шнур", "зарядка", "подставка", "наушники",
        "гарнитура", "микрофон", "объектив", "штатив", "кейс", "бампер", "накладка", "пленка",
        "держатель",
    ]);
    rules.soft_accessory_keywords = words(SOFT_ACCESSORIES);
    rules.soft_accessory_keywords.extend(words(&["дисплей", "аккумулятор", "задняя крышка"]));
    let mut others = Vec::new();
    for gen in ["11", "12", "13", "14", "15", "16"] {
        for variant in ["", " pro", " pro max"] {
            others.push(format!("iphone {}{}", gen, variant));
        }
    }
    others.extend(words(&[
        "iphone 14 plus", "iphone 15 plus", "iphone 16 plus", "iphone 12 mini", "iphone 13 mini",
        "iphone xr", "iphone xs max", "iphone xs", "iphone x", "iphone 8", "iphone 8 plus",
        "iphone 7", "iphone se",
    ]));
    rules.exclusion_models = others;
    rules.stylization_indicators = words(STYLIZATION);
    rules.price_anomaly = price(0.3, 15000.0, 2.0);
    rules
}

/// Every built-in category, unprepared.
pub fn all() -> Vec<CategoryRuleSet> {
    vec![
        videocards(),
        processors(),
        motherboards(),
        playstation(),
        nintendo_switch(),
        steam_deck(),
        iphone(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtins_prepare() {
        for rules in all() {
            let key = rules.key.clone();
            let prepared = rules.prepare();
            assert!(prepared.is_ok(), "{} failed: {:?}", key, prepared.err());
        }
    }

    #[test]
    fn test_accessories_exclude_stylization_words() {
        for rules in all() {
            let rules = rules.prepare().unwrap();
            for indicator in &rules.stylization_indicators {
                assert!(
                    !rules.accessory_keywords.contains(indicator),
                    "{} lists {} as accessory",
                    rules.key,
                    indicator
                );
            }
        }
    }

    #[test]
    fn test_soft_lists_stay_soft() {
        for rules in all() {
            let rules = rules.prepare().unwrap();
            assert!(!rules.soft_accessory_keywords.is_empty(), "{}", rules.key);
            for soft in &rules.soft_accessory_keywords {
                assert!(!rules.accessory_keywords.contains(soft), "{} {}", rules.key, soft);
                assert!(!rules.stylization_indicators.contains(soft), "{} {}", rules.key, soft);
            }
        }
    }

    #[test]
    fn test_console_flags() {
        let ps = playstation();
        assert!(ps.strict_mode);
        assert!(ps.conflict.allow_bundles);
        assert!(!videocards().strict_mode);
        assert_eq!(nintendo_switch().price_anomaly.max_suspicious_price, 8000.0);
    }

    #[test]
    fn test_chipset_is_part_of_board_model() {
        assert!(motherboards().grammar.iter().all(|p| p.prefix_in_base));
        assert!(videocards().grammar.iter().all(|p| !p.prefix_in_base));
    }
}
