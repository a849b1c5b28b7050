//! Supported-language registry
//!
//! A static bidirectional lookup between language names/codes and the
//! canonical ISO codes the endpoint understands. The table is immutable
//! and lazily indexed into a lookup map on first use; every other part of
//! the pipeline validates `from`/`to` through [`get_code`].
//!
//! Legacy aliases (the old Hebrew code `iw`, the regional Portuguese and
//! Punjabi variants) resolve to the same canonical code as their modern
//! counterparts.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Pseudo-code requesting source-language detection; always valid as `from`.
pub const AUTO: &str = "auto";

/// Canonical `(code, English name)` pairs as published by the endpoint.
const LANGUAGES: &[(&str, &str)] = &[
    ("af", "Afrikaans"),
    ("sq", "Albanian"),
    ("am", "Amharic"),
    ("ar", "Arabic"),
    ("hy", "Armenian"),
    ("az", "Azerbaijani"),
    ("eu", "Basque"),
    ("be", "Belarusian"),
    ("bn", "Bengali"),
    ("bs", "Bosnian"),
    ("bg", "Bulgarian"),
    ("ca", "Catalan"),
    ("ceb", "Cebuano"),
    ("zh-CN", "Chinese (Simplified)"),
    ("zh-TW", "Chinese (Traditional)"),
    ("co", "Corsican"),
    ("hr", "Croatian"),
    ("cs", "Czech"),
    ("da", "Danish"),
    ("nl", "Dutch"),
    ("en", "English"),
    ("eo", "Esperanto"),
    ("et", "Estonian"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("fy", "Frisian"),
    ("gl", "Galician"),
    ("ka", "Georgian"),
    ("de", "German"),
    ("el", "Greek"),
    ("gu", "Gujarati"),
    ("ht", "Haitian Creole"),
    ("ha", "Hausa"),
    ("haw", "Hawaiian"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("hmn", "Hmong"),
    ("hu", "Hungarian"),
    ("is", "Icelandic"),
    ("ig", "Igbo"),
    ("id", "Indonesian"),
    ("ga", "Irish"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("jv", "Javanese"),
    ("kn", "Kannada"),
    ("kk", "Kazakh"),
    ("km", "Khmer"),
    ("rw", "Kinyarwanda"),
    ("ko", "Korean"),
    ("ku", "Kurdish"),
    ("ky", "Kyrgyz"),
    ("lo", "Lao"),
    ("la", "Latin"),
    ("lv", "Latvian"),
    ("lt", "Lithuanian"),
    ("lb", "Luxembourgish"),
    ("mk", "Macedonian"),
    ("mg", "Malagasy"),
    ("ms", "Malay"),
    ("ml", "Malayalam"),
    ("mt", "Maltese"),
    ("mi", "Maori"),
    ("mr", "Marathi"),
    ("mn", "Mongolian"),
    ("my", "Myanmar (Burmese)"),
    ("ne", "Nepali"),
    ("no", "Norwegian"),
    ("ny", "Nyanja (Chichewa)"),
    ("or", "Odia (Oriya)"),
    ("ps", "Pashto"),
    ("fa", "Persian"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("pa", "Punjabi"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("sm", "Samoan"),
    ("gd", "Scots Gaelic"),
    ("sr", "Serbian"),
    ("st", "Sesotho"),
    ("sn", "Shona"),
    ("sd", "Sindhi"),
    ("si", "Sinhala"),
    ("sk", "Slovak"),
    ("sl", "Slovenian"),
    ("so", "Somali"),
    ("es", "Spanish"),
    ("su", "Sundanese"),
    ("sw", "Swahili"),
    ("sv", "Swedish"),
    ("tl", "Tagalog (Filipino)"),
    ("tg", "Tajik"),
    ("ta", "Tamil"),
    ("tt", "Tatar"),
    ("te", "Telugu"),
    ("th", "Thai"),
    ("tr", "Turkish"),
    ("tk", "Turkmen"),
    ("uk", "Ukrainian"),
    ("ur", "Urdu"),
    ("ug", "Uyghur"),
    ("uz", "Uzbek"),
    ("vi", "Vietnamese"),
    ("cy", "Welsh"),
    ("xh", "Xhosa"),
    ("yi", "Yiddish"),
    ("yo", "Yoruba"),
    ("zu", "Zulu"),
];

/// Legacy and regional aliases that must resolve to their modern code.
const ALIASES: &[(&str, &str)] = &[
    ("iw", "he"),
    ("pt-PT", "pt"),
    ("pt-BR", "pt"),
    ("pa-IN", "pa"),
];

fn lookup() -> &'static HashMap<String, &'static str> {
    static INDEX: OnceLock<HashMap<String, &'static str>> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut map = HashMap::new();
        for &(code, name) in LANGUAGES {
            map.insert(code.to_lowercase(), code);
            map.insert(name.to_lowercase(), code);
        }
        for &(alias, code) in ALIASES {
            map.insert(alias.to_lowercase(), code);
        }
        map
    })
}

/// Resolve a language name or code to its canonical ISO code.
///
/// Lookup is case-insensitive and accepts codes (`"en"`), English names
/// (`"English"`) and legacy aliases (`"iw"` → `"he"`). Returns `None` for
/// anything unknown, including `"auto"` — detection is a request mode, not
/// a language.
///
/// # Example
///
/// ```
/// use gtx_batch::languages::get_code;
///
/// assert_eq!(get_code("nl"), Some("nl"));
/// assert_eq!(get_code("Dutch"), Some("nl"));
/// assert_eq!(get_code("iw"), Some("he"));
/// assert_eq!(get_code("klingon"), None);
/// ```
pub fn get_code(name_or_code: &str) -> Option<&'static str> {
    if name_or_code.is_empty() {
        return None;
    }
    lookup().get(&name_or_code.to_lowercase()).copied()
}

/// True if the given name or code resolves to a supported language.
pub fn is_supported(name_or_code: &str) -> bool {
    get_code(name_or_code).is_some()
}

/// Resolve a `from`-position value, where `"auto"` is always valid.
pub(crate) fn resolve_from(value: &str) -> Option<&str> {
    if value == AUTO {
        return Some(AUTO);
    }
    get_code(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_code() {
        assert_eq!(get_code("en"), Some("en"));
        assert_eq!(get_code("zh-CN"), Some("zh-CN"));
        assert_eq!(get_code("ceb"), Some("ceb"));
    }

    #[test]
    fn test_resolve_by_name() {
        assert_eq!(get_code("English"), Some("en"));
        assert_eq!(get_code("dutch"), Some("nl"));
        assert_eq!(get_code("CHINESE (SIMPLIFIED)"), Some("zh-CN"));
    }

    #[test]
    fn test_resolve_case_insensitive_code() {
        assert_eq!(get_code("EN"), Some("en"));
        assert_eq!(get_code("Zh-cn"), Some("zh-CN"));
    }

    #[test]
    fn test_legacy_aliases() {
        assert_eq!(get_code("iw"), Some("he"));
        assert_eq!(get_code("he"), Some("he"));
        assert_eq!(get_code("pt-PT"), Some("pt"));
        assert_eq!(get_code("pt-BR"), Some("pt"));
        assert_eq!(get_code("pa-IN"), Some("pa"));
    }

    #[test]
    fn test_unknown_codes_rejected() {
        assert_eq!(get_code("ii"), None);
        assert_eq!(get_code("abc"), None);
        assert_eq!(get_code("testing"), None);
        assert_eq!(get_code(""), None);
    }

    #[test]
    fn test_auto_is_not_a_language() {
        // "auto" is a detection request, only valid in from position
        assert_eq!(get_code("auto"), None);
        assert_eq!(resolve_from("auto"), Some("auto"));
        assert_eq!(resolve_from("nl"), Some("nl"));
        assert_eq!(resolve_from("ii"), None);
    }

    #[test]
    fn test_is_supported() {
        assert!(is_supported("ja"));
        assert!(is_supported("Japanese"));
        assert!(!is_supported("tlh"));
    }

    #[test]
    fn test_table_size() {
        // The endpoint publishes a hundred-plus languages; guard against
        // accidental truncation of the table.
        assert!(LANGUAGES.len() >= 100);
    }
}
