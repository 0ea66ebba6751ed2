//! i18n helpers over the `locales/` catalogues loaded by `rust_i18n::i18n!`
//! in the crate root

pub const SUPPORTED: [&str; 2] = ["ar", "en"];

/// Get translation for a key with optional `%{name}` arguments.
/// Unknown keys come back as the key itself.
pub fn translate(locale: &str, key: &str, args: Option<&[(&str, &str)]>) -> String {
    let template = rust_i18n::t!(key, locale = locale).to_string();
    match args {
        Some(args) => args.iter().fold(template, |acc, (k, v)| {
            acc.replace(&format!("%{{{}}}", k), v)
        }),
        None => template,
    }
}

/// Narrow a language code (`"ar-EG"`, `"en"`) to a supported locale or the default
pub fn get_user_language<'a>(language: Option<&str>, default: &'a str) -> &'a str {
    language
        .map(|lang| lang.split(['-', '_']).next().unwrap_or(lang).to_ascii_lowercase())
        .and_then(|lang| SUPPORTED.iter().copied().find(|s| *s == lang))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_fills_arguments() {
        let text = translate("en", "push_signal_title", Some(&[("asset", "EUR/USD")]));
        assert!(text.contains("EUR/USD"));
        assert!(!text.contains("%{asset}"));
    }

    #[test]
    fn test_language_narrowing() {
        assert_eq!(get_user_language(Some("en-US"), "ar"), "en");
        assert_eq!(get_user_language(Some("AR"), "en"), "ar");
        assert_eq!(get_user_language(Some("fr"), "ar"), "ar");
        assert_eq!(get_user_language(None, "en"), "en");
    }
}
