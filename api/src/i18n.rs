//! Response messages in the caller's language

use axum::http::{header::ACCEPT_LANGUAGE, HeaderMap};

pub const SUPPORTED: [&str; 2] = ["ar", "en"];

pub fn translate(locale: &str, key: &str, args: Option<&[(&str, &str)]>) -> String {
    let template = rust_i18n::t!(key, locale = locale).to_string();
    match args {
        Some(args) => args.iter().fold(template, |acc, (k, v)| {
            acc.replace(&format!("%{{{}}}", k), v)
        }),
        None => template,
    }
}

/// First supported language in `Accept-Language`, in the header's order
/// (quality weights are not ranked).
pub fn locale_from_headers<'a>(headers: &HeaderMap, default: &'a str) -> &'a str {
    headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| {
            raw.split(',')
                .filter_map(|part| part.split(';').next())
                .map(|tag| tag.trim().split(['-', '_']).next().unwrap_or("").to_ascii_lowercase())
                .find_map(|lang| SUPPORTED.iter().copied().find(|s| *s == lang))
        })
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_accept_language() {
        let mut headers = HeaderMap::new();
        assert_eq!(locale_from_headers(&headers, "ar"), "ar");

        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("fr-FR,en-US;q=0.8,ar;q=0.5"));
        assert_eq!(locale_from_headers(&headers, "ar"), "en");

        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("de"));
        assert_eq!(locale_from_headers(&headers, "ar"), "ar");
    }

    #[test]
    fn test_messages_exist_in_both_languages() {
        for locale in SUPPORTED {
            let text = translate(locale, "alert_created", None);
            assert_ne!(text, "alert_created");
        }
    }
}
