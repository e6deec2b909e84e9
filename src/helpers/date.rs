//! Date helper functions

use chrono::{DateTime, Locale, TimeZone};

/// Display format of post dates: day, abbreviated month, year
pub const POST_DATE_FORMAT: &str = "%d %b %Y";

/// Locale used for month names of a site language
pub fn locale_for(language: &str) -> Locale {
    match language.to_ascii_lowercase().replace('_', "-").as_str() {
        "pt" | "pt-br" => Locale::pt_BR,
        "pt-pt" => Locale::pt_PT,
        "es" | "es-es" => Locale::es_ES,
        "fr" | "fr-fr" => Locale::fr_FR,
        "de" | "de-de" => Locale::de_DE,
        "en-gb" => Locale::en_GB,
        _ => Locale::en_US,
    }
}

/// Format a post date in the site timezone and locale
///
/// # Examples
/// ```ignore
/// format_post_date(&date, chrono_tz::UTC, Locale::pt_BR) // -> "15 mar 2021"
/// ```
pub fn format_post_date<Tz1: TimeZone, Tz2: TimeZone>(
    date: &DateTime<Tz1>,
    tz: Tz2,
    locale: Locale,
) -> String
where
    Tz2::Offset: std::fmt::Display,
{
    date.with_timezone(&tz)
        .format_localized(POST_DATE_FORMAT, locale)
        .to_string()
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::parse_timestamp;

    #[test]
    fn test_format_post_date_en() {
        let date = parse_timestamp("2021-03-15T19:25:28+0000").unwrap();
        assert_eq!(
            format_post_date(&date, chrono_tz::UTC, Locale::en_US),
            "15 Mar 2021"
        );
    }

    #[test]
    fn test_format_post_date_pt() {
        let date = parse_timestamp("2021-04-19T10:00:00+0000").unwrap();
        assert_eq!(
            format_post_date(&date, chrono_tz::UTC, locale_for("pt")),
            "19 abr 2021"
        );
    }

    #[test]
    fn test_format_is_deterministic_and_uses_timezone() {
        let date = parse_timestamp("2021-03-15T01:00:00+0000").unwrap();
        let first = format_post_date(&date, chrono_tz::America::Sao_Paulo, Locale::en_US);
        let second = format_post_date(&date, chrono_tz::America::Sao_Paulo, Locale::en_US);
        assert_eq!(first, second);
        // 01:00 UTC is still the previous evening in Sao Paulo.
        assert_eq!(first, "14 Mar 2021");
    }

    #[test]
    fn test_date_xml() {
        let date = parse_timestamp("2021-03-15T19:25:28+0000").unwrap();
        assert_eq!(date_xml(&date), "2021-03-15T19:25:28+00:00");
    }

    #[test]
    fn test_locale_for() {
        assert_eq!(locale_for("pt-BR"), Locale::pt_BR);
        assert_eq!(locale_for("pt_PT"), Locale::pt_PT);
        assert_eq!(locale_for("xx"), Locale::en_US);
    }
}
