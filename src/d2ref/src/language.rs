//! Localization languages
//!
//! Labels live in [`LANGUAGES`] rather than on the enum so the file stems
//! used by the archive and the locale codes used by the sink stay in one table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A language the game ships localization files for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Russian,
    SChinese,
    TChinese,
    #[serde(rename = "koreana")]
    Korean,
    Japanese,
    German,
    French,
    Spanish,
    Latam,
    Portuguese,
    Brazilian,
    Polish,
    Czech,
    Danish,
    Dutch,
    Finnish,
    Greek,
    Hungarian,
    Italian,
    Norwegian,
    Romanian,
    Swedish,
    Thai,
    Turkish,
    Ukrainian,
    Vietnamese,
    Bulgarian,
}

/// Language used when a key is missing in the requested language
pub const DEFAULT_LANGUAGE: Language = Language::English;

/// Label table entry
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageInfo {
    pub language: Language,
    /// File stem in localization paths
    pub stem: &'static str,
    /// Locale code stored with persisted records
    pub locale: &'static str,
    /// English display name
    pub name: &'static str,
}

macro_rules! language_table {
    ($($variant:ident => $stem:literal, $locale:literal, $name:literal;)*) => {
        /// All languages with their labels, in declaration order
        pub const LANGUAGES: &[LanguageInfo] = &[
            $(LanguageInfo {
                language: Language::$variant,
                stem: $stem,
                locale: $locale,
                name: $name,
            },)*
        ];
    };
}

language_table! {
    English => "english", "en", "English";
    Russian => "russian", "ru", "Russian";
    SChinese => "schinese", "zh-CN", "Simplified Chinese";
    TChinese => "tchinese", "zh-TW", "Traditional Chinese";
    Korean => "koreana", "ko", "Korean";
    Japanese => "japanese", "ja", "Japanese";
    German => "german", "de", "German";
    French => "french", "fr", "French";
    Spanish => "spanish", "es-ES", "Spanish";
    Latam => "latam", "es-419", "Latin American Spanish";
    Portuguese => "portuguese", "pt-PT", "Portuguese";
    Brazilian => "brazilian", "pt-BR", "Brazilian Portuguese";
    Polish => "polish", "pl", "Polish";
    Czech => "czech", "cs", "Czech";
    Danish => "danish", "da", "Danish";
    Dutch => "dutch", "nl", "Dutch";
    Finnish => "finnish", "fi", "Finnish";
    Greek => "greek", "el", "Greek";
    Hungarian => "hungarian", "hu", "Hungarian";
    Italian => "italian", "it", "Italian";
    Norwegian => "norwegian", "no", "Norwegian";
    Romanian => "romanian", "ro", "Romanian";
    Swedish => "swedish", "sv", "Swedish";
    Thai => "thai", "th", "Thai";
    Turkish => "turkish", "tr", "Turkish";
    Ukrainian => "ukrainian", "uk", "Ukrainian";
    Vietnamese => "vietnamese", "vi", "Vietnamese";
    Bulgarian => "bulgarian", "bg", "Bulgarian";
}

impl Language {
    fn info(self) -> &'static LanguageInfo {
        // Every variant has a row; English is the first row
        LANGUAGES
            .iter()
            .find(|l| l.language == self)
            .unwrap_or(&LANGUAGES[0])
    }

    /// File stem, e.g. `schinese`
    pub fn stem(self) -> &'static str {
        self.info().stem
    }

    /// Locale code, e.g. `zh-CN`
    pub fn locale(self) -> &'static str {
        self.info().locale
    }

    pub fn display_name(self) -> &'static str {
        self.info().name
    }

    pub fn from_stem(stem: &str) -> Option<Language> {
        LANGUAGES
            .iter()
            .find(|l| l.stem.eq_ignore_ascii_case(stem))
            .map(|l| l.language)
    }

    pub fn from_locale(locale: &str) -> Option<Language> {
        LANGUAGES
            .iter()
            .find(|l| l.locale.eq_ignore_ascii_case(locale))
            .map(|l| l.language)
    }

    /// Every supported language
    pub fn all() -> impl Iterator<Item = Language> {
        LANGUAGES.iter().map(|l| l.language)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stem())
    }
}

/// Unknown language name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    /// Accepts a file stem (`russian`) or a locale code (`ru`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_stem(s)
            .or_else(|| Language::from_locale(s))
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_has_a_row() {
        assert_eq!(LANGUAGES.len(), 28);
        for info in LANGUAGES {
            assert_eq!(info.language.stem(), info.stem);
            assert_eq!(Language::from_stem(info.stem), Some(info.language));
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(Language::SChinese.stem(), "schinese");
        assert_eq!(Language::SChinese.locale(), "zh-CN");
        assert_eq!(Language::Korean.stem(), "koreana");
        assert_eq!(DEFAULT_LANGUAGE.locale(), "en");
        assert_eq!(Language::Latam.to_string(), "latam");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("russian".parse::<Language>(), Ok(Language::Russian));
        assert_eq!("pt-BR".parse::<Language>(), Ok(Language::Brazilian));
        assert_eq!("English".parse::<Language>(), Ok(Language::English));
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Language::SChinese).unwrap();
        assert_eq!(json, "\"schinese\"");
        let back: Language = serde_json::from_str("\"latam\"").unwrap();
        assert_eq!(back, Language::Latam);
    }
}
