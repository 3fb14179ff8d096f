//! The languages the relay can translate into.
//!
//! Languages travel on the wire by English name (`"Spanish"`), not by ISO
//! code, so the name is the primary key here.

/// One supported language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub name: &'static str,
    /// ISO 639-1 code.
    pub code: &'static str,
    pub native_name: &'static str,
}

/// Every language the relay accepts, in display order.
pub const SUPPORTED_LANGUAGES: &[Language] = &[
    Language { name: "Spanish", code: "es", native_name: "Español" },
    Language { name: "French", code: "fr", native_name: "Français" },
    Language { name: "German", code: "de", native_name: "Deutsch" },
    Language { name: "Hindi", code: "hi", native_name: "हिन्दी" },
    Language { name: "Chinese", code: "zh", native_name: "中文" },
    Language { name: "Japanese", code: "ja", native_name: "日本語" },
    Language { name: "Korean", code: "ko", native_name: "한국어" },
    Language { name: "Arabic", code: "ar", native_name: "العربية" },
    Language { name: "Portuguese", code: "pt", native_name: "Português" },
    Language { name: "Russian", code: "ru", native_name: "Русский" },
    Language { name: "Italian", code: "it", native_name: "Italiano" },
    Language { name: "Turkish", code: "tr", native_name: "Türkçe" },
];

/// Language transcripts are assumed to be spoken in.
pub const SPEECH_SOURCE_LANGUAGE: &str = "en";

/// Looks up a language by English name, ignoring ASCII case.
pub fn by_name(name: &str) -> Option<&'static Language> {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|lang| lang.name.eq_ignore_ascii_case(name))
}

/// Looks up a language by ISO code, ignoring ASCII case.
pub fn by_code(code: &str) -> Option<&'static Language> {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|lang| lang.code.eq_ignore_ascii_case(code))
}

pub fn is_supported(name: &str) -> bool {
    by_name(name).is_some()
}
