//! Supported languages, translation directions and script sniffing.

use regex::Regex;
use std::sync::OnceLock;

/// A language the bot translates into (and out of).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Russian,
    Chinese,
}

impl Language {
    /// ISO 639-1 code (e.g. "ru", "zh")
    pub fn code(&self) -> &'static str {
        match self {
            Language::Russian => "ru",
            Language::Chinese => "zh",
        }
    }

    /// Target language code in DeepL's format
    pub fn deepl_code(&self) -> &'static str {
        match self {
            Language::Russian => "RU",
            Language::Chinese => "ZH",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::Russian => "Russian",
            Language::Chinese => "Chinese",
        }
    }

    pub fn flag(&self) -> &'static str {
        match self {
            Language::Russian => "🇷🇺",
            Language::Chinese => "🇨🇳",
        }
    }

    pub fn opposite(&self) -> Language {
        match self {
            Language::Russian => Language::Chinese,
            Language::Chinese => Language::Russian,
        }
    }
}

/// Which way a message gets translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    RussianToChinese,
    ChineseToRussian,
}

impl Direction {
    /// Direction for a message written in `source`
    pub fn from_source(source: Language) -> Self {
        match source {
            Language::Russian => Direction::RussianToChinese,
            Language::Chinese => Direction::ChineseToRussian,
        }
    }

    pub fn source(&self) -> Language {
        match self {
            Direction::RussianToChinese => Language::Russian,
            Direction::ChineseToRussian => Language::Chinese,
        }
    }

    pub fn target(&self) -> Language {
        self.source().opposite()
    }

    /// Prefix placed in front of the translated text, e.g. "🇷🇺→🇨🇳"
    pub fn marker(&self) -> String {
        format!("{}→{}", self.source().flag(), self.target().flag())
    }
}

/// Source language as reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectedLanguage {
    Russian,
    Chinese,
    /// The provider did not detect anything (fallback reports "auto")
    Unreported,
    Other(String),
}

impl DetectedLanguage {
    /// Normalize a provider code. DeepL reports upper case ("RU", "ZH"),
    /// other services may add a region ("zh-CN", "zh-Hans").
    pub fn from_code(code: &str) -> Self {
        let code = code.trim().to_lowercase();
        match code.as_str() {
            "ru" => DetectedLanguage::Russian,
            "zh" => DetectedLanguage::Chinese,
            "" | "auto" => DetectedLanguage::Unreported,
            c if c.starts_with("zh-") || c.starts_with("zh_") => DetectedLanguage::Chinese,
            _ => DetectedLanguage::Other(code),
        }
    }

    pub fn language(&self) -> Option<Language> {
        match self {
            DetectedLanguage::Russian => Some(Language::Russian),
            DetectedLanguage::Chinese => Some(Language::Chinese),
            _ => None,
        }
    }
}

fn cjk_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[\x{4E00}-\x{9FFF}]").expect("valid CJK pattern"))
}

fn cyrillic_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)[а-яё]").expect("valid Cyrillic pattern"))
}

/// Guess the language of `text` from the characters it uses.
///
/// Any CJK unified ideograph wins over Cyrillic, so a Chinese sentence that
/// quotes a Russian word is still treated as Chinese.
pub fn sniff_script(text: &str) -> Option<Language> {
    if cjk_pattern().is_match(text) {
        Some(Language::Chinese)
    } else if cyrillic_pattern().is_match(text) {
        Some(Language::Russian)
    } else {
        None
    }
}
