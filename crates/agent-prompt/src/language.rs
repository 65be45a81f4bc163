use crate::PromptError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Report language; prompts and fixed messages exist in both
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ko")]
    Korean,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Korean => "ko",
        }
    }

    /// Lenient parse for settings: anything unrecognised is English
    pub fn from_code(code: &str) -> Self {
        code.parse().unwrap_or_default()
    }
}

impl FromStr for Language {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "en-us" | "english" => Ok(Self::English),
            "ko" | "ko-kr" | "kr" | "korean" | "한국어" => Ok(Self::Korean),
            other => Err(PromptError::UnknownLanguage(other.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::English => "English",
            Self::Korean => "Korean",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(" KO ".parse::<Language>().unwrap(), Language::Korean);
        assert_eq!("한국어".parse::<Language>().unwrap(), Language::Korean);
        assert_eq!("en-US".parse::<Language>().unwrap(), Language::English);
        assert!(matches!(
            "ja".parse::<Language>(),
            Err(PromptError::UnknownLanguage(code)) if code == "ja"
        ));
    }

    #[test]
    fn test_from_code_defaults_to_english() {
        assert_eq!(Language::from_code("ko"), Language::Korean);
        assert_eq!(Language::from_code("ja"), Language::English);
        assert_eq!(Language::from_code(""), Language::English);
    }

    #[test]
    fn test_serde_uses_codes() {
        assert_eq!(serde_json::to_string(&Language::Korean).unwrap(), "\"ko\"");
        let parsed: Language = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(parsed, Language::English);
        assert_eq!(Language::Korean.to_string(), "Korean");
    }
}
