use crate::Language;
use std::borrow::Cow;

/// A named prompt with an English source and an optional Korean one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    name: Cow<'static, str>,
    english: Cow<'static, str>,
    korean: Option<Cow<'static, str>>,
}

impl PromptTemplate {
    pub fn new(name: impl Into<Cow<'static, str>>, english: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            english: english.into(),
            korean: None,
        }
    }

    pub fn bilingual(
        name: impl Into<Cow<'static, str>>,
        english: impl Into<Cow<'static, str>>,
        korean: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::new(name, english).with_korean(korean)
    }

    #[must_use]
    pub fn with_korean(mut self, korean: impl Into<Cow<'static, str>>) -> Self {
        self.korean = Some(korean.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this exact language has its own source
    pub fn has_variant(&self, language: Language) -> bool {
        match language {
            Language::English => true,
            Language::Korean => self.korean.is_some(),
        }
    }

    /// Source to render for `language`, English when there is no variant
    pub fn source(&self, language: Language) -> &str {
        match (language, &self.korean) {
            (Language::Korean, Some(korean)) => korean,
            _ => &self.english,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_selection() {
        let template = PromptTemplate::new("outlook", "{{ year }} outlook");
        assert!(!template.has_variant(Language::Korean));
        assert_eq!(template.source(Language::Korean), "{{ year }} outlook");

        let template = template.with_korean("{{ year }}년 전망");
        assert!(template.has_variant(Language::Korean));
        assert_eq!(template.source(Language::Korean), "{{ year }}년 전망");
        assert_eq!(template.source(Language::English), "{{ year }} outlook");
    }
}
