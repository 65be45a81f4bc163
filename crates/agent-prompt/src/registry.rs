use crate::{Language, PromptError, PromptTemplate, Result};
use minijinja::Environment;
use serde::Serialize;
use std::collections::BTreeMap;

/// Compiled prompts rendered in one report language
///
/// Only the variant that will actually be rendered is compiled, so a
/// Korean registry never parses English sources it has Korean for.
pub struct PromptRegistry {
    env: Environment<'static>,
    language: Language,
    templates: BTreeMap<String, PromptTemplate>,
}

impl PromptRegistry {
    pub fn new(language: Language) -> Self {
        Self {
            env: Environment::new(),
            language,
            templates: BTreeMap::new(),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Compile and add a template, replacing one with the same name
    pub fn register(&mut self, template: PromptTemplate) -> Result<()> {
        let name = template.name().to_string();
        self.env
            .add_template_owned(name.clone(), template.source(self.language).to_string())
            .map_err(|source| PromptError::Template {
                name: name.clone(),
                source,
            })?;
        self.templates.insert(name, template);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PromptTemplate> {
        self.templates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Registered names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn render<S: Serialize>(&self, name: &str, vars: &S) -> Result<String> {
        if !self.contains(name) {
            return Err(PromptError::NotRegistered(name.to_string()));
        }
        let to_error = |source| PromptError::Template {
            name: name.to_string(),
            source,
        };
        self.env
            .get_template(name)
            .map_err(to_error)?
            .render(vars)
            .map_err(to_error)
    }
}

impl std::fmt::Debug for PromptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRegistry")
            .field("language", &self.language)
            .field("templates", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
