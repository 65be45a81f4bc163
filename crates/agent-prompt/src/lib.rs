//! Bilingual prompt templates
//!
//! Each [`PromptTemplate`] carries an English Jinja source and, usually, a
//! Korean one. A [`PromptRegistry`] compiles every variant into one
//! MiniJinja environment and renders in its report language, using the
//! English source when a template has no Korean variant.
//!
//! ```
//! use agent_prompt::{Language, PromptRegistry, PromptTemplate};
//! use serde_json::json;
//!
//! let mut registry = PromptRegistry::new(Language::Korean);
//! registry
//!     .register(PromptTemplate::bilingual(
//!         "strategy",
//!         "What is {{ company }}'s EV strategy?",
//!         "{{ company }}의 전기차 전략은?",
//!     ))
//!     .unwrap();
//!
//! let prompt = registry.render("strategy", &json!({ "company": "기아" })).unwrap();
//! assert_eq!(prompt, "기아의 전기차 전략은?");
//! ```
//!
//! The `core-integration` feature converts [`PromptError`] into
//! `agent_core::Error`.

mod error;
mod language;
mod registry;
mod template;

pub use error::{PromptError, Result};
pub use language::Language;
pub use registry::PromptRegistry;
pub use template::PromptTemplate;
