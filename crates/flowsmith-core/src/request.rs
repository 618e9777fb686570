use serde::{Deserialize, Serialize};
use std::fmt;

/// Language of the process description and of the prompts built from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ru,
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Ru => "ru",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_temperature() -> f32 {
    0.2
}

/// One caller request to turn a process description into BPMN XML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub text: String,
    #[serde(default)]
    pub process_name: Option<String>,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub return_debug: bool,
}

impl GenerationRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            process_name: None,
            language: Language::default(),
            max_attempts: None,
            temperature: default_temperature(),
            return_debug: false,
        }
    }

    pub fn with_process_name(mut self, name: impl Into<String>) -> Self {
        self.process_name = Some(name.into());
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_debug(mut self, return_debug: bool) -> Self {
        self.return_debug = return_debug;
        self
    }

    /// Caller-supplied process name, ignoring blank values.
    pub fn explicit_process_name(&self) -> Option<&str> {
        self.process_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
