//! Prompt Templates
//!
//! Templates use `{name}` placeholders. Substitution is verbatim: values are
//! not escaped, only embedded newlines are flattened to spaces so a user
//! supplied value cannot break the prompt layout.

use std::collections::HashMap;

use crate::message::Message;

/// A reusable prompt with an optional system persona
#[derive(Clone, Debug)]
pub struct PromptTemplate {
    system: Option<&'static str>,
    body: &'static str,
}

impl PromptTemplate {
    pub const fn new(body: &'static str) -> Self {
        Self { system: None, body }
    }

    #[must_use]
    pub const fn with_system(mut self, system: &'static str) -> Self {
        self.system = Some(system);
        self
    }

    /// Substitute parameters into the body in a single left-to-right pass.
    ///
    /// Substituted values are never scanned again, so a value containing
    /// `{name}` stays literal. Placeholders without a matching parameter are
    /// left untouched.
    pub fn render(&self, params: &PromptParams) -> String {
        let mut out = String::with_capacity(self.body.len());
        let mut rest = self.body;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            let value = tail
                .find('}')
                .and_then(|close| params.get(&tail[1..close]).map(|v| (v, close)));
            match value {
                Some((value, close)) => {
                    out.push_str(value);
                    rest = &tail[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Render into the message list sent to a provider
    pub fn to_messages(&self, params: &PromptParams) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(self.render(params)));
        messages
    }
}

/// Named prompt parameters
#[derive(Clone, Debug, Default)]
pub struct PromptParams {
    values: HashMap<&'static str, String>,
}

impl PromptParams {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, key: &'static str, value: impl AsRef<str>) -> Self {
        self.values.insert(key, flatten_newlines(value.as_ref()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Replace every line break with a single space and trim the result
pub fn flatten_newlines(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}
