//! Single-pass `{placeholder}` templates.
//!
//! Templates are parsed once into literal and variable segments. Rendering
//! walks the segments, so substituted values are never rescanned: a JSON
//! payload full of braces is inserted verbatim. `{{` and `}}` produce
//! literal braces.

use std::collections::HashMap;

use crate::error::LlmError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// A parsed prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse `template`, rejecting unbalanced braces and empty or malformed
    /// placeholder names.
    pub fn from_template(template: &str) -> Result<Self, LlmError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(LlmError::InvalidTemplate(format!(
                            "unclosed '{{' at byte {pos}"
                        )));
                    }
                    if !is_identifier(&name) {
                        return Err(LlmError::InvalidTemplate(format!(
                            "invalid placeholder name '{name}' at byte {pos}"
                        )));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Variable(name));
                }
                '}' => {
                    return Err(LlmError::InvalidTemplate(format!(
                        "unmatched '}}' at byte {pos}"
                    )));
                }
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    /// Placeholder names in order of first appearance.
    pub fn input_variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Variable(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Substitute every placeholder with its value from `vars`.
    ///
    /// Values are inserted in full. Unused entries in `vars` are ignored;
    /// a placeholder without a value is an error.
    pub fn render(&self, vars: &HashMap<&str, String>) -> Result<String, LlmError> {
        let capacity = self
            .segments
            .iter()
            .map(|s| match s {
                Segment::Literal(text) => text.len(),
                Segment::Variable(name) => vars.get(name.as_str()).map_or(0, String::len),
            })
            .sum();
        let mut out = String::with_capacity(capacity);

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Variable(name) => {
                    let value = vars
                        .get(name.as_str())
                        .ok_or_else(|| LlmError::MissingVariable(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
