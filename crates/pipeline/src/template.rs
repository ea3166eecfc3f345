//! Prompt templates and run parameters.
//!
//! A [`Template`] is parsed once into literal and placeholder segments. The
//! placeholder names are therefore an enumerated, inspectable set: the crew
//! checks them against the supplied [`Parameters`] before any task runs, and
//! [`Template::resolve`] fails with a typed [`MissingParameter`] instead of
//! leaving a `{name}` token in the text sent to a model.
//!
//! ## Syntax
//!
//! - `{name}` where `name` matches `[A-Za-z_][A-Za-z0-9_]*` is a placeholder.
//! - `{{` and `}}` produce a literal `{` and `}`.
//! - Any other brace is kept as literal text, so prompts may contain JSON
//!   snippets without escaping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A placeholder had no value in the supplied [`Parameters`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing parameter '{name}'")]
pub struct MissingParameter {
    /// Name of the unresolved placeholder.
    pub name: String,
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Named run parameters (e.g. `{"topic": "..."}`) supplied at kickoff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters(BTreeMap<String, String>);

impl Parameters {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `self` with `name` bound to `value`.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Binds `name` to `value`, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Returns the value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Returns `true` if `name` has a value.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Parameters
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parses `text` into a template. Parsing never fails; see the module
    /// docs for how braces are interpreted.
    pub fn parse(text: impl Into<String>) -> Self {
        let source = text.into();
        let segments = parse_segments(&source);
        Self { source, segments }
    }

    /// Returns the unparsed template text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Placeholder names in order of appearance (repeats included).
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitutes every placeholder with its value from `params`.
    ///
    /// Values are inserted verbatim and are not themselves re-parsed, so a
    /// topic containing braces cannot introduce new placeholders.
    pub fn resolve(&self, params: &Parameters) -> Result<String, MissingParameter> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = params.get(name).ok_or_else(|| MissingParameter {
                        name: name.clone(),
                    })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

impl From<&str> for Template {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl From<String> for Template {
    fn from(text: String) -> Self {
        Self::parse(text)
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
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

fn parse_segments(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(pos) = rest.find(|c| c == '{' || c == '}') {
        literal.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            literal.push('{');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with("}}") {
            literal.push('}');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('{') {
            if let Some(end) = tail[1..].find('}') {
                let name = &tail[1..1 + end];
                if is_identifier(name) {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name.to_string()));
                    rest = &tail[end + 2..];
                    continue;
                }
            }
        }

        // Stray brace: keep it as text.
        literal.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(value: &str) -> Parameters {
        Parameters::new().with("topic", value)
    }

    #[test]
    fn substitutes_every_occurrence() {
        let t = Template::parse("Plan {topic}; focus on {topic} trends");
        assert_eq!(
            t.resolve(&topic("rust")).unwrap(),
            "Plan rust; focus on rust trends"
        );
        assert_eq!(t.placeholders().collect::<Vec<_>>(), vec!["topic", "topic"]);
    }

    #[test]
    fn missing_parameter_names_the_placeholder() {
        let t = Template::parse("About {topic} for {audience}");
        let err = t.resolve(&topic("x")).unwrap_err();
        assert_eq!(err.name, "audience");
        assert_eq!(err.to_string(), "missing parameter 'audience'");
    }

    #[test]
    fn double_braces_are_literal() {
        let t = Template::parse("{{topic}} is {topic}");
        assert_eq!(t.placeholders().count(), 1);
        assert_eq!(t.resolve(&topic("x")).unwrap(), "{topic} is x");
    }

    #[test]
    fn non_identifier_braces_are_kept_verbatim() {
        let t = Template::parse(r#"Reply as {"a": 1} or { } about {topic"#);
        assert_eq!(t.placeholders().count(), 0);
        assert_eq!(t.resolve(&Parameters::new()).unwrap(), t.as_str());
    }

    #[test]
    fn values_are_not_reparsed() {
        let t = Template::parse("On {topic}");
        assert_eq!(t.resolve(&topic("{secret}")).unwrap(), "On {secret}");
    }

    #[test]
    fn resolution_is_idempotent_and_order_independent() {
        let goal = Template::parse("Plan content on {topic}");
        let description = Template::parse("Write about {topic} for {audience}");
        let params = Parameters::new().with("topic", "AI").with("audience", "investors");
        let reversed: Parameters = [("audience", "investors"), ("topic", "AI")].into_iter().collect();

        let first = (goal.resolve(&params).unwrap(), description.resolve(&params).unwrap());
        let second = (
            goal.resolve(&reversed).unwrap(),
            description.resolve(&reversed).unwrap(),
        );
        let description_first = description.resolve(&params).unwrap();
        let goal_second = goal.resolve(&params).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, (goal_second, description_first));
    }

    #[test]
    fn handles_multibyte_text_around_placeholders() {
        let t = Template::parse("Über {topic} — naïve");
        assert_eq!(t.resolve(&topic("Zürich")).unwrap(), "Über Zürich — naïve");
    }
}
