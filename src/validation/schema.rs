/*!
 * Declarative response schemas.
 *
 * A schema is an ordered list of required keys, each paired with one rule.
 * Every operation describes its reply with a schema and the generic validator
 * in `service` evaluates it, so a new operation only needs a new schema.
 */

/// Sentiment vocabulary, matched case-sensitively
pub const SENTIMENT_LABELS: &[&str] = &["positive", "neutral", "negative"];

/// Constraint applied to one required key
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRule {
    /// Any JSON value
    Present,
    /// A JSON string
    Text,
    /// A JSON array whose length is within `min..=max`
    List {
        /// Inclusive lower bound
        min: usize,
        /// Inclusive upper bound
        max: usize,
    },
    /// A string from a fixed vocabulary
    OneOf(&'static [&'static str]),
    /// A number, or a numeric string, in the closed interval [0, 1]
    UnitInterval,
}

impl FieldRule {
    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            Self::Present => "present".to_string(),
            Self::Text => "a string".to_string(),
            Self::List { min, max } => format!("a list of {}-{} items", min, max),
            Self::OneOf(allowed) => format!("one of {}", allowed.join(", ")),
            Self::UnitInterval => "a number between 0 and 1".to_string(),
        }
    }
}

/// One required key and its rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// Key in the reply object
    pub key: &'static str,
    /// Constraint on its value
    pub rule: FieldRule,
}

/// Shape an operation's reply must have
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    name: &'static str,
    fields: Vec<FieldSpec>,
}

impl ResponseSchema {
    /// Create an empty schema
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// Add a required key
    pub fn field(mut self, key: &'static str, rule: FieldRule) -> Self {
        self.fields.push(FieldSpec { key, rule });
        self
    }

    /// Schema name, for log lines
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Required keys with their rules, in declaration order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Required keys, in declaration order
    pub fn required_keys(&self) -> Vec<&'static str> {
        self.fields.iter().map(|spec| spec.key).collect()
    }
}
