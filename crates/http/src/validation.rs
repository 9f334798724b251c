//! Field-level validation of JSON request bodies.
//!
//! Errors are keyed by field name. A nested object reports its own errors
//! under the parent field, so a bad `author.last_name` renders as
//! `{"author": {"last_name": ["Not a valid string."]}}`.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

/// Key used for errors that are not tied to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

pub const REQUIRED: &str = "This field is required.";
pub const NULL: &str = "This field may not be null.";
pub const NOT_A_STRING: &str = "Not a valid string.";
pub const BLANK: &str = "This field may not be blank.";

/// Errors for one field: a list of messages, or the errors of a nested object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldErrors {
    Messages(Vec<String>),
    Nested(ValidationErrors),
}

/// Field-keyed validation failures for one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, FieldErrors>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let message = message.into();
        match self.0.entry(field.into()).or_insert_with(|| FieldErrors::Messages(Vec::new())) {
            FieldErrors::Messages(messages) => messages.push(message),
            FieldErrors::Nested(nested) => nested.add(NON_FIELD_ERRORS, message),
        }
    }

    /// Record the errors of a nested object under `field`.
    pub fn nest(&mut self, field: impl Into<String>, errors: ValidationErrors) {
        if !errors.is_empty() {
            self.0.insert(field.into(), FieldErrors::Nested(errors));
        }
    }

    /// Build a single non-field error.
    pub fn non_field(message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(NON_FIELD_ERRORS, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&FieldErrors> {
        self.0.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<_> = self.fields().collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Name of a JSON value's type, as shown in error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Reads fields out of a JSON object, collecting every failure instead of
/// stopping at the first one.
pub struct Fields<'a> {
    object: &'a Map<String, Value>,
    errors: ValidationErrors,
}

impl<'a> Fields<'a> {
    /// Start reading `value`, which must be a JSON object.
    pub fn new(value: &'a Value) -> Result<Self, ValidationErrors> {
        match value {
            Value::Object(object) => Ok(Self {
                object,
                errors: ValidationErrors::new(),
            }),
            other => Err(ValidationErrors::non_field(format!(
                "Invalid data. Expected a dictionary, but got {}.",
                type_name(other)
            ))),
        }
    }

    /// A required, non-blank string. Surrounding whitespace is trimmed.
    pub fn text(&mut self, field: &str) -> Option<String> {
        let message = match self.object.get(field) {
            None => REQUIRED,
            Some(Value::Null) => NULL,
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    BLANK
                } else {
                    return Some(trimmed.to_string());
                }
            }
            Some(_) => NOT_A_STRING,
        };
        self.errors.add(field, message);
        None
    }

    /// A required nested object validated by `validate`. Its errors are
    /// nested under `field`.
    pub fn nested<T>(
        &mut self,
        field: &str,
        validate: impl FnOnce(&'a Value) -> Result<T, ValidationErrors>,
    ) -> Option<T> {
        match self.object.get(field) {
            None => self.errors.add(field, REQUIRED),
            Some(Value::Null) => self.errors.add(field, NULL),
            Some(value) => match validate(value) {
                Ok(parsed) => return Some(parsed),
                Err(errors) => self.errors.nest(field, errors),
            },
        }
        None
    }

    /// Finish reading. `build` runs only when every field was valid.
    pub fn finish<T>(self, build: impl FnOnce() -> Option<T>) -> Result<T, ValidationErrors> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        build().ok_or(self.errors)
    }
}
