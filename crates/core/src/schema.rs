//! Field readers shared by every schema.

use std::fmt::Display;

use serde_json::{Map, Value};

use crate::error::{Issue, ValidationError};
use crate::primitives::type_name;

/// Dotted path of `key` below `path`.
pub fn join(path: &str, key: impl Display) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn expect_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, ValidationError> {
    value.as_object().ok_or_else(|| {
        ValidationError::single(
            path,
            format!("Expected object, received {}", type_name(value)),
        )
    })
}

/// Reads typed fields out of a JSON object.
///
/// Each accessor encodes one presence policy; schemas pick the policy per
/// field instead of sharing a generic coerce-or-default helper.
#[derive(Debug)]
pub struct ObjectReader<'a> {
    path: &'a str,
    object: &'a Map<String, Value>,
}

impl<'a> ObjectReader<'a> {
    /// Rejects any key not listed in `known`.
    pub fn closed(value: &'a Value, path: &'a str, known: &[&str]) -> Result<Self, ValidationError> {
        let object = expect_object(value, path)?;
        let unknown: Vec<String> = object
            .keys()
            .filter(|key| !known.contains(&key.as_str()))
            .map(|key| format!("'{key}'"))
            .collect();
        if !unknown.is_empty() {
            return Err(ValidationError::single(
                path,
                format!("Unrecognized key(s) in object: {}", unknown.join(", ")),
            ));
        }
        Ok(Self { path, object })
    }

    /// Ignores keys no accessor asks for.
    pub fn open(value: &'a Value, path: &'a str) -> Result<Self, ValidationError> {
        Ok(Self {
            path,
            object: expect_object(value, path)?,
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.object.contains_key(key)
    }

    fn at<T>(
        &self,
        key: &str,
        value: &Value,
        coerce: impl FnOnce(&Value) -> Result<T, String>,
    ) -> Result<T, ValidationError> {
        coerce(value).map_err(|message| ValidationError::single(join(self.path, key), message))
    }

    /// Must be present and valid.
    pub fn required<T>(
        &self,
        key: &str,
        coerce: impl FnOnce(&Value) -> Result<T, String>,
    ) -> Result<T, ValidationError> {
        match self.object.get(key) {
            Some(value) => self.at(key, value, coerce),
            None => Err(ValidationError::single(join(self.path, key), "Required")),
        }
    }

    /// May be absent; `null` is not accepted.
    pub fn optional<T>(
        &self,
        key: &str,
        coerce: impl FnOnce(&Value) -> Result<T, String>,
    ) -> Result<Option<T>, ValidationError> {
        self.object
            .get(key)
            .map(|value| self.at(key, value, coerce))
            .transpose()
    }

    /// Absent means "not estimated yet" and resolves to `placeholder`.
    pub fn or_placeholder<T>(
        &self,
        key: &str,
        coerce: impl FnOnce(&Value) -> Result<T, String>,
        placeholder: T,
    ) -> Result<T, ValidationError> {
        Ok(self.optional(key, coerce)?.unwrap_or(placeholder))
    }

    /// Absent and `null` both mean "value not known".
    pub fn nullable<T>(
        &self,
        key: &str,
        coerce: impl FnOnce(&Value) -> Result<T, String>,
    ) -> Result<Option<T>, ValidationError> {
        match self.object.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => self.at(key, value, coerce).map(Some),
        }
    }

    /// Like [`Self::nullable`] for a nested schema that reports its own paths.
    pub fn nullable_nested<T>(
        &self,
        key: &str,
        parse: impl FnOnce(&Value, &str) -> Result<T, ValidationError>,
    ) -> Result<Option<T>, ValidationError> {
        match self.object.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => parse(value, &join(self.path, key)).map(Some),
        }
    }

    /// Like [`Self::required`] for a nested schema that reports its own paths.
    pub fn required_nested<T>(
        &self,
        key: &str,
        parse: impl FnOnce(&Value, &str) -> Result<T, ValidationError>,
    ) -> Result<T, ValidationError> {
        let path = join(self.path, key);
        match self.object.get(key) {
            Some(value) => parse(value, &path),
            None => Err(ValidationError::single(path, "Required")),
        }
    }
}

/// Accumulates issues across independently validated parts.
#[derive(Debug, Default)]
pub struct Issues(Vec<Issue>);

impl Issues {
    pub fn take<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.push(err);
                None
            }
        }
    }

    pub fn push(&mut self, err: ValidationError) {
        self.0.extend(err.into_issues());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_error(self) -> ValidationError {
        ValidationError::new(self.0)
    }
}
