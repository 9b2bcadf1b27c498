//! Typed search filters.
//!
//! A [`Qualifier`] is a named search filter serialized as a `key:value` token,
//! while a [`Parameter`] is a query-wide modifier such as `sort` or `order`.
//! Both share one concrete shape and the [`Field`] capability trait, so a CLI
//! layer can bind raw flag values to either without knowing which it holds.
//!
//! Values are always carried as text. An optional [`Validator`] screens
//! candidates before they are stored; the validators here are deliberately
//! more permissive than the server.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SearchError, ValidationError};

static RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(>|>=|<|<=|\*\.\.)?[0-9]+(\.\.(\*|[0-9]+))?$").unwrap());

static DATE_RANGE: Lazy<Regex> = Lazy::new(|| {
    let date_time = r"([0-9]|-|\+|:|T)+";
    Regex::new(&format!(
        r"^(>|>=|<|<=|\*\.\.)?{date_time}(\.\.(\*|{date_time}))?$"
    ))
    .unwrap()
});

/// A reusable predicate over candidate values.
pub type Validator = Arc<dyn Fn(&str) -> std::result::Result<(), ValidationError> + Send + Sync>;

/// Descriptive type tag, used only for help text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    String,
    StringSlice,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Bool => "bool",
            FieldKind::String => "string",
            FieldKind::StringSlice => "stringSlice",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The get/set/validate contract shared by qualifiers and parameters.
pub trait Field {
    /// Whether a value has been successfully assigned.
    fn is_set(&self) -> bool;

    /// Wire name used in the serialized query.
    fn key(&self) -> &str;

    /// Validates and stores `value`. A rejected value leaves the field untouched.
    fn set(&mut self, value: &str) -> Result<()>;

    /// Current value, either the default or the last accepted one.
    fn value(&self) -> &str;

    /// Type tag for help rendering.
    fn kind(&self) -> FieldKind;
}

/// A named, optionally validated, textual search filter.
#[derive(Clone)]
pub struct Qualifier {
    key: String,
    kind: FieldKind,
    value: String,
    set: bool,
    validator: Option<Validator>,
}

/// Query-wide modifiers (`sort`, `order`) share the qualifier shape.
pub type Parameter = Qualifier;

impl Qualifier {
    /// Creates an unset field holding `default` as its value.
    pub fn new(
        key: impl Into<String>,
        kind: FieldKind,
        default: impl Into<String>,
        validator: Option<Validator>,
    ) -> Self {
        Qualifier {
            key: key.into(),
            kind,
            value: default.into(),
            set: false,
            validator,
        }
    }
}

impl Field for Qualifier {
    fn is_set(&self) -> bool {
        self.set
    }

    fn key(&self) -> &str {
        &self.key
    }

    fn set(&mut self, value: &str) -> Result<()> {
        if let Some(validator) = &self.validator {
            validator(value).map_err(|source| SearchError::InvalidValue {
                key: self.key.clone(),
                source,
            })?;
        }
        self.value = value.to_string();
        self.set = true;
        Ok(())
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn kind(&self) -> FieldKind {
        self.kind
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl fmt::Debug for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Qualifier")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("value", &self.value)
            .field("set", &self.set)
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

fn to_owned_list(opts: &[&str]) -> Vec<String> {
    opts.iter().map(|o| o.to_string()).collect()
}

/// Accepts exactly one entry of `opts`.
pub fn opts_validator(opts: &[&str]) -> Validator {
    let allowed = to_owned_list(opts);
    Arc::new(move |value: &str| {
        if allowed.iter().any(|o| o == value) {
            Ok(())
        } else {
            Err(ValidationError::NotAnOption {
                value: value.to_string(),
                allowed: allowed.clone(),
            })
        }
    })
}

/// Accepts a comma separated list whose trimmed entries all belong to `opts`.
pub fn multi_opts_validator(opts: &[&str]) -> Validator {
    let allowed = to_owned_list(opts);
    Arc::new(move |list: &str| {
        for value in list.split(',').map(str::trim) {
            if !allowed.iter().any(|o| o == value) {
                return Err(ValidationError::NotAnOptionInList {
                    value: value.to_string(),
                    allowed: allowed.clone(),
                });
            }
        }
        Ok(())
    })
}

/// Accepts the canonical boolean spellings.
pub fn bool_validator() -> Validator {
    Arc::new(|value: &str| match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" | "0" | "f" | "F" | "false" | "FALSE"
        | "False" => Ok(()),
        _ => Err(ValidationError::NotBoolean(value.to_string())),
    })
}

/// Accepts numeric ranges such as `5`, `>=10`, `1..5` or `*..20`.
pub fn range_validator() -> Validator {
    Arc::new(|value: &str| {
        if RANGE.is_match(value) {
            Ok(())
        } else {
            Err(ValidationError::InvalidRange(value.to_string()))
        }
    })
}

/// Accepts date ranges such as `2020-01-01`, `>2021-06-01T12:00:00+00:00` or `2020..*`.
pub fn date_validator() -> Validator {
    Arc::new(|value: &str| {
        if DATE_RANGE.is_match(value) {
            Ok(())
        } else {
            Err(ValidationError::InvalidDate(value.to_string()))
        }
    })
}
