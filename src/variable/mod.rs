//! Typed variables shared between the caller and the bridge.

use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::error::{BridgeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Boolean,
    Number,
    String,
    BooleanColumn,
    NumberColumn,
    StringColumn,
}

impl Kind {
    pub fn is_column(self) -> bool {
        matches!(self, Self::BooleanColumn | Self::NumberColumn | Self::StringColumn)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::BooleanColumn => "boolean[]",
            Self::NumberColumn => "number[]",
            Self::StringColumn => "string[]",
        };
        f.write_str(s)
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "boolean" | "bool" | "logical" => Ok(Self::Boolean),
            "number" | "numeric" | "double" => Ok(Self::Number),
            "string" | "character" => Ok(Self::String),
            "boolean[]" | "bool[]" | "logical[]" => Ok(Self::BooleanColumn),
            "number[]" | "numeric[]" | "double[]" => Ok(Self::NumberColumn),
            "string[]" | "character[]" => Ok(Self::StringColumn),
            other => Err(format!(
                "unknown kind '{}' (expected boolean, number, string or a column form like number[])",
                other
            )),
        }
    }
}

/// A value whose variant always agrees with the owning variable's [`Kind`].
///
/// Serializes as a bare JSON literal: numbers unquoted, strings quoted, columns as arrays.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Number(f64),
    String(String),
    BooleanColumn(Vec<bool>),
    NumberColumn(Vec<f64>),
    StringColumn(Vec<String>),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Boolean(_) => Kind::Boolean,
            Self::Number(_) => Kind::Number,
            Self::String(_) => Kind::String,
            Self::BooleanColumn(_) => Kind::BooleanColumn,
            Self::NumberColumn(_) => Kind::NumberColumn,
            Self::StringColumn(_) => Kind::StringColumn,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => f.write_str(s),
            other => match serde_json::to_string(other) {
                Ok(s) => f.write_str(&s),
                Err(_) => Err(fmt::Error),
            },
        }
    }
}

/// Binding between a caller-side name and a symbol of the remote script.
///
/// The kind is fixed at construction; [`Variable::set_value`] refuses values of any other kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    remote_name: String,
    kind: Kind,
    value: Option<Value>,
}

impl Variable {
    pub fn new(name: impl Into<String>, remote_name: impl Into<String>, kind: Kind) -> Self {
        Self { name: name.into(), remote_name: remote_name.into(), kind, value: None }
    }

    /// Input variable whose caller and remote names coincide; the kind follows the value.
    pub fn input(remote_name: impl Into<String>, value: Value) -> Self {
        let remote_name = remote_name.into();
        Self {
            name: remote_name.clone(),
            remote_name,
            kind: value.kind(),
            value: Some(value),
        }
    }

    /// Unset output slot whose caller and remote names coincide.
    pub fn output(remote_name: impl Into<String>, kind: Kind) -> Self {
        let remote_name = remote_name.into();
        Self::new(remote_name.clone(), remote_name, kind)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn remote_name(&self) -> &str {
        &self.remote_name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn set_value(&mut self, value: Value) -> Result<()> {
        if value.kind() != self.kind {
            return Err(BridgeError::KindMismatch {
                name: self.name.clone(),
                expected: self.kind,
                found: value.kind(),
            });
        }
        self.value = Some(value);
        Ok(())
    }
}
