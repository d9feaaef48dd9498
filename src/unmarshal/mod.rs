//! Output unmarshaling: remote result -> caller output variables.

use std::str::FromStr;

use serde_json::Value as Json;

use crate::{
    error::{BridgeError, Result},
    variable::{Kind, Value, Variable},
};

/// How a single remote result maps onto the declared outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseShape {
    /// Every output receives the same result.
    #[default]
    Broadcast,
    /// The result is an object; each output reads the entry named by its remote name.
    Keyed,
}

impl FromStr for ResponseShape {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "broadcast" => Ok(Self::Broadcast),
            "keyed" => Ok(Self::Keyed),
            other => Err(format!("unknown response shape '{}' (expected broadcast or keyed)", other)),
        }
    }
}

/// Textual form of a JSON value: strings unquoted, everything else as its JSON literal.
pub fn textual(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Converts a JSON value into a [`Value`] of the requested kind.
///
/// Every kind has a conversion; a column accepts either an array or a single element.
pub fn convert(kind: Kind, raw: &Json) -> std::result::Result<Value, String> {
    match kind {
        Kind::Boolean => to_bool(raw).map(Value::Boolean),
        Kind::Number => to_number(raw).map(Value::Number),
        Kind::String => Ok(Value::String(textual(raw))),
        Kind::BooleanColumn => elements(raw)
            .map(to_bool)
            .collect::<std::result::Result<_, _>>()
            .map(Value::BooleanColumn),
        Kind::NumberColumn => elements(raw)
            .map(to_number)
            .collect::<std::result::Result<_, _>>()
            .map(Value::NumberColumn),
        Kind::StringColumn => Ok(Value::StringColumn(elements(raw).map(textual).collect())),
    }
}

fn elements(raw: &Json) -> Box<dyn Iterator<Item = &Json> + '_> {
    match raw {
        Json::Array(items) => Box::new(items.iter()),
        single => Box::new(std::iter::once(single)),
    }
}

fn to_number(raw: &Json) -> std::result::Result<f64, String> {
    let text = textual(raw);
    text.trim()
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not a number", text))
}

fn to_bool(raw: &Json) -> std::result::Result<bool, String> {
    if let Json::Bool(b) = raw {
        return Ok(*b);
    }
    let text = textual(raw);
    match text.trim() {
        "true" | "TRUE" | "T" => Ok(true),
        "false" | "FALSE" | "F" => Ok(false),
        _ => Err(format!("'{}' is not a logical value", text)),
    }
}

/// R has no scalars: a list entry for a scalar output arrives as a length-1 vector.
fn unbox_scalar(kind: Kind, entry: &Json) -> &Json {
    match entry {
        Json::Array(items) if items.len() == 1 && !kind.is_column() => &items[0],
        other => other,
    }
}

/// Writes the result into every output, or into none of them if any conversion fails.
pub fn bind_outputs(result: &Json, outputs: &mut [Variable], shape: ResponseShape) -> Result<()> {
    let mut converted = Vec::with_capacity(outputs.len());
    for var in outputs.iter() {
        let raw = match shape {
            ResponseShape::Broadcast => result,
            ResponseShape::Keyed => result
                .as_object()
                .ok_or_else(|| BridgeError::ResponseParse(format!(
                    "keyed response must be an object, got {}",
                    result
                )))?
                .get(var.remote_name())
                .ok_or_else(|| BridgeError::output(var.name(), format!(
                    "'{}' not found in the remote result",
                    var.remote_name()
                )))
                .map(|entry| unbox_scalar(var.kind(), entry))?,
        };
        let value = convert(var.kind(), raw).map_err(|reason| BridgeError::output(var.name(), reason))?;
        converted.push(value);
    }
    for (var, value) in outputs.iter_mut().zip(converted) {
        var.set_value(value)?;
    }
    Ok(())
}
