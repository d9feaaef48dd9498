//! Input marshaling: variables -> JSON argument object for `do.call`.

use std::collections::HashSet;

use serde_json::{Map, Value as Json};

use crate::{
    error::{BridgeError, Result},
    variable::{Value, Variable},
};

/// Builds the `args` object: one entry per input keyed by its remote name, in input order.
///
/// An empty input set yields `{}`.
pub fn marshal_inputs(inputs: &[Variable]) -> Result<String> {
    let mut seen = HashSet::new();
    let mut args = Map::new();
    for var in inputs {
        if !seen.insert(var.remote_name()) {
            return Err(BridgeError::input(var.name(), format!(
                "remote name '{}' is bound more than once",
                var.remote_name()
            )));
        }
        let value = var
            .value()
            .ok_or_else(|| BridgeError::input(var.name(), "no value assigned"))?;
        if value.kind() != var.kind() {
            return Err(BridgeError::KindMismatch {
                name: var.name().to_string(),
                expected: var.kind(),
                found: value.kind(),
            });
        }
        args.insert(var.remote_name().to_string(), to_json(var.name(), value)?);
    }
    serde_json::to_string(&Json::Object(args))
        .map_err(|e| BridgeError::input("args", e.to_string()))
}

fn to_json(name: &str, value: &Value) -> Result<Json> {
    let finite = match value {
        Value::Number(n) => n.is_finite(),
        Value::NumberColumn(ns) => ns.iter().all(|n| n.is_finite()),
        _ => true,
    };
    if !finite {
        return Err(BridgeError::input(name, "NaN and infinite numbers cannot be sent as JSON"));
    }
    serde_json::to_value(value).map_err(|e| BridgeError::input(name, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::Kind;

    #[test]
    fn empty_inputs_marshal_to_empty_object() {
        assert_eq!(marshal_inputs(&[]).unwrap(), "{}");
    }

    #[test]
    fn renders_each_kind_as_json_literal_in_order() {
        let inputs = vec![
            Variable::input("b", Value::Number(2.0)),
            Variable::input("a", Value::Number(1.5)),
            Variable::input("flag", Value::Boolean(true)),
            Variable::input("label", Value::String("say \"hi\"\n".into())),
            Variable::input("xs", Value::NumberColumn(vec![1.0, 2.5])),
            Variable::input("ok", Value::BooleanColumn(vec![true, false])),
            Variable::input("names", Value::StringColumn(vec!["x".into(), "y".into()])),
        ];
        let args = marshal_inputs(&inputs).unwrap();
        assert_eq!(
            args,
            r#"{"b":2.0,"a":1.5,"flag":true,"label":"say \"hi\"\n","xs":[1.0,2.5],"ok":[true,false],"names":["x","y"]}"#
        );
    }

    #[test]
    fn parsed_back_yields_same_pairs() {
        let inputs = vec![
            Variable::input("n", Value::Number(-0.125)),
            Variable::input("s", Value::String("tab\there \\ ünï".into())),
            Variable::input("cs", Value::StringColumn(vec!["{".into(), "}".into(), "&=".into()])),
        ];
        let parsed: Json = serde_json::from_str(&marshal_inputs(&inputs).unwrap()).unwrap();
        let obj = parsed.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["n"], serde_json::json!(-0.125));
        assert_eq!(obj["s"], serde_json::json!("tab\there \\ ünï"));
        assert_eq!(obj["cs"], serde_json::json!(["{", "}", "&="]));
    }

    #[test]
    fn duplicate_remote_names_are_rejected() {
        let inputs = vec![
            Variable::input("a", Value::Number(1.0)),
            Variable::input("a", Value::Number(2.0)),
        ];
        assert!(matches!(
            marshal_inputs(&inputs),
            Err(BridgeError::InputBinding { name, .. }) if name == "a"
        ));
    }

    #[test]
    fn unset_and_non_finite_inputs_are_rejected() {
        let unset = vec![Variable::new("x", "x", Kind::Number)];
        assert!(matches!(marshal_inputs(&unset), Err(BridgeError::InputBinding { .. })));

        let nan = vec![Variable::input("x", Value::NumberColumn(vec![1.0, f64::NAN]))];
        assert!(matches!(marshal_inputs(&nan), Err(BridgeError::InputBinding { .. })));
    }
}
