//! Printers: output variables as text or JSON.

use owo_colors::OwoColorize;
use serde_json::{Map, Value as Json};

use ocpu_bridge::Variable;

pub struct TextPrinter {
    pub color: bool,
}

impl TextPrinter {
    pub fn print(&self, outputs: &[Variable]) {
        for var in outputs {
            let value = var.value().map(|v| v.to_string()).unwrap_or_else(|| "<unset>".into());
            if self.color {
                println!("{} = {}", var.name().green(), value);
            } else {
                println!("{} = {}", var.name(), value);
            }
        }
    }
}

pub struct JsonPrinter;

impl JsonPrinter {
    pub fn render(outputs: &[Variable]) -> anyhow::Result<String> {
        let mut obj = Map::new();
        for var in outputs {
            let value = match var.value() {
                Some(v) => serde_json::to_value(v)?,
                None => Json::Null,
            };
            obj.insert(var.name().to_string(), value);
        }
        Ok(serde_json::to_string_pretty(&Json::Object(obj))?)
    }

    pub fn print(outputs: &[Variable]) -> anyhow::Result<()> {
        println!("{}", Self::render(outputs)?);
        Ok(())
    }
}
