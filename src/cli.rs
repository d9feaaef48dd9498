use std::path::PathBuf;

use clap::Parser;
use ocpu_bridge::{unmarshal, Kind, Variable};

#[derive(Parser, Debug, Clone)]
#[command(name = "ocpu-bridge", about = "Run an R script on an OpenCPU server", version)]
pub struct Cli {
    /// R script to execute; its text is sent as the `what` argument of do.call.
    #[arg(long, value_name = "FILE")]
    pub script: PathBuf,

    /// Input variable, NAME[@REMOTE]:KIND=VALUE. VALUE is read as JSON when it parses,
    /// otherwise as a bare string. Can be repeated.
    ///
    /// KIND is one of boolean, number, string, boolean[], number[], string[].
    #[arg(short = 'i', long = "input", value_name = "BINDING", value_parser = parse_input, action = clap::ArgAction::Append)]
    pub inputs: Vec<Variable>,

    /// Output variable, NAME[@REMOTE]:KIND. Can be repeated.
    #[arg(short = 'o', long = "output", value_name = "BINDING", value_parser = parse_output, action = clap::ArgAction::Append)]
    pub outputs: Vec<Variable>,

    /// OpenCPU do.call endpoint (overrides OCPU_ENDPOINT).
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Expect a keyed object result and bind outputs by remote name.
    #[arg(long)]
    pub keyed: bool,

    /// Print outputs as a single JSON object.
    #[arg(long)]
    pub json: bool,

    /// Print the captured script/payload echo to stderr.
    #[arg(long = "show-output")]
    pub show_output: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

fn parse_binding(spec: &str) -> Result<(String, String, Kind), String> {
    let (names, kind) = spec
        .rsplit_once(':')
        .ok_or_else(|| format!("'{}' is missing ':KIND'", spec))?;
    let kind: Kind = kind.parse()?;
    let (name, remote) = match names.split_once('@') {
        Some((name, remote)) => (name.trim(), remote.trim()),
        None => (names.trim(), names.trim()),
    };
    if name.is_empty() || remote.is_empty() {
        return Err(format!("'{}' has an empty variable name", spec));
    }
    Ok((name.to_string(), remote.to_string(), kind))
}

fn parse_input(spec: &str) -> Result<Variable, String> {
    let (binding, raw) = spec
        .split_once('=')
        .ok_or_else(|| format!("'{}' is missing '=VALUE'", spec))?;
    let (name, remote, kind) = parse_binding(binding)?;
    let json = serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
    let value = unmarshal::convert(kind, &json).map_err(|e| format!("input '{}': {}", name, e))?;
    let mut var = Variable::new(name, remote, kind);
    var.set_value(value).map_err(|e| e.to_string())?;
    Ok(var)
}

fn parse_output(spec: &str) -> Result<Variable, String> {
    let (name, remote, kind) = parse_binding(spec)?;
    Ok(Variable::new(name, remote, kind))
}
