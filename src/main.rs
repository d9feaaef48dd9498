mod cli;
mod printer;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use is_terminal::IsTerminal;
use ocpu_bridge::{CapturedOutput, Config, Coordinator, Diagnostics, ResponseShape, RunOutcome};
use printer::{JsonPrinter, TextPrinter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ocpu_bridge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load config; CLI flags override
    let mut cfg = Config::load();
    if let Some(endpoint) = &args.endpoint {
        cfg.set("OCPU_ENDPOINT", endpoint.as_str());
    }

    let captured = Arc::new(CapturedOutput::default());
    let mut coordinator = Coordinator::from_config(&cfg, captured.clone())
        .with_context(|| format!("configuring bridge for {}", cfg.endpoint()))?;
    if args.keyed {
        coordinator = coordinator.with_response_shape(ResponseShape::Keyed);
    }

    coordinator.configure(&args.script, args.inputs, args.outputs);
    let outcome = coordinator.run().await;

    if args.show_output {
        if let Some(text) = captured.snapshot() {
            eprint!("{}", text);
        }
    }
    let outcome = outcome.with_context(|| format!("running {}", args.script.display()))?;
    if outcome == RunOutcome::Discarded {
        bail!("results of {} were discarded", args.script.display());
    }

    let outputs = coordinator.outputs();
    if args.json {
        JsonPrinter::print(&outputs)?;
    } else {
        TextPrinter { color: std::io::stdout().is_terminal() }.print(&outputs);
    }
    Ok(())
}
