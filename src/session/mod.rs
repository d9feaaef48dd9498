//! Execution coordinator: one run at a time, read -> marshal -> call -> unmarshal.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use tokio::sync::Mutex as SessionLock;

use crate::{
    config::Config,
    error::{BridgeError, Result},
    marshal,
    remote::{self, OpenCpuClient},
    unmarshal::{self, textual, ResponseShape},
    variable::Variable,
};

/// Sink for the echo of script lines and wire payloads produced by a run.
pub trait Diagnostics: Send + Sync {
    fn clear(&self);
    fn echo(&self, line: &str);
    /// `None` until the first run starts.
    fn snapshot(&self) -> Option<String>;
}

/// In-memory [`Diagnostics`], one line per echo.
#[derive(Debug, Default)]
pub struct CapturedOutput {
    text: Mutex<Option<String>>,
}

impl CapturedOutput {
    fn text(&self) -> MutexGuard<'_, Option<String>> {
        self.text.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Diagnostics for CapturedOutput {
    fn clear(&self) {
        *self.text() = Some(String::new());
    }

    fn echo(&self, line: &str) {
        let mut text = self.text();
        let buf = text.get_or_insert_with(String::new);
        buf.push_str(line);
        buf.push('\n');
    }

    fn snapshot(&self) -> Option<String> {
        self.text().clone()
    }
}

/// What became of a successful run's results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The output variables now hold the converted result.
    Applied,
    /// `configure` was called while the run was in flight; outputs were left as re-configured.
    Discarded,
}

/// Clears the running flag when a run leaves scope, whatever the exit path.
struct RunningFlag<'a>(&'a AtomicBool);

impl<'a> RunningFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Default)]
struct Target {
    script: Option<PathBuf>,
    inputs: Vec<Variable>,
    outputs: Vec<Variable>,
    generation: u64,
}

pub struct Coordinator {
    client: OpenCpuClient,
    diagnostics: Arc<dyn Diagnostics>,
    shape: ResponseShape,
    session: SessionLock<()>,
    running: AtomicBool,
    target: Mutex<Target>,
}

impl Coordinator {
    pub fn new(client: OpenCpuClient, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            client,
            diagnostics,
            shape: ResponseShape::default(),
            session: SessionLock::new(()),
            running: AtomicBool::new(false),
            target: Mutex::new(Target::default()),
        }
    }

    pub fn from_config(cfg: &Config, diagnostics: Arc<dyn Diagnostics>) -> Result<Self> {
        let client = OpenCpuClient::from_config(cfg)?;
        let shape = cfg
            .response_shape()
            .map_err(BridgeError::Config)?;
        Ok(Self::new(client, diagnostics).with_response_shape(shape))
    }

    pub fn with_response_shape(mut self, shape: ResponseShape) -> Self {
        self.shape = shape;
        self
    }

    fn target(&self) -> MutexGuard<'_, Target> {
        self.target.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Re-targets the next run. Never blocks on an in-flight run.
    pub fn configure(&self, script: impl Into<PathBuf>, inputs: Vec<Variable>, outputs: Vec<Variable>) {
        let mut target = self.target();
        target.script = Some(script.into());
        target.inputs = inputs;
        target.outputs = outputs;
        target.generation += 1;
    }

    pub fn outputs(&self) -> Vec<Variable> {
        self.target().outputs.clone()
    }

    /// Reads the running flag only; never contends with `run` for the session.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn diagnostic_output(&self) -> Option<String> {
        self.diagnostics.snapshot()
    }

    /// Executes the configured script remotely and fills the output variables.
    ///
    /// Fails with [`BridgeError::AlreadyRunning`] instead of waiting when a run is in flight.
    /// Outputs are only written when the whole chain succeeds. If `configure` was called while
    /// the run was in flight, the result is dropped and [`RunOutcome::Discarded`] is returned.
    pub async fn run(&self) -> Result<RunOutcome> {
        let _session = self.session.try_lock().map_err(|_| BridgeError::AlreadyRunning)?;
        let _running = RunningFlag::raise(&self.running);

        let (script, inputs, mut outputs, generation) = {
            let target = self.target();
            let script = target.script.clone().ok_or(BridgeError::NotConfigured)?;
            (script, target.inputs.clone(), target.outputs.clone(), target.generation)
        };
        tracing::info!(
            script = %script.display(),
            endpoint = self.client.endpoint(),
            inputs = inputs.len(),
            outputs = outputs.len(),
            "starting run"
        );
        self.diagnostics.clear();

        let source = self.read_script(&script)?;
        let args = marshal::marshal_inputs(&inputs)?;
        self.echo(&args);
        self.echo(&remote::form_preview(&source, &args));

        let result = self.client.call(&source, &args, self.shape).await?;
        self.echo(&textual(&result));

        unmarshal::bind_outputs(&result, &mut outputs, self.shape)?;

        let mut target = self.target();
        if target.generation == generation {
            target.outputs = outputs;
            tracing::info!("run finished");
            Ok(RunOutcome::Applied)
        } else {
            tracing::warn!("coordinator was re-configured during the run; results discarded");
            Ok(RunOutcome::Discarded)
        }
    }

    /// Reads the whole script, echoing each line. Lines are joined without a separator.
    fn read_script(&self, path: &Path) -> Result<String> {
        let text = fs::read_to_string(path).map_err(|source| BridgeError::SourceRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut joined = String::with_capacity(text.len());
        for line in text.lines() {
            self.echo(line);
            joined.push_str(line);
        }
        Ok(joined)
    }

    fn echo(&self, line: &str) {
        tracing::debug!(line, "echo");
        self.diagnostics.echo(line);
    }
}
