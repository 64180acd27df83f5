//! Tool execution
//!
//! A [`Command`] runs either through an in-process [`ToolProvider`] registered
//! under the command's name, or as an external process. Output of both paths
//! is forwarded line by line to caller-supplied sinks.
//!
//! For external processes two drain threads read standard output and standard
//! error while the caller waits for the process. Both drains are joined
//! before the exit code is reported, so no trailing output is lost.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::thread;

use tracing::{debug, error, info};

use crate::core::command::Command;
use crate::error::ToolError;
use crate::infra::tree;

/// Consumer of complete output lines, callable from any thread
pub type LineSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Create a sink from a closure
pub fn sink(f: impl Fn(&str) + Send + Sync + 'static) -> LineSink {
    Arc::new(f)
}

/// In-process implementation of a named tool
pub trait ToolProvider: Send + Sync {
    /// Name the provider is registered under
    fn name(&self) -> &str;

    /// Run the tool and return its exit code
    fn run(&self, out: &mut dyn Write, err: &mut dyn Write, args: &[String]) -> anyhow::Result<i32>;
}

/// Writer forwarding every completed line to a [`LineSink`]
///
/// A trailing partial line is forwarded on flush and on drop.
pub struct LineWriter {
    sink: LineSink,
    buffer: Vec<u8>,
}

impl LineWriter {
    /// Create a writer forwarding to `sink`
    pub fn new(sink: LineSink) -> Self {
        Self {
            sink,
            buffer: Vec::new(),
        }
    }

    fn emit(&mut self, end: usize) {
        let line: Vec<u8> = self.buffer.drain(..end).collect();
        (self.sink)(trim_line_end(&String::from_utf8_lossy(&line)));
    }
}

impl Write for LineWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        while let Some(index) = self.buffer.iter().position(|b| *b == b'\n') {
            self.emit(index + 1);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            let end = self.buffer.len();
            self.emit(end);
        }
        Ok(())
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

fn trim_line_end(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Registry of in-process tool providers, looked up by name
#[derive(Clone, Default)]
pub struct ToolRegistry {
    providers: BTreeMap<String, Arc<dyn ToolProvider>>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in providers
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(TreeTool);
        registry
    }

    /// Register a provider, replacing any provider of the same name
    pub fn register(&mut self, provider: impl ToolProvider + 'static) -> &mut Self {
        self.providers
            .insert(provider.name().to_string(), Arc::new(provider));
        self
    }

    /// Find the provider registered under `name`
    pub fn find(&self, name: &str) -> Option<Arc<dyn ToolProvider>> {
        self.providers.get(name).cloned()
    }

    /// Names of all registered providers
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }
}

/// Dispatches commands to in-process providers or external processes
#[derive(Debug, Clone, Default)]
pub struct ToolRunner {
    registry: ToolRegistry,
}

impl ToolRunner {
    /// Create a runner over the given registry
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    /// Registry consulted before spawning processes
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Mutable registry, for registering additional providers
    pub fn registry_mut(&mut self) -> &mut ToolRegistry {
        &mut self.registry
    }

    /// Run the command and return its exit code
    ///
    /// Failures to start a process or a failing provider are logged and
    /// reported as exit code 1.
    pub fn execute(&self, command: &Command, out: &LineSink, err: &LineSink) -> i32 {
        info!(
            "Running tool: {} {}",
            command.name(),
            command.arguments().join(" ")
        );
        let result = match self.registry.find(command.name()) {
            Some(provider) => run_provider(provider.as_ref(), command, out, err),
            None => run_process(command, out, err),
        };
        match result {
            Ok(code) => code,
            Err(e) => {
                error!("Running tool failed: {e}");
                1
            }
        }
    }
}

fn run_provider(
    provider: &dyn ToolProvider,
    command: &Command,
    out: &LineSink,
    err: &LineSink,
) -> Result<i32, ToolError> {
    debug!("Using in-process provider for {}", command.name());
    let mut out = LineWriter::new(Arc::clone(out));
    let mut err = LineWriter::new(Arc::clone(err));
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        provider.run(&mut out, &mut err, command.arguments())
    }));
    let _ = out.flush();
    let _ = err.flush();
    match result {
        Ok(result) => result.map_err(|e| ToolError::Provider {
            tool: command.name().to_string(),
            error: format!("{e:#}"),
        }),
        Err(payload) => Err(ToolError::Provider {
            tool: command.name().to_string(),
            error: format!("panicked: {}", panic_message(payload.as_ref())),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

fn run_process(command: &Command, out: &LineSink, err: &LineSink) -> Result<i32, ToolError> {
    let tool = command.name().to_string();
    let mut child = std::process::Command::new(command.name())
        .args(command.arguments())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ToolError::Spawn {
            tool: tool.clone(),
            error: e.to_string(),
        })?;
    debug!("Spawned {tool} as process {}", child.id());

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ToolError::MissingPipe { tool: tool.clone() })?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ToolError::MissingPipe { tool: tool.clone() })?;

    let status = thread::scope(|scope| {
        let stdout_drain = scope.spawn(|| drain(stdout, out));
        let stderr_drain = scope.spawn(|| drain(stderr, err));
        let status = child.wait();
        for handle in [stdout_drain, stderr_drain] {
            if handle.join().is_err() {
                error!("Output drain of {tool} panicked");
            }
        }
        status
    })
    .map_err(|e| ToolError::Wait {
        tool: tool.clone(),
        error: e.to_string(),
    })?;

    let code = status.code().unwrap_or_else(|| {
        debug!("{tool} terminated without exit code: {status}");
        1
    });
    debug!("{tool} exited with code {code}");
    Ok(code)
}

/// Forward every line of `stream` to `sink` until end of stream
///
/// Read faults end the drain quietly.
fn drain(stream: impl Read, sink: &LineSink) {
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => sink(trim_line_end(&String::from_utf8_lossy(&line))),
        }
    }
}

/// Built-in `tree` tool printing the tree walk of each argument
#[derive(Debug, Clone, Copy)]
pub struct TreeTool;

impl ToolProvider for TreeTool {
    fn name(&self) -> &str {
        "tree"
    }

    fn run(&self, out: &mut dyn Write, err: &mut dyn Write, args: &[String]) -> anyhow::Result<i32> {
        if args.is_empty() {
            writeln!(err, "Usage: tree <directory>...")?;
            return Ok(1);
        }
        for arg in args {
            let mut lines = Vec::new();
            if let Err(e) = tree::walk(Path::new(arg), |line| lines.push(line.to_string())) {
                writeln!(err, "{e}")?;
                return Ok(1);
            }
            for line in lines {
                writeln!(out, "{line}")?;
            }
        }
        Ok(0)
    }
}
