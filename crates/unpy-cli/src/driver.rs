//! Read a stub, backport it, and write the result or a diff.

use anyhow::{Context, Result, anyhow, bail};
use std::io::{IsTerminal, Read, Write};
use std::path::Path;
use tracing::{debug, info_span};

use crate::args::{CliArgs, is_stdio};
use crate::reporter::Reporter;
use unpy::{PythonVersion, transform_source};

/// Display name for stdin in messages and diff headers.
pub const STDIN_NAME: &str = "<stdin>";

const STUB_EXTENSIONS: [&str; 2] = ["pyi", "py"];

/// Run the CLI with parsed arguments. `color` enables ANSI styling.
pub fn run(args: &CliArgs, color: bool) -> Result<()> {
    let shown = display_name(&args.source);
    let _span = info_span!("run", source = %shown, target = ?args.target).entered();

    let source = if args.reads_stdin() {
        read_stdin(std::io::stdin().is_terminal())?
    } else {
        check_source_path(&args.source)?;
        std::fs::read_to_string(&args.source)
            .with_context(|| format!("failed to read {}", args.source.display()))?
    };

    let reporter = Reporter::new(color);
    let output = backport(&reporter, &shown, &source, args.target.to_python_version())?;

    if args.diff {
        let diff = reporter.render_diff(&shown, &source, &output);
        return write_stdout(&diff);
    }
    if args.writes_stdout() {
        return write_stdout(&output);
    }
    std::fs::write(&args.output, &output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    debug!(output = %args.output.display(), bytes = output.len(), "wrote output");
    Ok(())
}

/// Backport `source`, turning a stub error into a located message.
pub fn backport(
    reporter: &Reporter,
    display: &str,
    source: &str,
    target: PythonVersion,
) -> Result<String> {
    transform_source(source, target)
        .map_err(|err| anyhow!(reporter.format_error(display, source, &err)))
}

/// Only `.pyi` (and `.py`) files are accepted.
pub fn check_source_path(path: &Path) -> Result<()> {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    if !STUB_EXTENSIONS.contains(&extension) {
        bail!("{}: expected a .pyi or .py file", path.display());
    }
    if !path.is_file() {
        bail!("{}: no such file", path.display());
    }
    Ok(())
}

pub fn read_stdin(is_terminal: bool) -> Result<String> {
    if is_terminal {
        bail!("refusing to read a stub from an interactive terminal, pipe it into stdin instead");
    }
    let mut source = String::new();
    std::io::stdin()
        .lock()
        .read_to_string(&mut source)
        .context("failed to read stdin")?;
    Ok(source)
}

pub fn display_name(path: &Path) -> String {
    if is_stdio(path) {
        STDIN_NAME.to_string()
    } else {
        path.display().to_string()
    }
}

fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|()| stdout.flush())
        .context("failed to write to stdout")
}
