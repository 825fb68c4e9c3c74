use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

use unpy::PythonVersion;

/// Path that stands for stdin (as the source) or stdout (as the output).
pub const STDIO_PATH: &str = "-";

/// CLI arguments for the unpy binary.
#[derive(Parser, Debug)]
#[command(
    name = "unpy",
    version,
    about = "Backport Python 3.12+ stub syntax to older Python versions"
)]
pub struct CliArgs {
    /// The `.pyi` stub to transform, or `-` to read from stdin.
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Where to write the result, `-` for stdout.
    #[arg(value_name = "OUTPUT", default_value = STDIO_PATH)]
    pub output: PathBuf,

    /// The minimum Python version the output must support.
    #[arg(short = 't', long, value_enum, default_value_t = Target::Py310)]
    pub target: Target,

    /// Print a unified diff of the changes instead of the transformed stub.
    #[arg(long)]
    pub diff: bool,
}

impl CliArgs {
    pub fn reads_stdin(&self) -> bool {
        is_stdio(&self.source)
    }

    pub fn writes_stdout(&self) -> bool {
        is_stdio(&self.output)
    }
}

pub fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == STDIO_PATH
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Target {
    #[value(name = "3.10", alias = "py310")]
    Py310,
    #[value(name = "3.11", alias = "py311")]
    Py311,
    #[value(name = "3.12", alias = "py312")]
    Py312,
    #[value(name = "3.13", alias = "py313")]
    Py313,
    #[value(name = "3.14", alias = "py314")]
    Py314,
}

impl Target {
    pub fn to_python_version(self) -> PythonVersion {
        match self {
            Target::Py310 => PythonVersion::Py310,
            Target::Py311 => PythonVersion::Py311,
            Target::Py312 => PythonVersion::Py312,
            Target::Py313 => PythonVersion::Py313,
            Target::Py314 => PythonVersion::Py314,
        }
    }
}
