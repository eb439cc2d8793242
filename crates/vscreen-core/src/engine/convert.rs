use super::error::EngineError;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// What an external conversion produced besides its output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutput {
    pub success: bool,
    /// Everything the converter wrote to its diagnostic stream.
    pub diagnostics: String,
}

/// Converts one structure file into another format.
///
/// An `Err` means the converter could not be run at all; a conversion that ran and
/// complained is an `Ok` whose diagnostics the caller inspects.
pub trait PoseConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<ConversionOutput, EngineError>;
}

/// Runs Open Babel as `obabel <input> -O <output>`; the output format follows the output
/// file extension.
#[derive(Debug, Clone)]
pub struct ObabelConverter {
    executable: PathBuf,
}

impl ObabelConverter {
    pub fn new<P: AsRef<Path>>(executable: P) -> Self {
        Self {
            executable: executable.as_ref().to_path_buf(),
        }
    }

    fn command(&self, input: &Path, output: &Path) -> Command {
        let mut command = Command::new(&self.executable);
        command
            .arg(input)
            .arg("-O")
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        command
    }
}

impl PoseConverter for ObabelConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<ConversionOutput, EngineError> {
        debug!("Converting {:?} -> {:?}", input, output);
        run_conversion(self.command(input, output), &self.executable)
    }
}

fn run_conversion(mut command: Command, program: &Path) -> Result<ConversionOutput, EngineError> {
    let result = command.output().map_err(|e| EngineError::Converter {
        program: program.to_path_buf(),
        source: e,
    })?;

    Ok(ConversionOutput {
        success: result.status.success(),
        diagnostics: String::from_utf8_lossy(&result.stderr).into_owned(),
    })
}
