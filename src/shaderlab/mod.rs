//! Compiled ShaderLab containers: finding the d3d9 program blocks and splicing Cg back in.

pub mod locate;
pub mod splice;

pub use locate::{locate_program, ProgramBlock, ProgramSection, SubprogramBlock};
pub use splice::{indent, splice, translate_program, Spliced};

use std::{fs, io, path::Path};

use thiserror::Error;
use tracing::debug;

use crate::{config::TranspileConfig, dx9_text::DX9ErrorContext};

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Translate(#[from] DX9ErrorContext),
}

/// Read `input`, splice it, and write the result to `output` if anything changed.
///
/// Returns whether `output` was written.
pub fn process_file(input: &Path, output: &Path, config: &TranspileConfig) -> Result<bool, ProcessError> {
    let text = fs::read_to_string(input)?;
    let spliced = splice(&text, config)?;
    if !spliced.changed || spliced.text == text {
        debug!(input = %input.display(), "unchanged");
        return Ok(false);
    }
    fs::write(output, spliced.text)?;
    debug!(input = %input.display(), output = %output.display(), "written");
    Ok(true)
}
