//! Direct3D 9 shader assembly as found inside compiled ShaderLab `SubProgram "d3d9 "` blocks.
//!
//! A subprogram is a run of header directives followed by a quoted instruction stream:
//!
//! ```text
//! Bind "vertex" Vertex
//! Matrix 0 [glstate_matrix_mvp]
//! "vs_1_1
//! dcl_position v0
//! dp4 oPos.x, v0, c0
//! "
//! ```
//!
//! [decode_subprogram] resolves the header into a symbol table, then decodes each instruction
//! into Cg statements against it.

pub mod decode;
pub mod vector;

pub use decode::{DX9Error, DX9ErrorContext, DX9ErrorKind, ShaderStage, StageOutput};

use crate::config::TranspileConfig;

use self::decode::header::{parse_header, Header};

/// A fully decoded subprogram: its header side tables and its translated body.
#[derive(Debug, Clone)]
pub struct DecodedSubprogram {
    pub header: Header,
    pub stage: StageOutput,
}

/// A subprogram whose header has been interpreted but whose instructions haven't been decoded yet.
#[derive(Debug, Clone)]
pub struct SubprogramHeader<'a> {
    pub header: Header,
    pub stage: ShaderStage,
    remaining: Vec<&'a str>,
}
impl<'a> SubprogramHeader<'a> {
    pub fn decode(self) -> Result<DecodedSubprogram, DX9ErrorContext> {
        let stage = decode::decode_stage(&self.remaining, &self.header.symbols)?;
        Ok(DecodedSubprogram {
            header: self.header,
            stage,
        })
    }
}

/// Interpret the directives of a subprogram body and find out which stage it is for.
pub fn read_subprogram<'a>(body: &'a str, config: &TranspileConfig) -> Result<SubprogramHeader<'a>, DX9ErrorContext> {
    let lines: Vec<&str> = body.lines().collect();
    let (header, remaining) = parse_header(&lines, config)?;
    let stage = decode::detect_stage(&remaining)?;
    Ok(SubprogramHeader {
        header,
        stage,
        remaining,
    })
}

/// Decode the inner lines of a subprogram (without the `SubProgram "d3d9 " {` line and the closing `}`).
pub fn decode_subprogram(body: &str, config: &TranspileConfig) -> Result<DecodedSubprogram, DX9ErrorContext> {
    read_subprogram(body, config)?.decode()
}
