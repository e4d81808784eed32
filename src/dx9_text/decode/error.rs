use std::num::ParseIntError;

use nom::{error::{ParseError, ErrorKind}, IResult};
use thiserror::Error;

pub type NomGrammarResult<'a, T> = IResult<&'a str, T, GrammarError<&'a str>>;

#[derive(Debug, Error)]
pub enum GrammarError<I> {
    #[error("Internal Nom error: {1:?}")]
    Nom(I, ErrorKind),
    #[error("d3d9 semantic error: {0}")]
    DX9(#[from] DX9Error)
}
impl<I> ParseError<I> for GrammarError<I> {
    fn from_error_kind(input: I, kind: ErrorKind) -> Self {
        GrammarError::Nom(input, kind)
    }

    fn append(_: I, _: ErrorKind, other: Self) -> Self {
        other
    }
}

/// The classes of failure a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DX9ErrorKind {
    MalformedContainer,
    UnsupportedShadingStage,
    UnknownOpcode,
    UnknownOperand,
    UnresolvedRegister,
    UnrecognizedGlobalState,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DX9Error {
    #[error("Block at {0} has no closing bracket")]
    NoClosingBracket(usize),
    #[error("Program at {0} has no #LINE marker")]
    NoLineMarker(usize),
    #[error("Program at {0} has no d3d9 subprogram")]
    NoSubprogram(usize),
    #[error("Malformed directive '{0}'")]
    BadDirective(String),
    #[error("Unsupported texture type '{dim}' bound to sampler {slot}")]
    UnsupportedTexture { slot: u32, dim: String },
    #[error("Error parsing integer: {0}")]
    ParseIntError(ParseIntError),
    #[error("Couldn't parse '{0}'")]
    Syntax(String),
    #[error("Unsupported shader type: {0}")]
    UnsupportedShaderType(String),
    #[error("Unknown code {0}")]
    UnknownOpcode(String),
    #[error("Unknown arg {0}")]
    UnknownOperand(String),
    #[error("'{opcode}' takes {expected} operands, got {actual}")]
    OperandCount { opcode: &'static str, expected: usize, actual: usize },
    #[error("'{0}' is not a sampler")]
    NotASampler(String),
    #[error("Register {0} was never bound by the header")]
    UnresolvedRegister(String),
    #[error("Unrecognized glstate: {0}")]
    UnrecognizedGlobalState(String),
}
impl DX9Error {
    pub fn kind(&self) -> DX9ErrorKind {
        match self {
            Self::NoClosingBracket(_)
            | Self::NoLineMarker(_)
            | Self::NoSubprogram(_)
            | Self::BadDirective(_)
            | Self::UnsupportedTexture { .. }
            | Self::ParseIntError(_)
            | Self::Syntax(_) => DX9ErrorKind::MalformedContainer,
            Self::UnsupportedShaderType(_) => DX9ErrorKind::UnsupportedShadingStage,
            Self::UnknownOpcode(_) => DX9ErrorKind::UnknownOpcode,
            Self::UnknownOperand(_)
            | Self::OperandCount { .. }
            | Self::NotASampler(_) => DX9ErrorKind::UnknownOperand,
            Self::UnresolvedRegister(_) => DX9ErrorKind::UnresolvedRegister,
            Self::UnrecognizedGlobalState(_) => DX9ErrorKind::UnrecognizedGlobalState,
        }
    }

    /// Byte offset into the container, for errors raised while locating blocks
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::NoClosingBracket(at) | Self::NoLineMarker(at) | Self::NoSubprogram(at) => Some(*at),
            _ => None,
        }
    }
}
impl<'a> From<nom::Err<GrammarError<&'a str>>> for DX9Error {
    fn from(value: nom::Err<GrammarError<&'a str>>) -> Self {
        match value {
            nom::Err::Incomplete(_) => DX9Error::Syntax("<incomplete>".to_owned()),
            nom::Err::Error(e) | nom::Err::Failure(e) => match e {
                GrammarError::Nom(input, _) => DX9Error::Syntax(input.to_owned()),
                GrammarError::DX9(a) => a,
            }
        }
    }
}
impl<I> From<DX9Error> for nom::Err<GrammarError<I>> {
    fn from(value: DX9Error) -> Self {
        nom::Err::Error(GrammarError::DX9(value))
    }
}

/// A [DX9Error] together with the source line (or token) that caused it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{err} (at '{line}')")]
pub struct DX9ErrorContext {
    pub line: String,
    #[source]
    pub err: DX9Error,
}
impl DX9ErrorContext {
    pub fn new(line: &str, err: DX9Error) -> Self {
        Self {
            line: line.trim().to_owned(),
            err,
        }
    }
    pub fn kind(&self) -> DX9ErrorKind {
        self.err.kind()
    }
}
