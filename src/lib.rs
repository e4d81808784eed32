//! Translation of the Direct3D 9 shader assembly embedded in compiled Unity ShaderLab files into Cg.
//!
//! Compiled shaders carry one low-level subprogram per graphics API. This crate finds the
//! `SubProgram "d3d9 "` blocks, decodes their header directives and instructions, and splices a
//! `CGPROGRAM ... ENDCG` block back into the container in their place.
//!
//! The pipeline is split into:
//! - [shaderlab::locate] - finds program sections and their subprograms by brace matching
//! - [dx9_text::decode::header] - turns directives into a symbol table and side tables
//! - [dx9_text::decode] - decodes instructions into Cg statements
//! - [cg] - assembles the statements and side tables into a Cg program
//! - [shaderlab::splice] - replaces each program section with the result
//!
//! Most callers only need [shaderlab::splice] or [shaderlab::process_file].

pub mod cg;
pub mod config;
pub mod dx9_text;
pub mod ordered;
pub mod shaderlab;

pub use config::TranspileConfig;
pub use dx9_text::{DX9Error, DX9ErrorContext, DX9ErrorKind};
pub use shaderlab::{process_file, splice, ProcessError, Spliced};
