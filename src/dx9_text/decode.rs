pub mod error;
pub mod grammar;
pub mod header;
pub mod ops;
pub mod registers;
pub use error::{DX9Error, DX9ErrorContext, DX9ErrorKind};

use std::fmt::{Display, Formatter};

use phf::phf_map;
use tracing::trace;

use crate::dx9_text::vector::{full_mask, VectorComponent};

use self::{
    grammar::{parse_instruction, parse_operand},
    ops::{lookup_opcode, ArithOp, DeclOp, Opcode},
    registers::{DX9Context, ResolvedOperand, SymbolTable},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}
impl ShaderStage {
    /// The scalar output that is written directly instead of through the scratch register
    pub fn fog_output(&self) -> Option<&'static str> {
        match self {
            Self::Vertex => Some("o.fog"),
            Self::Fragment => None,
        }
    }
}
impl Display for ShaderStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

static SHADER_STAGES: phf::Map<&'static str, ShaderStage> = phf_map! {
    "vs_1_1" => ShaderStage::Vertex,
    "vs_2_0" => ShaderStage::Vertex,
    "ps_2_0" => ShaderStage::Fragment,
};

/// Name of the per-function scratch register masked writes go through
pub const SCRATCH: &str = "tmp";

/// Translated body of one shader stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutput {
    pub stage: ShaderStage,
    pub lines: Vec<String>,
    /// Highest `r#` the body references
    pub max_temp: Option<u32>,
}

/// Decode the quoted instruction stream left over after [header::parse_header].
///
/// The first non-empty line is `"<shader version>`, the stream ends at a line that is just `"`
/// (or at a line the closing quote is glued to).
pub fn decode_stage(lines: &[&str], symbols: &SymbolTable) -> Result<StageOutput, DX9ErrorContext> {
    let stage = detect_stage(lines)?;
    let lines = lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty()).skip(1);

    let mut ctx = DX9Context::new(symbols);
    let mut translated = vec![];
    for line in lines {
        if line == "\"" {
            break;
        }
        let (line, last) = match line.strip_suffix('"') {
            Some(line) => (line.trim_end(), true),
            None => (line, false),
        };

        if line.starts_with("//") {
            translated.push(line.to_owned());
        } else if line.starts_with(';') {
            translated.push(format!("// {}", line));
        } else if !line.is_empty() {
            let disasm = decode_instruction(&mut ctx, stage, line)
                .map_err(|err| DX9ErrorContext::new(line, err))?;
            trace!(instruction = line, n_lines = disasm.len(), "decoded");
            translated.push(format!("// {}", line));
            translated.extend(disasm);
        }

        if last {
            break;
        }
    }

    Ok(StageOutput {
        stage,
        lines: translated,
        max_temp: ctx.max_temp(),
    })
}

/// The stage named by the `"<shader version>` line that opens the instruction stream
pub fn detect_stage(lines: &[&str]) -> Result<ShaderStage, DX9ErrorContext> {
    let version_line = lines.iter().map(|l| l.trim()).find(|l| !l.is_empty()).unwrap_or("");
    let version = version_line.strip_prefix('"').unwrap_or(version_line);
    SHADER_STAGES.get(version).copied().ok_or_else(|| {
        DX9ErrorContext::new(version_line, DX9Error::UnsupportedShaderType(version.to_owned()))
    })
}

fn decode_instruction(
    ctx: &mut DX9Context,
    stage: ShaderStage,
    line: &str,
) -> Result<Vec<String>, DX9Error> {
    let (_, instr) = parse_instruction(line)?;
    let (name, opcode) = lookup_opcode(&instr.opcode)?;

    if instr.operands.len() != opcode.n_operands() {
        return Err(DX9Error::OperandCount {
            opcode: name,
            expected: opcode.n_operands(),
            actual: instr.operands.len(),
        });
    }

    // def targets have to be known before resolution, or they'd be looked up in the header
    if let Opcode::Decl(DeclOp::Def) = opcode {
        let (_, target) = parse_operand(&instr.operands[0])?;
        let values = [
            instr.operands[1].clone(),
            instr.operands[2].clone(),
            instr.operands[3].clone(),
            instr.operands[4].clone(),
        ];
        ctx.push_literal_const(target.register.to_owned(), values);
    }

    let operands = instr
        .operands
        .iter()
        .map(|o| ctx.resolve(o))
        .collect::<Result<Vec<ResolvedOperand>, _>>()?;

    match opcode {
        Opcode::Decl(decl) => Ok(decl.render(&operands)?.into_iter().collect()),
        Opcode::Arith(op) => expand_masked_write(ctx, stage, op, &operands),
    }
}

/// Evaluate into the scratch register, then copy out each masked component.
fn expand_masked_write(
    ctx: &DX9Context,
    stage: ShaderStage,
    op: ArithOp,
    operands: &[ResolvedOperand],
) -> Result<Vec<String>, DX9Error> {
    let (dst, srcs) = match operands.split_first() {
        Some(split) => split,
        None => return Err(DX9Error::UnknownOperand("<missing destination>".to_owned())),
    };
    if dst.negate {
        return Err(DX9Error::UnknownOperand(dst.to_string()));
    }

    if let Some(fog) = stage.fog_output() {
        if dst.expr == fog {
            return Ok(vec![op.render(fog, srcs, ctx)?]);
        }
    }

    let mask = dst.swizzle.clone().unwrap_or_else(full_mask);
    let mut lines = Vec::with_capacity(1 + mask.len());
    lines.push(op.render(SCRATCH, srcs, ctx)?);
    lines.extend(mask.iter().map(|c: &VectorComponent| {
        format!("{}.{} = {}.{};", dst.expr, c, SCRATCH, c)
    }));
    Ok(lines)
}
