use phf::phf_map;

use crate::dx9_text::vector::VECTOR_COMPONENTS;

use super::{
    error::DX9Error,
    grammar::{parse_register, RegisterName},
    registers::{DX9Context, ResolvedOperand},
};

/// Opcodes that declare a register rather than compute into one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclOp {
    Position,
    Normal,
    TexCoord0,
    TexCoord1,
    Tangent,
    Color,
    /// Plain `dcl` of a pixel shader input (`t#` or `v#`)
    Input,
    /// `dcl_2d`/`dcl_cube`/`dcl_volume`. The binding itself comes from `SetTexture`.
    Sampler,
    /// `def c#, x, y, z, w`
    Def,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Mov,
    Add,
    Mul,
    Mad,
    Dp4,
    Dp3,
    Min,
    Max,
    Rsq,
    Frc,
    Slt,
    Sge,
    Rcp,
    Texld,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Decl(DeclOp),
    Arith(ArithOp),
}

static OPCODES: phf::Map<&'static str, Opcode> = phf_map! {
    "dcl_position" => Opcode::Decl(DeclOp::Position),
    "dcl_position0" => Opcode::Decl(DeclOp::Position),
    "dcl_normal" => Opcode::Decl(DeclOp::Normal),
    "dcl_normal0" => Opcode::Decl(DeclOp::Normal),
    "dcl_texcoord" => Opcode::Decl(DeclOp::TexCoord0),
    "dcl_texcoord0" => Opcode::Decl(DeclOp::TexCoord0),
    "dcl_texcoord1" => Opcode::Decl(DeclOp::TexCoord1),
    "dcl_tangent" => Opcode::Decl(DeclOp::Tangent),
    "dcl_tangent0" => Opcode::Decl(DeclOp::Tangent),
    "dcl_color" => Opcode::Decl(DeclOp::Color),
    "dcl_color0" => Opcode::Decl(DeclOp::Color),
    "dcl" => Opcode::Decl(DeclOp::Input),
    "dcl_2d" => Opcode::Decl(DeclOp::Sampler),
    "dcl_cube" => Opcode::Decl(DeclOp::Sampler),
    "dcl_volume" => Opcode::Decl(DeclOp::Sampler),
    "def" => Opcode::Decl(DeclOp::Def),

    "mov" => Opcode::Arith(ArithOp::Mov),
    "add" => Opcode::Arith(ArithOp::Add),
    "mul" => Opcode::Arith(ArithOp::Mul),
    "mad" => Opcode::Arith(ArithOp::Mad),
    "dp4" => Opcode::Arith(ArithOp::Dp4),
    "dp3" => Opcode::Arith(ArithOp::Dp3),
    "min" => Opcode::Arith(ArithOp::Min),
    "max" => Opcode::Arith(ArithOp::Max),
    "rsq" => Opcode::Arith(ArithOp::Rsq),
    "frc" => Opcode::Arith(ArithOp::Frc),
    "slt" => Opcode::Arith(ArithOp::Slt),
    "sge" => Opcode::Arith(ArithOp::Sge),
    "rcp" => Opcode::Arith(ArithOp::Rcp),
    "texld" => Opcode::Arith(ArithOp::Texld),
};

/// Partial precision only matters to the d3d9 hardware, Cg doesn't care
const PARTIAL_PRECISION_SUFFIX: &str = "_pp";

/// Look up an opcode, ignoring any `_pp` suffix. Returns the canonical name alongside it.
pub fn lookup_opcode(raw: &str) -> Result<(&'static str, Opcode), DX9Error> {
    let name = raw.strip_suffix(PARTIAL_PRECISION_SUFFIX).unwrap_or(raw);
    OPCODES
        .get_entry(name)
        .map(|(name, op)| (*name, *op))
        .ok_or_else(|| DX9Error::UnknownOpcode(raw.to_owned()))
}

impl Opcode {
    /// Total operand count including the destination
    pub fn n_operands(&self) -> usize {
        match self {
            Self::Decl(DeclOp::Def) => 5,
            Self::Decl(_) => 1,
            Self::Arith(op) => 1 + op.n_srcs(),
        }
    }
}

impl DeclOp {
    /// Expand into the statement this declares. Sampler declarations only check the binding exists.
    pub fn render(&self, operands: &[ResolvedOperand]) -> Result<Option<String>, DX9Error> {
        let dst = &operands[0];
        let name = &dst.expr;
        let line = match self {
            Self::Position => format!("float4 {} = vardat.vertex;", name),
            Self::Normal => format!(
                "float4 {} = float4(vardat.normal.x, vardat.normal.y, vardat.normal.z, 0);",
                name
            ),
            Self::TexCoord0 => format!("float4 {} = vardat.texcoord;", name),
            Self::TexCoord1 => format!("float4 {} = vardat.texcoord1;", name),
            Self::Tangent => format!("float4 {} = vardat.tangent;", name),
            Self::Color => format!("float4 {} = vardat.color;", name),
            Self::Input => match parse_register(name) {
                Ok((_, RegisterName::TexCoord(i))) => format!("float4 t{0} = i.t{0};", i),
                Ok((_, RegisterName::Input(i))) => format!("float4 v{0} = i.d{0};", i),
                _ => return Err(DX9Error::UnknownOperand(dst.to_string())),
            },
            Self::Sampler => {
                return match dst.sampler {
                    Some(_) => Ok(None),
                    None => Err(DX9Error::NotASampler(dst.to_string())),
                }
            }
            Self::Def => format!(
                "const float4 {} = float4({}, {}, {}, {});",
                name, operands[1], operands[2], operands[3], operands[4]
            ),
        };
        Ok(Some(line))
    }
}

impl ArithOp {
    pub fn n_srcs(&self) -> usize {
        match self {
            Self::Mov | Self::Rsq | Self::Frc | Self::Rcp => 1,
            Self::Add
            | Self::Mul
            | Self::Dp4
            | Self::Dp3
            | Self::Min
            | Self::Max
            | Self::Slt
            | Self::Sge
            | Self::Texld => 2,
            Self::Mad => 3,
        }
    }

    /// Fill in the statement template, writing the full result to `dst`.
    pub fn render(
        &self,
        dst: &str,
        srcs: &[ResolvedOperand],
        ctx: &DX9Context,
    ) -> Result<String, DX9Error> {
        let line = match self {
            Self::Mov => format!("{} = {};", dst, srcs[0]),
            Self::Add => format!("{} = {} + {};", dst, srcs[0], srcs[1]),
            Self::Mul => format!("{} = {} * {};", dst, srcs[0], srcs[1]),
            Self::Mad => format!("{} = {} * {} + {};", dst, srcs[0], srcs[1], srcs[2]),
            Self::Dp4 => format!("{} = dot((float4){}, (float4){});", dst, srcs[0], srcs[1]),
            Self::Dp3 => format!("{} = dot((float3){}, (float3){});", dst, srcs[0], srcs[1]),
            Self::Min => format!("{} = min({}, {});", dst, srcs[0], srcs[1]),
            Self::Max => format!("{} = max({}, {});", dst, srcs[0], srcs[1]),
            Self::Rsq => format!("{} = rsqrt({});", dst, srcs[0]),
            Self::Frc => {
                let a = &srcs[0];
                let comps: Vec<String> = VECTOR_COMPONENTS
                    .iter()
                    .map(|c| format!("{0}.{1} - (float)floor({0}.{1})", a, c))
                    .collect();
                format!("{} = float4({});", dst, comps.join(", "))
            }
            Self::Slt => compare(dst, "<", &srcs[0], &srcs[1]),
            Self::Sge => compare(dst, ">=", &srcs[0], &srcs[1]),
            Self::Rcp => {
                let a = &srcs[0];
                match ctx.literal_value(a) {
                    Some(v) if v == 0.0 => format!("{} = FLT_MAX;", dst),
                    Some(v) if v == 1.0 => format!("{} = {};", dst, a),
                    Some(_) => format!("{} = (1 / {});", dst, a),
                    None => format!(
                        "{0} = ({1} == 0.0f) ? FLT_MAX : (({1} == 1.0f) ? {1} : (1 / {1}));",
                        dst, a
                    ),
                }
            }
            Self::Texld => {
                let (coord, sampler) = (&srcs[0], &srcs[1]);
                let dim = sampler
                    .sampler
                    .ok_or_else(|| DX9Error::NotASampler(sampler.to_string()))?;
                let (func, cast) = dim.sample_fn();
                format!("{} = {}({}, ({}){});", dst, func, sampler, cast, coord)
            }
        };
        Ok(line)
    }
}

/// Componentwise compare producing 1.0/0.0
fn compare(dst: &str, op: &str, a: &ResolvedOperand, b: &ResolvedOperand) -> String {
    let comps: Vec<String> = VECTOR_COMPONENTS
        .iter()
        .map(|c| format!("({0}.{2} {1} {3}.{2}) ? 1.0f : 0.0f", a, op, c, b))
        .collect();
    format!("{} = float4({});", dst, comps.join(", "))
}
