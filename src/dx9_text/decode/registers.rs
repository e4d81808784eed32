//! This module maps operand tokens to Cg expressions through the header's [SymbolTable].
//!

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use crate::{
    dx9_text::vector::{DisplaySwizzle, Swizzle, VectorComponent},
    ordered::OrderedMap,
};

use super::{
    error::DX9Error,
    grammar::{parse_literal, parse_operand, parse_register, RegisterName},
};

/// Dimensionality of a texture bound with `SetTexture`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    Tex2D,
    Tex3D,
    Cube,
}
impl TextureDimension {
    pub fn from_directive(dim: &str) -> Option<Self> {
        match dim {
            "2D" | "2d" => Some(Self::Tex2D),
            "3D" | "3d" => Some(Self::Tex3D),
            "CUBE" | "Cube" | "cube" => Some(Self::Cube),
            _ => None,
        }
    }
    pub fn sampler_type(&self) -> &'static str {
        match self {
            Self::Tex2D => "sampler2D",
            Self::Tex3D => "sampler3D",
            Self::Cube => "samplerCUBE",
        }
    }
    /// The sampling intrinsic and the coordinate cast it needs
    pub fn sample_fn(&self) -> (&'static str, &'static str) {
        match self {
            Self::Tex2D => ("tex2D", "float2"),
            Self::Tex3D => ("tex3D", "float3"),
            Self::Cube => ("texCUBE", "float3"),
        }
    }
}

/// The two numbered namespaces the header can bind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterKey {
    Constant(u32),
    Sampler(u32),
}
impl Display for RegisterKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant(n) => write!(f, "c{}", n),
            Self::Sampler(n) => write!(f, "s{}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    Constant(String),
    Sampler { name: String, dim: TextureDimension },
}
impl Symbol {
    pub fn expr(&self) -> &str {
        match self {
            Self::Constant(expr) => expr,
            Self::Sampler { name, .. } => name,
        }
    }
}

pub type SymbolTable = OrderedMap<RegisterKey, Symbol>;

/// An operand after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOperand {
    pub expr: String,
    pub swizzle: Option<Swizzle>,
    pub negate: bool,
    /// Set when the operand named a bound sampler
    pub sampler: Option<TextureDimension>,
}
impl Display for ResolvedOperand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.negate {
            write!(f, "-")?;
        }
        write!(f, "{}", self.expr)?;
        if let Some(swizzle) = &self.swizzle {
            write!(f, "{}", DisplaySwizzle(swizzle))?;
        }
        Ok(())
    }
}

/// Per-stage resolution state: the header's symbols plus whatever `def` has declared so far.
pub struct DX9Context<'a> {
    symbols: &'a SymbolTable,
    literal_consts: HashMap<String, [String; 4]>,
    max_temp: Option<u32>,
}

impl<'a> DX9Context<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        DX9Context {
            symbols,
            literal_consts: HashMap::new(),
            max_temp: None,
        }
    }

    /// Record a `def` target. From here on the register passes through by name.
    pub fn push_literal_const(&mut self, name: String, values: [String; 4]) {
        self.literal_consts.insert(name, values);
    }

    /// Highest `r#` seen so far
    pub fn max_temp(&self) -> Option<u32> {
        self.max_temp
    }

    pub fn resolve(&mut self, token: &str) -> Result<ResolvedOperand, DX9Error> {
        let (_, operand) = parse_operand(token)?;
        let register = parse_register(operand.register)
            .map(|(_, r)| r)
            .map_err(|_| DX9Error::UnknownOperand(token.to_owned()))?;

        let mut sampler = None;
        let expr = match register {
            RegisterName::Temp(idx) => {
                self.max_temp = Some(self.max_temp.map_or(idx, |m| m.max(idx)));
                operand.register.to_owned()
            }
            RegisterName::Input(_) | RegisterName::TexCoord(_) | RegisterName::Literal(_) => {
                operand.register.to_owned()
            }
            RegisterName::Constant(idx) => {
                if self.literal_consts.contains_key(operand.register) {
                    operand.register.to_owned()
                } else {
                    self.lookup(RegisterKey::Constant(idx))?.expr().to_owned()
                }
            }
            RegisterName::Sampler(idx) => match self.lookup(RegisterKey::Sampler(idx))? {
                Symbol::Sampler { name, dim } => {
                    sampler = Some(*dim);
                    name.clone()
                }
                Symbol::Constant(expr) => return Err(DX9Error::NotASampler(expr.clone())),
            },
            RegisterName::Output(name) => format!("o.{}", name.to_lowercase()),
        };

        Ok(ResolvedOperand {
            expr,
            swizzle: operand.swizzle,
            negate: operand.negate,
            sampler,
        })
    }

    fn lookup(&self, key: RegisterKey) -> Result<&'a Symbol, DX9Error> {
        self.symbols
            .get(&key)
            .ok_or_else(|| DX9Error::UnresolvedRegister(key.to_string()))
    }

    /// If the operand is a compile-time scalar, return it.
    ///
    /// That's either a plain literal, or a `def` register whose selected components all hold the same literal.
    pub fn literal_value(&self, operand: &ResolvedOperand) -> Option<f32> {
        let value = if let Ok(("", lit)) = parse_literal(&operand.expr) {
            lit.parse::<f32>().ok()?
        } else {
            let values = self.literal_consts.get(&operand.expr)?;
            let selected: Vec<&String> = match &operand.swizzle {
                Some(swizzle) => swizzle.iter().map(|c| &values[component_index(*c)]).collect(),
                None => values.iter().collect(),
            };
            let first = selected.first()?.parse::<f32>().ok()?;
            for v in &selected[1..] {
                if v.parse::<f32>().ok()? != first {
                    return None;
                }
            }
            first
        };
        Some(if operand.negate { -value } else { value })
    }
}

fn component_index(c: VectorComponent) -> usize {
    match c {
        VectorComponent::X => 0,
        VectorComponent::Y => 1,
        VectorComponent::Z => 2,
        VectorComponent::W => 3,
    }
}
