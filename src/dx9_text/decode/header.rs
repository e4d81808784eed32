//! Directive lines at the top of a d3d9 subprogram.
//!
//! ```text
//! Keywords { "POINT" }
//! Bind "vertex" Vertex
//! Matrix 0 [glstate_matrix_mvp]
//! Local 4, ([_Offset],[_Scale],0,1)
//! SetTexture 0 [_MainTex] 2D
//! ```
//!
//! Each directive is consumed here and turned into symbols (what `c#`/`s#` mean) and
//! side tables (globals to declare, channel bindings, keywords, lighting).
//! Everything else is left in place for the instruction decoder.

use phf::{phf_map, phf_set};
use tracing::trace;

use crate::{config::TranspileConfig, ordered::OrderedSet};

use super::{
    error::{DX9Error, DX9ErrorContext},
    grammar::{
        parse_constant_directive, parse_keywords, parse_light_state, parse_texture_directive,
        parse_texture_matrix_state, Component, ConstantValue,
    },
    registers::{RegisterKey, Symbol, SymbolTable, TextureDimension},
};

/// Built-ins Unity provides itself. Binding one of these must not re-declare it.
static RESERVED: phf::Set<&'static str> = phf_set! {
    "_Time",
    "_SinTime",
    "_CosTime",

    "_ProjectionParams",

    "_PPLAmbient",

    "_ObjectSpaceCameraPos",
    "_ObjectSpaceLightPos0",
    "_ModelLightColor0",
    "_SpecularLightColor0",

    "_Light2World0", "_World2Light0", "_Object2World", "_World2Object", "_Object2Light0",

    "_LightDirectionBias",
    "_LightPositionRange",
};

/// glstate matrices as (modern, legacy)
static MATRIX_STATES: phf::Map<&'static str, (&'static str, &'static str)> = phf_map! {
    "glstate_matrix_mvp" => ("UNITY_MATRIX_MVP", "glstate.matrix.mvp"),
    "glstate_matrix_modelview0" => ("UNITY_MATRIX_MV", "glstate.matrix.modelview[0]"),
    "glstate_matrix_transpose_modelview0" => ("UNITY_MATRIX_T_MV", "glstate.matrix.transpose.modelview[0]"),
    "glstate_matrix_invtrans_modelview0" => ("UNITY_MATRIX_IT_MV", "glstate.matrix.invtrans.modelview[0]"),
};

const GLSTATE_PREFIX: &str = "glstate";
const GLOBAL_PREFIX: char = '_';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstantKind {
    Vector,
    Matrix,
}
impl ConstantKind {
    fn cg_type(&self) -> &'static str {
        match self {
            Self::Vector => "float4",
            Self::Matrix => "float4x4",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectiveKind {
    Keywords,
    Bind,
    Constant(ConstantKind),
    SetTexture,
}

static DIRECTIVES: phf::Map<&'static str, DirectiveKind> = phf_map! {
    "Keywords" => DirectiveKind::Keywords,
    "Bind" => DirectiveKind::Bind,
    "Local" => DirectiveKind::Constant(ConstantKind::Vector),
    "Vector" => DirectiveKind::Constant(ConstantKind::Vector),
    "Matrix" => DirectiveKind::Constant(ConstantKind::Matrix),
    "SetTexture" => DirectiveKind::SetTexture,
};

/// Everything the directives of one subprogram declared
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub keywords: OrderedSet<String>,
    pub binds: OrderedSet<String>,
    pub symbols: SymbolTable,
    pub declarations: OrderedSet<String>,
    pub lighting: bool,
}

/// Interpret and strip the directive lines, returning the header and the lines left over.
pub fn parse_header<'a>(
    lines: &[&'a str],
    config: &TranspileConfig,
) -> Result<(Header, Vec<&'a str>), DX9ErrorContext> {
    let mut header = Header::default();
    let mut remaining = vec![];

    for &line in lines {
        let trimmed = line.trim();
        let keyword = trimmed.split_whitespace().next().unwrap_or("");
        match DIRECTIVES.get(keyword) {
            Some(kind) => {
                trace!(directive = trimmed, "header");
                header
                    .apply(*kind, keyword, trimmed, config)
                    .map_err(|err| DX9ErrorContext::new(line, err))?;
            }
            None => remaining.push(line),
        }
    }

    Ok((header, remaining))
}

impl Header {
    fn apply(
        &mut self,
        kind: DirectiveKind,
        keyword: &str,
        line: &str,
        config: &TranspileConfig,
    ) -> Result<(), DX9Error> {
        let bad_directive = || DX9Error::BadDirective(line.to_owned());
        match kind {
            DirectiveKind::Keywords => {
                let (_, keywords) = parse_keywords(line).map_err(|_| bad_directive())?;
                self.keywords.extend(keywords.into_iter().map(str::to_owned));
            }
            DirectiveKind::Bind => {
                self.binds.insert(line.to_owned());
            }
            DirectiveKind::Constant(constant) => {
                let (rest, (slot, value)) =
                    parse_constant_directive(&line[keyword.len()..]).map_err(|_| bad_directive())?;
                if !rest.is_empty() {
                    return Err(bad_directive());
                }
                self.bind_constant(constant, slot, value, config)
                    .map_err(|err| match err {
                        DX9Error::Syntax(_) => bad_directive(),
                        other => other,
                    })?;
            }
            DirectiveKind::SetTexture => {
                let (rest, binding) =
                    parse_texture_directive(&line[keyword.len()..]).map_err(|_| bad_directive())?;
                if !rest.is_empty() {
                    return Err(bad_directive());
                }
                let dim = TextureDimension::from_directive(binding.dim).ok_or_else(|| {
                    DX9Error::UnsupportedTexture {
                        slot: binding.slot,
                        dim: binding.dim.to_owned(),
                    }
                })?;
                self.declarations
                    .insert(format!("{} {};", dim.sampler_type(), binding.name));
                self.symbols.insert(
                    RegisterKey::Sampler(binding.slot),
                    Symbol::Sampler {
                        name: binding.name.to_owned(),
                        dim,
                    },
                );
            }
        }
        Ok(())
    }

    fn bind_constant(
        &mut self,
        kind: ConstantKind,
        slot: u32,
        value: ConstantValue,
        config: &TranspileConfig,
    ) -> Result<(), DX9Error> {
        let rows = match kind {
            ConstantKind::Vector => 1,
            ConstantKind::Matrix => 4,
        };
        if slot.checked_add(rows - 1).is_none() {
            return Err(DX9Error::Syntax(format!("slot {} out of range", slot)));
        }

        let expr = match value {
            ConstantValue::Bound(name) => {
                if declares_global(name) {
                    self.declarations.insert(format!("{} {};", kind.cg_type(), name));
                }
                self.resolve_bound_name(name, config)?
            }
            ConstantValue::Components(components) => {
                if components.len() != 4 {
                    return Err(DX9Error::Syntax(format!("{} components", components.len())));
                }
                let mut resolved = Vec::with_capacity(4);
                for c in components {
                    resolved.push(match c {
                        Component::Bound(name) => {
                            if declares_global(name) {
                                self.declarations.insert(format!("float {};", name));
                            }
                            self.resolve_bound_name(name, config)?
                        }
                        Component::Literal(lit) => lit.to_owned(),
                    });
                }
                format!("float4({})", resolved.join(","))
            }
        };

        match kind {
            ConstantKind::Vector => {
                self.symbols
                    .insert(RegisterKey::Constant(slot), Symbol::Constant(expr));
            }
            ConstantKind::Matrix => {
                for row in 0..rows {
                    self.symbols.insert(
                        RegisterKey::Constant(slot + row),
                        Symbol::Constant(format!("{}[{}]", expr, row)),
                    );
                }
            }
        }
        Ok(())
    }

    /// Rewrite glstate names into Cg built-ins. Other names are used as-is.
    fn resolve_bound_name(&mut self, name: &str, config: &TranspileConfig) -> Result<String, DX9Error> {
        if !name.starts_with(GLSTATE_PREFIX) {
            return Ok(name.to_owned());
        }

        if let Ok((_, (idx, field))) = parse_light_state(name) {
            self.lighting = true;
            return Ok(format!("glstate.light[{}].{}", idx, field));
        }
        if name == "glstate_lightmodel_ambient" {
            self.lighting = true;
            return Ok("glstate.lightmodel.ambient".to_owned());
        }
        if let Ok((_, idx)) = parse_texture_matrix_state(name) {
            return Ok(if config.legacy {
                format!("glstate.matrix.texture[{}]", idx)
            } else {
                format!("UNITY_MATRIX_TEXTURE{}", idx)
            });
        }
        match MATRIX_STATES.get(name) {
            Some((modern, legacy)) => {
                let alias = if config.legacy { legacy } else { modern };
                Ok((*alias).to_owned())
            }
            None => Err(DX9Error::UnrecognizedGlobalState(name.to_owned())),
        }
    }
}

/// Names starting with `_` are material properties that need a global, unless Unity already provides them
fn declares_global(name: &str) -> bool {
    name.starts_with(GLOBAL_PREFIX) && !RESERVED.contains(name)
}
