//! Assembly of decoded subprograms into a single `CGPROGRAM ... ENDCG` block.

pub mod boilerplate;

use std::fmt::{Display, Formatter};

use bitflags::bitflags;

use crate::{
    config::TranspileConfig,
    dx9_text::{decode::header::Header, ShaderStage, StageOutput},
    ordered::OrderedSet,
};

use self::boilerplate::{
    entry_point, struct_v2f, CG_FOOTER, CG_HEADER, MIN_TEMPS, STRUCT_APPDATA, STRUCT_F2A,
};

bitflags! {
    /// Which stages a program has decoded bodies for
    pub struct StageSet: u8 {
        const VERTEX = 0b01;
        const FRAGMENT = 0b10;
    }
}
impl From<ShaderStage> for StageSet {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => StageSet::VERTEX,
            ShaderStage::Fragment => StageSet::FRAGMENT,
        }
    }
}

/// Header side tables merged across every subprogram of one program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramSideTables {
    pub keywords: OrderedSet<String>,
    pub binds: OrderedSet<String>,
    pub declarations: OrderedSet<String>,
    pub lighting: bool,
}
impl ProgramSideTables {
    pub fn merge(&mut self, header: &Header) {
        self.keywords.extend(header.keywords.iter().cloned());
        self.binds.extend(header.binds.iter().cloned());
        self.declarations.extend(header.declarations.iter().cloned());
        self.lighting |= header.lighting;
    }
}

/// A program ready to be printed. The [Display] impl is the assembler.
pub struct CgProgram<'a> {
    pub tables: &'a ProgramSideTables,
    pub stages: Vec<&'a StageOutput>,
    pub legacy: bool,
}
impl<'a> CgProgram<'a> {
    pub fn new(tables: &'a ProgramSideTables, stages: &'a [StageOutput], config: &TranspileConfig) -> Self {
        let mut stages: Vec<&StageOutput> = stages.iter().collect();
        stages.sort_by_key(|s| StageSet::from(s.stage).bits());
        Self {
            tables,
            stages,
            legacy: config.legacy,
        }
    }

    pub fn present(&self) -> StageSet {
        self.stages
            .iter()
            .fold(StageSet::empty(), |set, s| set | StageSet::from(s.stage))
    }
}

/// Convenience wrapper over [CgProgram]
pub fn assemble_program(tables: &ProgramSideTables, stages: &[StageOutput], config: &TranspileConfig) -> String {
    CgProgram::new(tables, stages, config).to_string()
}

impl<'a> Display for CgProgram<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let present = self.present();

        if !self.tables.binds.is_empty() {
            writeln!(f, "BindChannels {{")?;
            for bind in self.tables.binds.iter() {
                writeln!(f, "\t{}", bind)?;
            }
            writeln!(f, "}}")?;
        }
        if self.tables.lighting {
            writeln!(f, "Lighting On")?;
        }

        write!(f, "{}", CG_HEADER)?;
        if !self.tables.keywords.is_empty() {
            let keywords: Vec<&str> = self.tables.keywords.iter().map(String::as_str).collect();
            writeln!(f, "#pragma multi_compile {}", keywords.join(" "))?;
        }
        for stage in self.stages.iter() {
            writeln!(f, "{}", entry_point(stage.stage).0)?;
        }
        writeln!(f)?;

        if present.contains(StageSet::VERTEX) {
            writeln!(f, "{}", STRUCT_APPDATA)?;
        }
        if !present.is_empty() {
            writeln!(f, "{}", struct_v2f(self.legacy))?;
        }
        if present.contains(StageSet::FRAGMENT) {
            writeln!(f, "{}", STRUCT_F2A)?;
        }

        for decl in self.tables.declarations.iter() {
            writeln!(f, "{}", decl)?;
        }
        writeln!(f)?;

        for &stage in self.stages.iter() {
            write!(f, "{}", DisplayStage(stage))?;
        }

        write!(f, "{}", CG_FOOTER)
    }
}

/// One entry point function
struct DisplayStage<'a>(&'a StageOutput);
impl<'a> Display for DisplayStage<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (_, signature, output) = entry_point(self.0.stage);
        let n_temps = self.0.max_temp.map_or(MIN_TEMPS, |m| m.max(MIN_TEMPS));
        let temps: Vec<String> = (0..=n_temps).map(|i| format!("r{}", i)).collect();

        writeln!(f, "{}", signature)?;
        writeln!(f, "\tfloat4 {};", temps.join(", "))?;
        writeln!(f, "\tfloat4 tmp;")?;
        writeln!(f, "\t{} o;", output)?;
        writeln!(f)?;
        for line in self.0.lines.iter() {
            writeln!(f, "\t{}", line)?;
        }
        writeln!(f)?;
        writeln!(f, "\treturn o;")?;
        writeln!(f, "}}")?;
        writeln!(f)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fragment_only_skips_vertex_boilerplate() {
        let tables = ProgramSideTables::default();
        let stages = [StageOutput {
            stage: ShaderStage::Fragment,
            lines: vec!["o.c0 = t0;".to_owned()],
            max_temp: Some(7),
        }];
        let text = assemble_program(&tables, &stages, &TranspileConfig::default());

        assert!(text.starts_with("CGPROGRAM\n"));
        assert!(text.contains("#pragma fragment frag\n\nstruct v2f {"));
        assert!(!text.contains("appdata"));
        assert!(!text.contains("#pragma vertex"));
        assert!(text.contains("\tfloat4 r0, r1, r2, r3, r4, r5, r6, r7;\n"));
        assert!(text.contains("\n\to.c0 = t0;\n\n\treturn o;\n}\n\nENDCG"));
    }
}
