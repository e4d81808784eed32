use tracing::debug;

use crate::{
    cg::{assemble_program, ProgramSideTables},
    config::TranspileConfig,
    dx9_text::{read_subprogram, DX9Error, DX9ErrorContext, StageOutput},
};

use super::locate::{locate_program, ProgramSection};

/// Result of rewriting a whole container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spliced {
    pub text: String,
    /// Whether any program section was replaced
    pub changed: bool,
}

/// Translate the d3d9 subprograms of a section into one Cg block.
///
/// Multi-compile programs carry one subprogram per keyword combination. The first one seen for
/// each stage provides its body; every one of them contributes keywords, binds and declarations.
/// Fails with [DX9Error::NoSubprogram] if the section has nothing to translate.
pub fn translate_program(
    text: &str,
    section: &ProgramSection,
    config: &TranspileConfig,
) -> Result<String, DX9ErrorContext> {
    let mut tables = ProgramSideTables::default();
    let mut stages: Vec<StageOutput> = vec![];

    for sub in section.subprograms() {
        if !sub.is_d3d9() {
            debug!(family = sub.family, offset = sub.span.start, "ignoring subprogram");
            continue;
        }
        let read = read_subprogram(sub.body, config)?;
        tables.merge(&read.header);
        if stages.iter().any(|s| s.stage == read.stage) {
            debug!(offset = sub.span.start, stage = %read.stage, "skipping additional combo");
            continue;
        }
        debug!(offset = sub.span.start, stage = %read.stage, "decoding d3d9 subprogram");
        stages.push(read.decode()?.stage);
    }

    if stages.is_empty() {
        return Err(DX9ErrorContext::new(
            first_line(&text[section.span.clone()]),
            DX9Error::NoSubprogram(section.span.start),
        ));
    }
    Ok(assemble_program(&tables, &stages, config))
}

/// Replace every program section holding a d3d9 subprogram with its Cg translation.
///
/// Text outside the replaced sections is copied through untouched.
pub fn splice(text: &str, config: &TranspileConfig) -> Result<Spliced, DX9ErrorContext> {
    let mut out = String::with_capacity(text.len());
    let mut changed = false;
    let mut cursor = 0;

    while let Some(section) = locate_program(text, cursor)
        .map_err(|err| {
            let at = err.offset().unwrap_or(cursor);
            DX9ErrorContext::new(first_line(&text[at..]), err)
        })?
    {
        out.push_str(&text[cursor..section.span.start]);
        if section.has_d3d9() {
            let block = translate_program(text, &section, config)?;
            out.push_str(&indent(&block, config.indent_depth));
            changed = true;
        } else {
            debug!(offset = section.span.start, "no d3d9 subprogram, leaving program as-is");
            out.push_str(&text[section.span.clone()]);
        }
        cursor = section.span.end;
    }
    out.push_str(&text[cursor..]);

    Ok(Spliced { text: out, changed })
}

/// Prefix every line of `block` with `depth` tabs and end each with a newline.
///
/// A trailing newline in `block` therefore yields a final line holding only the tabs.
pub fn indent(block: &str, depth: usize) -> String {
    let tabs = "\t".repeat(depth);
    let mut out = String::with_capacity(block.len() + depth * block.lines().count() + 1);
    for line in block.split('\n') {
        out.push_str(&tabs);
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn indent_tabs_every_line() {
        assert_eq!(indent("a\n\tb", 2), "\t\ta\n\t\t\tb\n");
        assert_eq!(indent("a\n", 1), "\ta\n\t\n");
        assert_eq!(indent("", 3), "\t\t\t\n");
    }
}
