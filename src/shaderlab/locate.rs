//! Finding `Program "..." { SubProgram "..." { ... } }` blocks inside compiled ShaderLab text.
//!
//! A program section starts at a `Program "` marker and runs to the end of the first `#LINE <n>`
//! line after it. Every program block inside that section is delimited by brace matching, and so
//! is every subprogram block inside each program.

use std::ops::Range;

use nom::{
    bytes::complete::{tag, take_until},
    character::complete::{char, digit1, space0, space1},
    combinator::{all_consuming, map, recognize},
    sequence::{delimited, preceded, terminated, tuple},
};

use crate::dx9_text::decode::error::{DX9Error, NomGrammarResult};

pub const PROGRAM_MARKER: &str = "Program \"";
pub const SUBPROGRAM_MARKER: &str = "SubProgram \"";

/// The only subprogram family that gets translated
pub const D3D9_FAMILY: &str = "d3d9";

/// One `SubProgram "<family>" { ... }` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubprogramBlock<'a> {
    /// Quoted family name, trimmed
    pub family: &'a str,
    /// Offset range in the full text, closing brace included
    pub span: Range<usize>,
    /// Lines between the marker line and the closing brace line
    pub body: &'a str,
}
impl<'a> SubprogramBlock<'a> {
    pub fn is_d3d9(&self) -> bool {
        self.family == D3D9_FAMILY
    }
}

/// One `Program "<name>" { ... }` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramBlock<'a> {
    pub span: Range<usize>,
    pub subprograms: Vec<SubprogramBlock<'a>>,
}

/// Everything from a program marker through the following `#LINE` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSection<'a> {
    pub span: Range<usize>,
    pub programs: Vec<ProgramBlock<'a>>,
}
impl<'a> ProgramSection<'a> {
    pub fn subprograms(&self) -> impl Iterator<Item = &SubprogramBlock<'a>> {
        self.programs.iter().flat_map(|p| p.subprograms.iter())
    }

    pub fn has_d3d9(&self) -> bool {
        self.subprograms().any(SubprogramBlock::is_d3d9)
    }
}

/// Index of the brace closing the first block opened at or after `start`.
///
/// Scans forward counting `{` and `}`; the block ends where the count drops back to zero.
pub fn find_closing_bracket(text: &str, start: usize) -> Result<usize, DX9Error> {
    let mut depth: i64 = 0;
    for (i, b) in text.bytes().enumerate().skip(start) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
    }
    Err(DX9Error::NoClosingBracket(start))
}

/// Next occurrence of `marker` at or after `from` that isn't glued onto a preceding word.
pub fn find_marker(text: &str, marker: &str, from: usize) -> Option<usize> {
    let mut search = from;
    while let Some(found) = text.get(search..)?.find(marker) {
        let idx = search + found;
        let glued = text[..idx]
            .chars()
            .next_back()
            .map_or(false, |c| c.is_alphanumeric() || c == '_');
        if !glued {
            return Some(idx);
        }
        search = idx + marker.len();
    }
    None
}

fn parse_line_marker(line: &str) -> NomGrammarResult<&str> {
    all_consuming(delimited(
        space0,
        recognize(tuple((tag("#LINE"), space1, digit1))),
        space0,
    ))(line)
}

fn parse_subprogram_family(input: &str) -> NomGrammarResult<&str> {
    map(
        preceded(tag(SUBPROGRAM_MARKER), terminated(take_until("\""), char('"'))),
        str::trim,
    )(input)
}

/// Offset just past the first `#LINE <n>` line at or after `from`, line terminator included.
fn find_line_marker_end(text: &str, from: usize) -> Option<usize> {
    let mut offset = from;
    for line in text[from..].split_inclusive('\n') {
        offset += line.len();
        if parse_line_marker(line.trim_end_matches(&['\r', '\n'][..])).is_ok() {
            return Some(offset);
        }
    }
    None
}

/// Locate the next program section starting at or after `from`.
///
/// Returns `Ok(None)` when there are no more program markers.
pub fn locate_program(text: &str, from: usize) -> Result<Option<ProgramSection<'_>>, DX9Error> {
    let start = match find_marker(text, PROGRAM_MARKER, from) {
        Some(start) => start,
        None => return Ok(None),
    };
    let end = find_line_marker_end(text, start).ok_or(DX9Error::NoLineMarker(start))?;

    // Blocks are matched against the section alone, so none can run past the #LINE line
    let section = &text[..end];
    let mut programs = vec![];
    let mut cursor = start;
    while let Some(prog_start) = find_marker(section, PROGRAM_MARKER, cursor) {
        let prog_end = find_closing_bracket(section, prog_start)? + 1;
        programs.push(ProgramBlock {
            span: prog_start..prog_end,
            subprograms: locate_subprograms(section, prog_start..prog_end)?,
        });
        cursor = prog_end;
    }

    Ok(Some(ProgramSection {
        span: start..end,
        programs,
    }))
}

fn locate_subprograms(text: &str, within: Range<usize>) -> Result<Vec<SubprogramBlock<'_>>, DX9Error> {
    let block = &text[..within.end];
    let mut subprograms = vec![];
    let mut cursor = within.start;
    while let Some(sub_start) = find_marker(block, SUBPROGRAM_MARKER, cursor) {
        let (_, family) = parse_subprogram_family(&block[sub_start..])?;
        let close = find_closing_bracket(block, sub_start)?;
        subprograms.push(SubprogramBlock {
            family,
            span: sub_start..close + 1,
            body: inner_lines(&block[sub_start..close]),
        });
        cursor = close + 1;
    }
    Ok(subprograms)
}

/// Drop the marker line and whatever shares a line with the closing brace.
fn inner_lines(block: &str) -> &str {
    let first_nl = match block.find('\n') {
        Some(i) => i + 1,
        None => return "",
    };
    let last_nl = block.rfind('\n').unwrap_or(first_nl - 1);
    if last_nl < first_nl {
        ""
    } else {
        &block[first_nl..last_nl]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn closing_bracket_nested() {
        let text = "Program \"vp\" { SubProgram \"d3d9 \" { x } } tail";
        let close = find_closing_bracket(text, 0).unwrap();
        assert_eq!(&text[close + 1..], " tail");
        assert_eq!(
            find_closing_bracket("{ {", 0),
            Err(DX9Error::NoClosingBracket(0))
        );
    }

    #[test]
    fn subprogram_marker_is_not_program_marker() {
        assert_eq!(find_marker("SubProgram \"d3d9 \"", PROGRAM_MARKER, 0), None);
        assert_eq!(find_marker("  Program \"vp\"", PROGRAM_MARKER, 0), Some(2));
    }

    #[test]
    fn line_marker() {
        assert!(parse_line_marker("#LINE 45").is_ok());
        assert!(parse_line_marker("  #LINE 7 ").is_ok());
        assert!(parse_line_marker("#LINE").is_err());
        assert!(parse_line_marker("#LINE 45 // x").is_err());
    }

    #[test]
    fn family_is_trimmed() {
        assert_eq!(parse_subprogram_family("SubProgram \"d3d9 \" {").unwrap().1, "d3d9");
    }

    #[test]
    fn inner_lines_strip_marker_and_brace() {
        assert_eq!(inner_lines("SubProgram \"d3d9 \" {\na\nb\n"), "a\nb");
        assert_eq!(inner_lines("SubProgram \"d3d9 \" {\n"), "");
        assert_eq!(inner_lines("SubProgram \"d3d9 \" { "), "");
    }
}
