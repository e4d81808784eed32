use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_while, take_while1},
    character::complete::{alpha1, alphanumeric1, anychar, char, digit0, digit1, one_of, satisfy, space0, space1},
    combinator::{all_consuming, map, map_opt, opt, recognize},
    error::ErrorKind,
    multi::{many0, many_m_n, separated_list1},
    sequence::{delimited, pair, preceded, tuple},
};

use crate::dx9_text::vector::{Swizzle, VectorComponent};

use super::error::{DX9Error, GrammarError, NomGrammarResult};

/// One instruction line, split but not yet resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: String,
    pub operands: Vec<String>,
}

/// An operand with its negation and swizzle pulled off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand<'a> {
    pub negate: bool,
    pub register: &'a str,
    pub swizzle: Option<Swizzle>,
}

/// The shapes a bare operand (no `-`, no swizzle) may take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterName<'a> {
    Temp(u32),
    Input(u32),
    TexCoord(u32),
    Constant(u32),
    Sampler(u32),
    /// `oPos`, `oT0`, `oFog`, `oC0`... holds the part after the `o`
    Output(&'a str),
    Literal(&'a str),
}

/// The value half of a `Local`/`Vector`/`Matrix` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstantValue<'a> {
    /// `[name]`
    Bound(&'a str),
    /// `(a,b,c,d)`
    Components(Vec<Component<'a>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component<'a> {
    Bound(&'a str),
    Literal(&'a str),
}

/// The operands of a `SetTexture` directive, before the dimension is validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureBinding<'a> {
    pub slot: u32,
    pub name: &'a str,
    pub dim: &'a str,
}

/// Parse an instruction line into its opcode and comma-separated operands
pub fn parse_instruction(data: &str) -> NomGrammarResult<Instruction> {
    let (data, opcode) = take_while1(|c: char| !c.is_whitespace())(data)?;
    let (data, _) = space0(data)?;

    let (data, operands) = if data.is_empty() {
        (data, vec![])
    } else {
        separated_list1(char(','), map(take_while(|c: char| c != ','), str::trim))(data)?
    };

    Ok((
        data,
        Instruction {
            opcode: opcode.to_owned(),
            operands: operands.into_iter().map(str::to_owned).collect(),
        },
    ))
}

/// Split an operand into negation, register and swizzle.
///
/// The swizzle is only taken if everything after the last `.` is a valid component list,
/// so literals like `0.5` come through whole.
pub fn parse_operand(data: &str) -> NomGrammarResult<Operand> {
    let (data, neg) = opt(char('-'))(data)?;

    let (register, swizzle) = match data.rfind('.') {
        Some(dot) => match all_consuming(parse_swizzle)(&data[dot + 1..]) {
            Ok((_, swizzle)) => (&data[..dot], Some(swizzle)),
            Err(_) => (data, None),
        },
        None => (data, None),
    };

    Ok((
        "",
        Operand {
            negate: neg.is_some(),
            register,
            swizzle,
        },
    ))
}

fn parse_component(data: &str) -> NomGrammarResult<VectorComponent> {
    map_opt(anychar, VectorComponent::from_char)(data)
}

/// `[xyzw]{1,4}`, without the leading dot
pub fn parse_swizzle(data: &str) -> NomGrammarResult<Swizzle> {
    let (data, comps) = many_m_n(1, 4, parse_component)(data)?;
    Ok((data, comps.into_iter().collect()))
}

/// Classify a bare register name. Must consume the whole input.
pub fn parse_register(data: &str) -> NomGrammarResult<RegisterName> {
    all_consuming(alt((
        map(parse_literal, RegisterName::Literal),
        map(preceded(char('r'), parse_index), RegisterName::Temp),
        map(preceded(char('v'), parse_index), RegisterName::Input),
        map(preceded(char('t'), parse_index), RegisterName::TexCoord),
        map(preceded(char('c'), parse_index), RegisterName::Constant),
        map(preceded(char('s'), parse_index), RegisterName::Sampler),
        map(preceded(char('o'), alphanumeric1), RegisterName::Output),
    )))(data)
}

fn parse_index(data: &str) -> NomGrammarResult<u32> {
    let (data, digits) = digit1(data)?;
    let index = digits.parse::<u32>().map_err(DX9Error::ParseIntError)?;
    Ok((data, index))
}

/// `[+-]?([0-9]*\.)?[0-9]+([eE][+-]?[0-9]+)?`
pub fn parse_literal(data: &str) -> NomGrammarResult<&str> {
    recognize(tuple((
        opt(one_of("+-")),
        opt(pair(digit0, char('.'))),
        digit1,
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(data)
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `Keywords { "A" "B" }` -> `["A", "B"]`. Empty quotes are dropped.
pub fn parse_keywords(data: &str) -> NomGrammarResult<Vec<&str>> {
    let (data, _) = tag("Keywords")(data)?;
    let (data, words) = many0(preceded(
        take_till(|c: char| c == '"'),
        delimited(char('"'), take_while(is_word), char('"')),
    ))(data)?;
    Ok((data, words.into_iter().filter(|w| !w.is_empty()).collect()))
}

/// The numbered slot after a directive keyword, with its optional trailing comma
fn parse_slot(data: &str) -> NomGrammarResult<u32> {
    let (data, _) = space1(data)?;
    let (data, slot) = parse_index(data)?;
    let (data, _) = opt(char(','))(data)?;
    let (data, _) = space0(data)?;
    Ok((data, slot))
}

fn parse_bound_name(data: &str) -> NomGrammarResult<&str> {
    delimited(char('['), take_while1(|c: char| c != ']'), char(']'))(data)
}

fn parse_value_component(data: &str) -> NomGrammarResult<Component> {
    delimited(
        space0,
        alt((
            map(parse_bound_name, Component::Bound),
            map(parse_literal, Component::Literal),
        )),
        space0,
    )(data)
}

/// Everything after `Local`, `Vector` or `Matrix`: ` 4, [_Color]` or ` 4, ([_A],[_B],0,1)`
pub fn parse_constant_directive(data: &str) -> NomGrammarResult<(u32, ConstantValue)> {
    let (data, slot) = parse_slot(data)?;
    let (data, value) = alt((
        map(parse_bound_name, ConstantValue::Bound),
        map(
            delimited(char('('), separated_list1(char(','), parse_value_component), char(')')),
            ConstantValue::Components,
        ),
    ))(data)?;
    let (data, _) = space0(data)?;
    Ok((data, (slot, value)))
}

enum TextureToken<'a> {
    Dim(&'a str),
    Name(&'a str),
    Bare(&'a str),
}

fn parse_texture_token(data: &str) -> NomGrammarResult<TextureToken> {
    alt((
        map(delimited(char('{'), take_while1(|c: char| c != '}'), char('}')), TextureToken::Dim),
        map(parse_bound_name, TextureToken::Name),
        map(take_while1(|c: char| !c.is_whitespace()), TextureToken::Bare),
    ))(data)
}

/// Everything after `SetTexture`.
///
/// Both `0 [_MainTex] 2D` and `0 {2D} _MainTex` are seen in the wild,
/// so braces mark the dimension and brackets mark the name.
pub fn parse_texture_directive(data: &str) -> NomGrammarResult<TextureBinding> {
    let (data, slot) = parse_slot(data)?;
    let (data, first) = parse_texture_token(data)?;
    let (data, _) = space1(data)?;
    let (data, second) = parse_texture_token(data)?;
    let (data, _) = space0(data)?;

    let (name, dim) = match (first, second) {
        (TextureToken::Dim(d), TextureToken::Name(n) | TextureToken::Bare(n)) => (n, d),
        (TextureToken::Name(n) | TextureToken::Bare(n), TextureToken::Dim(d)) => (n, d),
        (TextureToken::Name(n), TextureToken::Bare(d)) => (n, d),
        (TextureToken::Bare(d), TextureToken::Name(n)) => (n, d),
        (TextureToken::Bare(a), TextureToken::Bare(b)) => {
            if a.starts_with(|c: char| c.is_ascii_digit()) {
                (b, a)
            } else {
                (a, b)
            }
        }
        _ => return Err(nom::Err::Error(GrammarError::Nom(data, ErrorKind::Verify))),
    };

    Ok((data, TextureBinding { slot, name, dim }))
}

/// `glstate_light<N>_<field>` -> (N, field)
pub fn parse_light_state(data: &str) -> NomGrammarResult<(char, &str)> {
    all_consuming(parse_light_state_parts)(data)
}
fn parse_light_state_parts(data: &str) -> NomGrammarResult<(char, &str)> {
    let (data, _) = tag("glstate_light")(data)?;
    let (data, idx) = satisfy(|c| c.is_ascii_digit())(data)?;
    let (data, _) = char('_')(data)?;
    let (data, field) = alpha1(data)?;
    Ok((data, (idx, field)))
}

/// `glstate_matrix_texture<N>` -> N
pub fn parse_texture_matrix_state(data: &str) -> NomGrammarResult<&str> {
    all_consuming(preceded(tag("glstate_matrix_texture"), digit1))(data)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn operand_keeps_literal_dots() {
        let (_, op) = parse_operand("0.5").unwrap();
        assert_eq!(op.register, "0.5");
        assert_eq!(op.swizzle, None);

        let (_, op) = parse_operand("-c4.zwzw").unwrap();
        assert!(op.negate);
        assert_eq!(op.register, "c4");
        assert_eq!(op.swizzle.unwrap().len(), 4);
    }

    #[test]
    fn registers_classify_by_leading_char() {
        assert_eq!(parse_register("r11").unwrap().1, RegisterName::Temp(11));
        assert_eq!(parse_register("oPos").unwrap().1, RegisterName::Output("Pos"));
        assert_eq!(parse_register("-1").unwrap().1, RegisterName::Literal("-1"));
        assert_eq!(
            parse_register("9.99999975e-006").unwrap().1,
            RegisterName::Literal("9.99999975e-006")
        );
        assert!(parse_register("1e").is_err());
        assert!(parse_register("a0").is_err());
        assert!(parse_register("c[a0.x]").is_err());
    }

    #[test]
    fn keywords_are_unquoted() {
        let (_, kw) = parse_keywords("Keywords { \"POINT\" \"SHADOWS_OFF\" }").unwrap();
        assert_eq!(kw, vec!["POINT", "SHADOWS_OFF"]);
        let (_, kw) = parse_keywords("Keywords { }").unwrap();
        assert!(kw.is_empty());
    }

    #[test]
    fn texture_directive_either_order() {
        let (_, a) = parse_texture_directive(" 0 {2D} _MainTex").unwrap();
        let (_, b) = parse_texture_directive(" 0 [_MainTex] 2D").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.name, "_MainTex");
        assert_eq!(a.dim, "2D");
    }
}
