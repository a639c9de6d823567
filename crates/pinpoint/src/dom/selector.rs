/*!
CSS selector engine.

Parses the selector subset that Pinpoint generates (and that shows up in
persisted data) with `nom`, and matches it against a [`Document`].

Supported: type and universal selectors, `#id`, `.class`, `[attr]`,
`[attr=value]` (quoted or bare), `:nth-child(n)`, `:nth-of-type(n)`,
`:first-child`, `:last-child`, `:first-of-type`, descendant and `>`
combinators, comma-separated lists, and CSS identifier escapes. Class
selectors also match build-hashed variants of the class.
Anything else is a [`SelectorError`], never a panic.
*/

use nom::{
  IResult, Parser,
  branch::alt,
  bytes::complete::take_while1,
  character::complete::{char, multispace0, multispace1},
  combinator::{map, opt},
  multi::{many0, separated_list1},
  sequence::{delimited, preceded},
};

use super::Document;
use crate::identity::clean_class;
use crate::types::{NodeId, PinpointError};

/// Selector parse/validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
  /// Nothing but whitespace.
  #[error("empty selector")]
  Empty,

  /// Unparseable input.
  #[error("syntax error near '{near}'")]
  Parse {
    /// Remaining input where parsing stopped.
    near: String,
  },

  /// A pseudo-class outside the supported set.
  #[error("unsupported pseudo-class ':{0}'")]
  Unsupported(String),

  /// A functional pseudo-class with a bad argument, e.g. `:nth-child(x)`.
  #[error("invalid argument '{arg}' for ':{name}'")]
  InvalidArgument {
    /// Pseudo-class name.
    name: String,
    /// The rejected argument.
    arg: String,
  },
}

impl SelectorError {
  /// Attach the offending selector text.
  pub(crate) fn for_selector(self, selector: &str) -> PinpointError {
    PinpointError::InvalidSelector {
      selector: selector.to_string(),
      reason: self.to_string(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
  Descendant,
  Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Simple {
  Id(String),
  Class(String),
  Attribute { name: String, value: Option<String> },
  NthChild(usize),
  NthOfType(usize),
  LastChild,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Compound {
  tag: Option<String>,
  simples: Vec<Simple>,
}

/// `compounds[i]` and `compounds[i + 1]` are joined by `combinators[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
  compounds: Vec<Compound>,
  combinators: Vec<Combinator>,
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
  alternatives: Vec<Complex>,
}

impl Selector {
  /// Parse a selector list.
  pub fn parse(source: &str) -> Result<Self, SelectorError> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
      return Err(SelectorError::Empty);
    }

    match selector_list(trimmed) {
      Ok(("", raw)) => compile(raw),
      Ok((rest, _)) => Err(SelectorError::Parse { near: excerpt(rest) }),
      Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(SelectorError::Parse {
        near: excerpt(e.input),
      }),
      Err(nom::Err::Incomplete(_)) => Err(SelectorError::Parse {
        near: String::new(),
      }),
    }
  }

  /// Does `node` match any alternative of this selector?
  pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
    doc.is_element(node)
      && self
        .alternatives
        .iter()
        .any(|complex| match_from(doc, node, complex, complex.compounds.len()))
  }
}

fn excerpt(rest: &str) -> String {
  rest.chars().take(16).collect()
}

// --- Matching ---

/// Match `compounds[..end]` right to left, `node` against `compounds[end - 1]`.
fn match_from(doc: &Document, node: NodeId, complex: &Complex, end: usize) -> bool {
  let Some(idx) = end.checked_sub(1) else {
    return false;
  };
  let Some(compound) = complex.compounds.get(idx) else {
    return false;
  };
  if !matches_compound(doc, node, compound) {
    return false;
  }
  if idx == 0 {
    return true;
  }

  match complex.combinators.get(idx - 1) {
    Some(Combinator::Child) => doc
      .parent(node)
      .is_some_and(|parent| match_from(doc, parent, complex, idx)),
    Some(Combinator::Descendant) => doc
      .ancestors(node)
      .any(|ancestor| match_from(doc, ancestor, complex, idx)),
    None => false,
  }
}

fn matches_compound(doc: &Document, node: NodeId, compound: &Compound) -> bool {
  if let Some(ref tag) = compound.tag {
    if doc.tag_name(node) != Some(tag.as_str()) {
      return false;
    }
  }
  compound
    .simples
    .iter()
    .all(|simple| matches_simple(doc, node, simple))
}

fn matches_simple(doc: &Document, node: NodeId, simple: &Simple) -> bool {
  match simple {
    Simple::Id(id) => doc.attribute(node, "id") == Some(id.as_str()),
    Simple::Class(class) => doc
      .class_list(node)
      .iter()
      .any(|token| class_matches(token, class)),
    Simple::Attribute { name, value: None } => doc.attribute(node, name).is_some(),
    Simple::Attribute {
      name,
      value: Some(value),
    } => doc.attribute(node, name) == Some(value.as_str()),
    Simple::NthChild(n) => doc.element_position(node) == *n,
    Simple::NthOfType(n) => doc.type_position(node) == *n,
    Simple::LastChild => doc.next_element_sibling(node).is_none(),
  }
}

/// Exact match, or `token` is a build-hashed form of `class`
/// (`Button_root__a1b2c` for `.Button_root`). Generated selectors name
/// classes without their hash suffix.
fn class_matches(token: &str, class: &str) -> bool {
  token == class || (token.starts_with(class) && clean_class(token).as_deref() == Some(class))
}

// --- Parsing ---

type PResult<'a, T> = IResult<&'a str, T>;

/// Raw component before pseudo-class validation.
enum Part {
  Simple(Simple),
  Pseudo { name: String, arg: Option<String> },
}

struct RawCompound {
  tag: Option<String>,
  parts: Vec<Part>,
}

struct RawComplex {
  compounds: Vec<RawCompound>,
  combinators: Vec<Combinator>,
}

fn fail(input: &str) -> nom::Err<nom::error::Error<&str>> {
  nom::Err::Error(nom::error::Error::new(
    input,
    nom::error::ErrorKind::Verify,
  ))
}

fn ws0(input: &str) -> PResult<'_, &str> {
  multispace0(input)
}

fn ws1(input: &str) -> PResult<'_, &str> {
  multispace1(input)
}

const fn is_ident_char(c: char) -> bool {
  c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

/// Decode the escape following a backslash: `HEX ` (up to six digits, one
/// optional trailing space) or a single literal character.
fn escape_sequence(after: &str) -> Option<(char, &str)> {
  let hex_len = after
    .chars()
    .take(6)
    .take_while(char::is_ascii_hexdigit)
    .count();
  if hex_len > 0 {
    // Hex digits are ASCII, so char count == byte count.
    let (hex, tail) = after.split_at(hex_len);
    let decoded = u32::from_str_radix(hex, 16)
      .ok()
      .and_then(char::from_u32)
      .filter(|&c| c != '\0')
      .unwrap_or('\u{FFFD}');
    return Some((decoded, tail.strip_prefix(' ').unwrap_or(tail)));
  }
  let mut escaped = after.chars();
  escaped.next().map(|c| (c, escaped.as_str()))
}

/// CSS identifier, resolving `\X` and `\HEX ` escapes.
fn ident(input: &str) -> PResult<'_, String> {
  let mut out = String::new();
  let mut rest = input;

  loop {
    let mut chars = rest.chars();
    match chars.next() {
      Some('\\') => {
        let (c, tail) = escape_sequence(chars.as_str()).ok_or_else(|| fail(input))?;
        out.push(c);
        rest = tail;
      }
      Some(c) if is_ident_char(c) => {
        out.push(c);
        rest = chars.as_str();
      }
      _ => break,
    }
  }

  if out.is_empty() {
    Err(fail(input))
  } else {
    Ok((rest, out))
  }
}

/// Single- or double-quoted string with the same escapes as identifiers.
/// An escaped newline is a line continuation.
fn quoted(input: &str) -> PResult<'_, String> {
  let mut chars = input.chars();
  let quote = match chars.next() {
    Some(q @ ('"' | '\'')) => q,
    _ => return Err(fail(input)),
  };

  let mut out = String::new();
  let mut rest = chars.as_str();
  loop {
    let mut chars = rest.chars();
    match chars.next() {
      Some('\\') => {
        let after = chars.as_str();
        if let Some(tail) = after.strip_prefix('\n') {
          rest = tail;
          continue;
        }
        let (c, tail) = escape_sequence(after).ok_or_else(|| fail(input))?;
        out.push(c);
        rest = tail;
      }
      Some(c) if c == quote => return Ok((chars.as_str(), out)),
      Some('\n') | None => return Err(fail(input)),
      Some(c) => {
        out.push(c);
        rest = chars.as_str();
      }
    }
  }
}

fn id_part(input: &str) -> PResult<'_, Part> {
  map(preceded(char('#'), ident), |id| Part::Simple(Simple::Id(id))).parse(input)
}

fn class_part(input: &str) -> PResult<'_, Part> {
  map(preceded(char('.'), ident), |class| {
    Part::Simple(Simple::Class(class))
  })
  .parse(input)
}

fn attribute_value(input: &str) -> PResult<'_, String> {
  alt((quoted, ident)).parse(input)
}

fn attribute_part(input: &str) -> PResult<'_, Part> {
  let (input, _) = (char('['), ws0).parse(input)?;
  let (input, name) = ident(input)?;
  let (input, _) = ws0(input)?;
  let (input, value) = opt(preceded((char('='), ws0), attribute_value)).parse(input)?;
  let (input, _) = (ws0, char(']')).parse(input)?;
  Ok((
    input,
    Part::Simple(Simple::Attribute {
      name: name.to_ascii_lowercase(),
      value,
    }),
  ))
}

fn pseudo_argument(input: &str) -> PResult<'_, &str> {
  delimited(char('('), take_while1(|c: char| c != ')'), char(')')).parse(input)
}

fn pseudo_part(input: &str) -> PResult<'_, Part> {
  let (input, name) = preceded(char(':'), ident).parse(input)?;
  let (input, arg) = opt(pseudo_argument).parse(input)?;
  Ok((
    input,
    Part::Pseudo {
      name,
      arg: arg.map(|a| a.trim().to_string()),
    },
  ))
}

fn part(input: &str) -> PResult<'_, Part> {
  alt((id_part, class_part, attribute_part, pseudo_part)).parse(input)
}

fn type_selector(input: &str) -> PResult<'_, Option<String>> {
  alt((
    map(char('*'), |_| None),
    map(ident, |t| Some(t.to_ascii_lowercase())),
  ))
  .parse(input)
}

fn compound(input: &str) -> PResult<'_, RawCompound> {
  let (input, tag) = opt(type_selector).parse(input)?;
  let (input, parts) = many0(part).parse(input)?;
  if tag.is_none() && parts.is_empty() {
    return Err(fail(input));
  }
  Ok((
    input,
    RawCompound {
      tag: tag.flatten(),
      parts,
    },
  ))
}

fn child_combinator(input: &str) -> PResult<'_, char> {
  delimited(ws0, char('>'), ws0).parse(input)
}

fn complex(input: &str) -> PResult<'_, RawComplex> {
  let (mut input, first) = compound(input)?;
  let mut compounds = vec![first];
  let mut combinators = Vec::new();

  loop {
    if let Ok((rest, _)) = child_combinator(input) {
      let (rest, next) = compound(rest)?;
      combinators.push(Combinator::Child);
      compounds.push(next);
      input = rest;
      continue;
    }
    if let Ok((rest, next)) = preceded(ws1, compound).parse(input) {
      combinators.push(Combinator::Descendant);
      compounds.push(next);
      input = rest;
      continue;
    }
    break;
  }

  Ok((
    input,
    RawComplex {
      compounds,
      combinators,
    },
  ))
}

fn list_separator(input: &str) -> PResult<'_, char> {
  delimited(ws0, char(','), ws0).parse(input)
}

fn selector_list(input: &str) -> PResult<'_, Vec<RawComplex>> {
  separated_list1(list_separator, complex).parse(input)
}

// --- Validation ---

fn compile(raw: Vec<RawComplex>) -> Result<Selector, SelectorError> {
  let alternatives = raw
    .into_iter()
    .map(|complex| {
      let compounds = complex
        .compounds
        .into_iter()
        .map(|compound| {
          let simples = compound
            .parts
            .into_iter()
            .map(|part| match part {
              Part::Simple(simple) => Ok(simple),
              Part::Pseudo { name, arg } => resolve_pseudo(&name, arg.as_deref()),
            })
            .collect::<Result<Vec<_>, _>>()?;
          Ok(Compound {
            tag: compound.tag,
            simples,
          })
        })
        .collect::<Result<Vec<_>, SelectorError>>()?;
      Ok(Complex {
        compounds,
        combinators: complex.combinators,
      })
    })
    .collect::<Result<Vec<_>, SelectorError>>()?;

  Ok(Selector { alternatives })
}

fn resolve_pseudo(name: &str, arg: Option<&str>) -> Result<Simple, SelectorError> {
  let lower = name.to_ascii_lowercase();
  match (lower.as_str(), arg) {
    ("first-child", None) => Ok(Simple::NthChild(1)),
    ("last-child", None) => Ok(Simple::LastChild),
    ("first-of-type", None) => Ok(Simple::NthOfType(1)),
    ("nth-child", Some(arg)) => parse_index(name, arg).map(Simple::NthChild),
    ("nth-of-type", Some(arg)) => parse_index(name, arg).map(Simple::NthOfType),
    _ => Err(SelectorError::Unsupported(name.to_string())),
  }
}

fn parse_index(name: &str, arg: &str) -> Result<usize, SelectorError> {
  match arg.parse::<usize>() {
    Ok(n) if n > 0 => Ok(n),
    _ => Err(SelectorError::InvalidArgument {
      name: name.to_string(),
      arg: arg.to_string(),
    }),
  }
}

// --- Serialization helpers ---

/// Escape a string for use as a CSS identifier (`CSS.escape` semantics).
pub fn escape_ident(value: &str) -> String {
  let mut out = String::with_capacity(value.len());
  let first = value.chars().next();
  let single_dash = value == "-";

  for (i, c) in value.chars().enumerate() {
    let code = u32::from(c);
    if c == '\0' {
      out.push('\u{FFFD}');
    } else if (0x01..=0x1f).contains(&code)
      || code == 0x7f
      || (i == 0 && c.is_ascii_digit())
      || (i == 1 && c.is_ascii_digit() && first == Some('-'))
    {
      out.push_str(&format!("\\{code:x} "));
    } else if single_dash {
      out.push_str("\\-");
    } else if is_ident_char(c) {
      out.push(c);
    } else {
      out.push('\\');
      out.push(c);
    }
  }
  out
}

/// Escape a string for use inside a double-quoted attribute value.
///
/// Quotes and backslashes get a backslash; control characters become hex
/// escapes so the result stays on one line and parses back to `value`.
pub fn escape_string(value: &str) -> String {
  let mut out = String::with_capacity(value.len() + 2);
  for c in value.chars() {
    let code = u32::from(c);
    match c {
      '\0' => out.push('\u{FFFD}'),
      '"' | '\\' => {
        out.push('\\');
        out.push(c);
      }
      _ if (0x01..=0x1f).contains(&code) || code == 0x7f => out.push_str(&format!("\\{code:x} ")),
      _ => out.push(c),
    }
  }
  out
}
