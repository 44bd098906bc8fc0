//! Nom-based IRC line parser.
//!
//! The grammar is the lenient RFC 1459 one: an optional `:prefix`, then
//! whitespace-separated parameters, the first `" :"` introducing a trailing
//! parameter that runs to the end of the line. The first parameter is the
//! command. Every input parses; an empty line yields an empty command.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_until},
    character::complete::char,
    combinator::{map, opt, rest},
    error::{context, VerboseError},
    sequence::{preceded, separated_pair},
    IResult,
};

type ParseResult<I, O> = IResult<I, O, VerboseError<I>>;

/// Parse message prefix (the part after `:` and before the first space).
fn parse_prefix(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing message prefix",
        preceded(char(':'), take_till(|c: char| c == ' ')),
    )(input)
}

/// Split the rest of the line at the first `" :"`.
fn parse_params(input: &str) -> ParseResult<&str, (&str, Option<&str>)> {
    context(
        "parsing parameters",
        alt((
            map(
                separated_pair(take_until(" :"), tag(" :"), rest),
                |(middle, trailing)| (middle, Some(trailing)),
            ),
            map(rest, |middle| (middle, None)),
        )),
    )(input)
}

/// Parse a complete IRC line into its components.
///
/// ```text
/// [:prefix] [command [params...]] [ :trailing]
/// ```
pub fn parse_message(input: &str) -> ParseResult<&str, ParsedMessage<'_>> {
    let (input, prefix) = context("parsing optional prefix", opt(parse_prefix))(input)?;
    let (input, _) = opt(char(' '))(input)?;
    let (input, (middle, trailing)) = parse_params(input)?;

    let mut params: Vec<&str> = middle.split_whitespace().collect();
    params.extend(trailing);

    let command = if params.is_empty() {
        ""
    } else {
        params.remove(0)
    };

    Ok((
        input,
        ParsedMessage {
            prefix,
            command,
            params,
        },
    ))
}

/// A parsed IRC line with borrowed string slices.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMessage<'a> {
    /// Raw prefix string (without the leading `:`), if present.
    pub prefix: Option<&'a str>,
    /// The command as it appeared on the wire; empty for an empty line.
    pub command: &'a str,
    /// Command parameters, including trailing.
    pub params: Vec<&'a str>,
}

impl<'a> ParsedMessage<'a> {
    /// Parse an IRC line into a `ParsedMessage`.
    ///
    /// None of the combinators can reject input, so the fallback only
    /// exists to keep this total.
    pub fn parse(input: &'a str) -> Self {
        match parse_message(input) {
            Ok((_remaining, msg)) => msg,
            Err(_) => ParsedMessage {
                prefix: None,
                command: "",
                params: Vec::new(),
            },
        }
    }
}
