//! Percent-decoding of `SET*` arguments.

use log::debug;
use nom::{
    branch::alt,
    bytes::complete::{take_till1, take_while_m_n},
    character::complete::char,
    combinator::{all_consuming, map, map_res},
    multi::fold_many0,
    sequence::preceded,
    IResult,
};

enum Piece<'a> {
    Byte(u8),
    Text(&'a str),
}

fn escape(input: &str) -> IResult<&str, Piece<'_>> {
    map_res(
        preceded(
            char('%'),
            take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()),
        ),
        |hex: &str| u8::from_str_radix(hex, 16).map(Piece::Byte),
    )(input)
}

fn text(input: &str) -> IResult<&str, Piece<'_>> {
    map(take_till1(|c: char| c == '%'), Piece::Text)(input)
}

fn encoded(input: &str) -> IResult<&str, Vec<u8>> {
    all_consuming(fold_many0(
        alt((escape, text)),
        Vec::new,
        |mut acc: Vec<u8>, piece| {
            match piece {
                Piece::Byte(b) => acc.push(b),
                Piece::Text(s) => acc.extend_from_slice(s.as_bytes()),
            }
            acc
        },
    ))(input)
}

/// Decodes `%XX` escapes in `arg`.
///
/// Decoding is best-effort: if `arg` contains a malformed escape, or the
/// escapes do not decode to UTF-8, `arg` is returned unchanged. `+` is left
/// alone.
pub fn percent_decode(arg: &str) -> String {
    match encoded(arg) {
        Ok((_, bytes)) => match String::from_utf8(bytes) {
            Ok(decoded) => decoded,
            Err(_) => {
                debug!("Percent-escapes do not form UTF-8; keeping argument as-is");
                arg.to_owned()
            }
        },
        Err(_) => {
            debug!("Malformed percent-escape; keeping argument as-is");
            arg.to_owned()
        }
    }
}
