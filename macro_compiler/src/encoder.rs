use macro_schema::Packet;

use crate::tokenizer::{parse_int, IntError};
use crate::tokens::{self, Dpad, Named, Stick};
use crate::CompileError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Button(u8),
    Dpad(Dpad),
    StickCardinal(Stick, u8, u8),
    StickCoordinate(Stick, u8, u8),
    Unknown(String),
}

/// Classifies one `+`-separated token of an input expression.
///
/// Only a coordinate expression with an out-of-range axis fails here; every
/// other unrecognised token comes back as `Token::Unknown`.
pub fn classify_token(token: &str, line_no: usize) -> Result<Token, CompileError> {
    if let Some((stick, x, y)) = parse_coordinate(token, line_no)? {
        return Ok(Token::StickCoordinate(stick, x, y));
    }
    Ok(match tokens::lookup(token) {
        Some(Named::Button(bit)) => Token::Button(bit),
        Some(Named::Dpad(d)) => Token::Dpad(d),
        Some(Named::StickCardinal(stick, x, y)) => Token::StickCardinal(stick, x, y),
        None => Token::Unknown(token.to_string()),
    })
}

fn parse_coordinate(token: &str, line_no: usize) -> Result<Option<(Stick, u8, u8)>, CompileError> {
    let Some((stick, rest)) = tokens::split_stick_prefix(token) else {
        return Ok(None);
    };
    let Some(inner) = rest
        .trim_start()
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
    else {
        return Ok(None);
    };
    let Some((xs, ys)) = inner.split_once(',') else {
        return Ok(None);
    };
    let (Some(x), Some(y)) = (parse_axis(xs), parse_axis(ys)) else {
        return Ok(None);
    };

    let axis = |v: Result<u8, &str>| {
        v.map_err(|raw| {
            CompileError::new(
                "E1003",
                format!("stick coordinate out of range 0..=255: {raw} (context={token})"),
                line_no,
            )
            .with_context(token.to_string())
        })
    };
    Ok(Some((stick, axis(x)?, axis(y)?)))
}

/// `None` when the axis is not numeric at all, `Some(Err(raw))` when it is
/// numeric but outside 0..=255. A leading `-` counts as out of range.
fn parse_axis(s: &str) -> Option<Result<u8, &str>> {
    let raw = s.trim();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    match parse_int(digits) {
        Err(IntError::Malformed) => None,
        Err(IntError::Overflow) => Some(Err(raw)),
        Ok(_) if negative => Some(Err(raw)),
        Ok(v) => Some(u8::try_from(v).map_err(|_| raw)),
    }
}

/// Encodes an input expression into one packet, starting from neutral.
pub fn encode_expression(expr: &str, line_no: usize) -> Result<Packet, CompileError> {
    let expr = expr.trim();
    if expr.is_empty() || tokens::is_neutral_keyword(expr) {
        return Ok(Packet::NEUTRAL);
    }

    let mut buttons: u16 = 0;
    let mut dpad = Dpad::Neutral;
    let mut left = (Packet::STICK_CENTER, Packet::STICK_CENTER);
    let mut right = (Packet::STICK_CENTER, Packet::STICK_CENTER);

    for raw in expr.split('+') {
        let token = raw.trim();
        if token.is_empty() {
            continue;
        }
        match classify_token(token, line_no)? {
            Token::Button(bit) => buttons |= 1 << bit,
            Token::Dpad(d) => dpad = d,
            Token::StickCardinal(stick, x, y) | Token::StickCoordinate(stick, x, y) => {
                match stick {
                    Stick::Left => left = (x, y),
                    Stick::Right => right = (x, y),
                }
            }
            Token::Unknown(name) => {
                return Err(CompileError::new(
                    "E1002",
                    format!("unknown token: {name} (context={expr})"),
                    line_no,
                )
                .with_context(expr.to_string()));
            }
        }
    }

    Ok(Packet::from_parts(buttons, dpad.value(), left, right))
}
