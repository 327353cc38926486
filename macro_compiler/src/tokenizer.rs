use macro_schema::Milliseconds;

use crate::CompileError;

/// Removes an inline comment (`#` or `//` to end of line).
pub fn strip_comment(line: &str) -> &str {
    let hash = line.find('#');
    let slashes = line.find("//");
    let cut = match (hash, slashes) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    match cut {
        Some(i) => &line[..i],
        None => line,
    }
}

/// Splits `expr,duration` at the last comma outside parentheses.
///
/// Unbalanced parentheses never yield a split point.
pub fn split_line(line: &str, line_no: usize) -> Result<(&str, &str), CompileError> {
    let malformed = || {
        CompileError::new(
            "E1001",
            format!("expected <input>,<duration> (context={line})"),
            line_no,
        )
        .with_context(line.to_string())
    };

    let mut depth: u32 = 0;
    let mut split = None;
    for (i, ch) in line.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(malformed)?;
            }
            ',' if depth == 0 => split = Some(i),
            _ => {}
        }
    }
    if depth != 0 {
        return Err(malformed());
    }

    let i = split.ok_or_else(malformed)?;
    Ok((line[..i].trim(), line[i + 1..].trim()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IntError {
    /// Not a decimal or `0x` hexadecimal literal.
    Malformed,
    /// Well-formed digits whose value does not fit in a `u64`.
    Overflow,
}

/// Parses an unsigned decimal or `0x`-prefixed hexadecimal integer.
///
/// Signs are not part of the grammar and are rejected as malformed.
pub(crate) fn parse_int(s: &str) -> Result<u64, IntError> {
    let s = s.trim();
    let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (s, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(IntError::Malformed);
    }
    u64::from_str_radix(digits, radix).map_err(|_| IntError::Overflow)
}

pub fn parse_duration(s: &str, line_no: usize) -> Result<Milliseconds, CompileError> {
    let too_large = || {
        CompileError::new("E1004", format!("duration too large: {s}"), line_no)
            .with_context(s.to_string())
    };
    let value = parse_int(s).map_err(|e| match e {
        IntError::Malformed => {
            CompileError::new("E1004", format!("invalid duration: {s:?}"), line_no)
                .with_context(s.to_string())
        }
        IntError::Overflow => too_large(),
    })?;
    Milliseconds::try_from(value).map_err(|_| too_large())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CompileErrorKind;

    #[test]
    fn strip_comment_handles_both_styles() {
        assert_eq!(strip_comment("A,100 # press"), "A,100 ");
        assert_eq!(strip_comment("A,100 // press"), "A,100 ");
        assert_eq!(strip_comment("A,100 // x # y"), "A,100 ");
        assert_eq!(strip_comment("A,100"), "A,100");
    }

    #[test]
    fn split_ignores_commas_inside_coordinates() {
        assert_eq!(split_line("L(0,255),200", 1).unwrap(), ("L(0,255)", "200"));
        assert_eq!(
            split_line("A + R(10, 20) + L(1,2) , 0x10", 1).unwrap(),
            ("A + R(10, 20) + L(1,2)", "0x10")
        );
    }

    #[test]
    fn split_prefers_last_top_level_comma() {
        assert_eq!(split_line("A,B,100", 1).unwrap(), ("A,B", "100"));
        assert_eq!(split_line(",50", 1).unwrap(), ("", "50"));
    }

    #[test]
    fn split_without_top_level_comma_is_malformed() {
        for line in ["A 100", "L(0,255)", "L(0,255 100", "A),100", "L((1,2),100"] {
            let err = split_line(line, 3).unwrap_err();
            assert_eq!(err.kind, CompileErrorKind::MalformedLine, "{line}");
            assert_eq!(err.line, 3);
        }
    }

    #[test]
    fn parse_int_accepts_decimal_and_hex() {
        assert_eq!(parse_int("42"), Ok(42));
        assert_eq!(parse_int("0x2A"), Ok(42));
        assert_eq!(parse_int("0XfF"), Ok(255));
        assert_eq!(parse_int("0x"), Err(IntError::Malformed));
        assert_eq!(parse_int("12ms"), Err(IntError::Malformed));
        assert_eq!(parse_int(""), Err(IntError::Malformed));
    }

    #[test]
    fn parse_int_rejects_signs() {
        for s in ["-1", "+1", "+0x10", "-0"] {
            assert_eq!(parse_int(s), Err(IntError::Malformed), "{s}");
        }
    }

    #[test]
    fn parse_int_separates_overflow_from_garbage() {
        assert_eq!(parse_int("99999999999999999999"), Err(IntError::Overflow));
        assert_eq!(parse_int("0x1FFFFFFFFFFFFFFFF"), Err(IntError::Overflow));
        assert_eq!(parse_int("9999999999999999999x"), Err(IntError::Malformed));
    }

    #[test]
    fn duration_rejects_negative_and_garbage() {
        assert_eq!(parse_duration("0x64", 1).unwrap(), 100);
        assert_eq!(parse_duration("0", 1).unwrap(), 0);

        for bad in [
            "-5",
            "+5",
            "abc",
            "",
            "0x1_0",
            "4294967296",
            "99999999999999999999",
        ] {
            let err = parse_duration(bad, 9).unwrap_err();
            assert_eq!(err.kind, CompileErrorKind::InvalidDuration, "{bad}");
            assert_eq!(err.code, "E1004");
            assert_eq!(err.line, 9);
        }
    }
}
