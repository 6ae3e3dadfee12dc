//! Translation of `dt:` date/time patterns into chrono strftime strings.
//!
//! Patterns use the familiar letter-run dialect (`yyyy-MM-dd HH:mm:ss.SSS`):
//! a run of the same ASCII letter is one field, text inside single quotes is
//! literal and `''` is a literal quote. Everything else is copied through.

use chrono::format::{Item, StrftimeItems};

/// Translate a pattern into a validated strftime string.
pub fn to_strftime(pattern: &str) -> Result<String, String> {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    out.push('\'');
                    continue;
                }
                let mut closed = false;
                while let Some(inner) = chars.next() {
                    if inner == '\'' {
                        if chars.peek() == Some(&'\'') {
                            chars.next();
                            out.push('\'');
                        } else {
                            closed = true;
                            break;
                        }
                    } else {
                        push_literal(&mut out, inner);
                    }
                }
                if !closed {
                    return Err("unterminated quoted text".to_string());
                }
            }
            '[' | ']' => return Err("optional sections are not supported".to_string()),
            c if c.is_ascii_alphabetic() => {
                let mut count = 1;
                while chars.peek() == Some(&c) {
                    chars.next();
                    count += 1;
                }
                out.push_str(letter_run(c, count)?);
            }
            c => push_literal(&mut out, c),
        }
    }

    if StrftimeItems::new(&out).any(|item| matches!(item, Item::Error)) {
        return Err(format!("'{}' is not a valid format", pattern));
    }

    Ok(out)
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

fn letter_run(letter: char, count: usize) -> Result<&'static str, String> {
    let spec = match (letter, count) {
        ('y' | 'u', 2) => "%y",
        ('y' | 'u', _) => "%Y",
        ('M' | 'L', 1) => "%-m",
        ('M' | 'L', 2) => "%m",
        ('M' | 'L', 3) => "%b",
        ('M' | 'L', 4) => "%B",
        ('d', 1) => "%-d",
        ('d', 2) => "%d",
        ('D', 1) => "%-j",
        ('D', 3) => "%j",
        ('H', 1) => "%-H",
        ('H', 2) => "%H",
        ('h', 1) => "%-I",
        ('h', 2) => "%I",
        ('m', 1) => "%-M",
        ('m', 2) => "%M",
        ('s', 1) => "%-S",
        ('s', 2) => "%S",
        ('S', 3) => "%3f",
        ('S', 6) => "%6f",
        ('S', 9) => "%9f",
        ('a', 1) => "%p",
        ('E', 1..=3) => "%a",
        ('E', 4) => "%A",
        ('Z', 1..=3) => "%z",
        ('Z', 5) => "%:z",
        ('X' | 'x', 1 | 2) => "%z",
        ('X' | 'x', 3) => "%:z",
        ('z', 1..=3) => "%Z",
        ('S', _) => {
            return Err(format!(
                "fraction of second must be 3, 6 or 9 digits, got {}",
                count
            ))
        }
        _ => {
            return Err(format!(
                "unsupported pattern field '{}'",
                letter.to_string().repeat(count)
            ))
        }
    };
    Ok(spec)
}
