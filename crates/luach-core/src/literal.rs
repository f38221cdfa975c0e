//! Reader for the small JavaScript assignments the static page loads
//! (`const NAME = { ... };`).
//!
//! Only object literal syntax is understood: bare keys, single or double
//! quoted strings, trailing commas, comments and `undefined`. The literal is
//! rewritten to JSON and handed to `serde_json`.

use std::iter::Peekable;
use std::str::Chars;

use anyhow::{Context, anyhow};
use serde_json::Value;
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Punct(char),
    Str(String),
    Word(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Binding name, when the literal is preceded by `const NAME =`.
    pub name: Option<String>,
    pub value: Value,
}

/// Parses the first object literal in `text`, plus the name it is assigned to.
#[tracing::instrument(skip(text), fields(len = text.len()))]
pub fn parse_assignment(text: &str) -> anyhow::Result<Assignment> {
    let tokens = tokenize(text)?;

    let open = tokens
        .iter()
        .position(|token| *token == Token::Punct('{'))
        .ok_or_else(|| anyhow!("no object literal found"))?;

    let name = match &tokens[..open] {
        [.., Token::Word(name), Token::Punct('=')] => Some(name.clone()),
        _ => None,
    };

    let json = to_json(&tokens[open..])?;
    trace!(json = %json, "rewrote object literal");
    let value = serde_json::from_str(&json).context("object literal is not valid data")?;

    Ok(Assignment { name, value })
}

fn tokenize(text: &str) -> anyhow::Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            c if c.is_whitespace() => {}
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                skip_block_comment(&mut chars)?;
            }
            '"' | '\'' => tokens.push(Token::Str(read_string(&mut chars, ch)?)),
            '{' | '}' | '[' | ']' | ':' | ',' | '=' | ';' | '(' | ')' => {
                tokens.push(Token::Punct(ch))
            }
            c if is_word_char(c) => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if !is_word_char(next) {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
            other => return Err(anyhow!("unexpected character {other:?} in object literal")),
        }
    }

    Ok(tokens)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '.' | '-' | '+')
}

fn skip_block_comment(chars: &mut Peekable<Chars<'_>>) -> anyhow::Result<()> {
    let mut star = false;
    for next in chars.by_ref() {
        if star && next == '/' {
            return Ok(());
        }
        star = next == '*';
    }
    Err(anyhow!("unterminated block comment"))
}

fn read_string(chars: &mut Peekable<Chars<'_>>, quote: char) -> anyhow::Result<String> {
    let mut out = String::new();
    while let Some(ch) = chars.next() {
        match ch {
            c if c == quote => return Ok(out),
            '\\' => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| anyhow!("unterminated escape in string literal"))?;
                match escaped {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    'u' => {
                        let hex: String = chars.by_ref().take(4).collect();
                        let code = u32::from_str_radix(&hex, 16)
                            .with_context(|| format!("invalid unicode escape \\u{hex}"))?;
                        out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                    }
                    '\n' => {}
                    other => out.push(other),
                }
            }
            '\n' => return Err(anyhow!("unterminated string literal")),
            other => out.push(other),
        }
    }
    Err(anyhow!("unterminated string literal"))
}

/// Emits JSON for the balanced literal that starts at `tokens[0]`.
fn to_json(tokens: &[Token]) -> anyhow::Result<String> {
    let mut out = String::new();
    let mut depth = 0usize;

    for (idx, token) in tokens.iter().enumerate() {
        let next = tokens.get(idx + 1);
        match token {
            Token::Punct(c @ ('{' | '[')) => {
                depth += 1;
                out.push(*c);
            }
            Token::Punct(c @ ('}' | ']')) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| anyhow!("unbalanced {c:?} in object literal"))?;
                out.push(*c);
                if depth == 0 {
                    return Ok(out);
                }
            }
            Token::Punct(',') if matches!(next, Some(Token::Punct('}' | ']'))) => {}
            Token::Punct(c @ (',' | ':')) => out.push(*c),
            Token::Punct(other) => {
                return Err(anyhow!("unexpected {other:?} inside object literal"));
            }
            Token::Str(text) => out.push_str(&serde_json::to_string(text)?),
            Token::Word(word) if next == Some(&Token::Punct(':')) => {
                out.push_str(&serde_json::to_string(word)?)
            }
            Token::Word(word) if word == "undefined" => out.push_str("null"),
            Token::Word(word) => out.push_str(word),
        }
    }

    Err(anyhow!("object literal is not closed"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::parse_assignment;

    #[test]
    fn reads_hand_written_statuses() {
        let text = r#"const CALENDAR_STATUSES = {
  title: "My Availability",
  days: {
    "2026-01-01": { status: "available" },
    "2026-01-02": {
      status: "partial",
      notes: "Erev Shabbos, unavailable after 3pm",
    },
    "2026-01-03": { status: "unavailable", notes: "Shabbos" },
    "2026-01-04": {},
  },
};
"#;
        let parsed = parse_assignment(text).expect("parse");
        assert_eq!(parsed.name.as_deref(), Some("CALENDAR_STATUSES"));
        assert_eq!(
            parsed.value,
            json!({
                "title": "My Availability",
                "days": {
                    "2026-01-01": { "status": "available" },
                    "2026-01-02": {
                        "status": "partial",
                        "notes": "Erev Shabbos, unavailable after 3pm"
                    },
                    "2026-01-03": { "status": "unavailable", "notes": "Shabbos" },
                    "2026-01-04": {}
                }
            })
        );
    }

    #[test]
    fn handles_comments_quotes_and_undefined() {
        let text = r#"
// availability for spring
const CALENDAR_STATUSES = {
  /* shown above the grid */
  title: 'Dov\'s week',
  days: {
    '2026-02-02': { status: undefined, notes: "a, b: c // not a comment" },
    "2026-02-03": { status: "partial", notes: "café" }, // trailing
  },
};"#;
        let parsed = parse_assignment(text).expect("parse");
        assert_eq!(parsed.value["title"], json!("Dov's week"));
        assert_eq!(parsed.value["days"]["2026-02-02"]["status"], json!(null));
        assert_eq!(
            parsed.value["days"]["2026-02-02"]["notes"],
            json!("a, b: c // not a comment")
        );
        assert_eq!(parsed.value["days"]["2026-02-03"]["notes"], json!("caf\u{e9}"));
    }

    #[test]
    fn accepts_bare_object() {
        let parsed = parse_assignment("{ days: {} }").expect("parse");
        assert_eq!(parsed.name, None);
        assert_eq!(parsed.value, json!({ "days": {} }));
    }

    #[test]
    fn rejects_broken_literals() {
        assert!(parse_assignment("const X = 3;").is_err());
        assert!(parse_assignment("const X = { title: \"open").is_err());
        assert!(parse_assignment("const X = { days: {").is_err());
        assert!(parse_assignment("const X = { a: # };").is_err());
    }
}
