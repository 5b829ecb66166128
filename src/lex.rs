//! Shared lexical machinery for the data and schema parsers.
//!
//! Both parsers walk the input with a byte-offset [`Cursor`] and report
//! positions as `(offset, length)` pairs into the original text. Structural
//! failures (a failed [`Cursor::expect`], an unterminated string) return
//! [`Abort`], which unwinds the current parse attempt; the errors gathered so
//! far stay in the caller's sink.

use crate::error::ParseError;

/// Marker for a hard parse abort. Carries nothing: the error describing the
/// abort is already in the error sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Abort;

pub type Lexed<T> = Result<T, Abort>;

// ------------------------------- Cursor ----------------------------------- //

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    text: &'a str,
    pos: usize, // byte offset
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    /// Advance one character and return it.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Advance over space, tab, carriage return, and newline.
    pub fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' || c == '\n' || c == '\r' {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// Advance over spaces and tabs only. Validator lists are line-scoped, so
    /// their scanner must not cross newlines.
    pub fn skip_inline_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// Consume `ch` if it is next; report whether it was consumed.
    pub fn accept(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume `ch` or record `Expected '<ch>' but found '<found>'` at the
    /// current position and abort the parse.
    pub fn expect(&mut self, ch: char, errors: &mut Vec<ParseError>) -> Lexed<()> {
        if self.accept(ch) {
            return Ok(());
        }
        let found = match self.peek() {
            Some(c) => c.to_string(),
            None => "undefined".to_string(),
        };
        errors.push(ParseError {
            message: format!("Expected '{ch}' but found '{found}'"),
            offset: self.pos,
            length: 1,
        });
        Err(Abort)
    }

    /// Skip the rest of the current line, including the terminating newline.
    pub fn skip_line(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
    }

    /// Capture the rest of the current line (newline excluded and consumed).
    pub fn take_line(&mut self) -> &'a str {
        let start = self.pos;
        let mut end = self.pos;
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
            end = self.pos;
        }
        &self.text[start..end]
    }

    /// Scan a bare identifier: `[A-Za-z_][A-Za-z0-9_]*`. Returns `None` (and
    /// does not advance) when the next character cannot start one.
    pub fn scan_ident(&mut self) -> Option<&'a str> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                self.bump();
            }
            _ => return None,
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        Some(&self.text[start..self.pos])
    }

    /// Scan forward until one of `stops` (or end of input), returning the raw
    /// slice. The stop character itself is not consumed.
    pub fn scan_until(&mut self, stops: &[char]) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if stops.contains(&c) {
                break;
            }
            self.bump();
        }
        &self.text[start..self.pos]
    }
}

// ---------------------------- Quoted strings ------------------------------ //

/// Scan a quoted string with the cursor on the opening quote.
///
/// `""` is the in-string escape for a literal quote; a backslash before a
/// quote is also accepted. Any other backslash sequence records
/// `Invalid escape sequence '\<ch>'` and scanning continues with the escaped
/// character taken literally. A missing closing quote is structural.
pub fn scan_string(cur: &mut Cursor, errors: &mut Vec<ParseError>) -> Lexed<String> {
    let start = cur.pos();
    cur.expect('"', errors)?;
    let mut out = String::new();
    loop {
        match cur.bump() {
            None => {
                errors.push(ParseError {
                    message: "Unterminated string".to_string(),
                    offset: start,
                    length: cur.pos() - start,
                });
                return Err(Abort);
            }
            Some('"') => {
                if cur.peek() == Some('"') {
                    cur.bump();
                    out.push('"');
                } else {
                    return Ok(out);
                }
            }
            Some('\\') => match cur.peek() {
                Some('"') => {
                    cur.bump();
                    out.push('"');
                }
                Some(c) => {
                    errors.push(ParseError {
                        message: format!("Invalid escape sequence '\\{c}'"),
                        offset: cur.pos() - 1,
                        length: 1 + c.len_utf8(),
                    });
                    cur.bump();
                    out.push(c);
                }
                None => {
                    errors.push(ParseError {
                        message: "Unterminated string".to_string(),
                        offset: start,
                        length: cur.pos() - start,
                    });
                    return Err(Abort);
                }
            },
            Some(c) => out.push(c),
        }
    }
}

/// Dedent an indented multi-line string block.
///
/// A string literal beginning with a newline is a block: the minimum leading
/// whitespace width over its non-blank continuation lines is stripped from
/// every continuation line, and the result is left-trimmed of its own leading
/// newline/whitespace.
pub fn dedent_block(raw: &str) -> String {
    if !raw.starts_with('\n') {
        return raw.to_string();
    }
    let lines: Vec<&str> = raw.split('\n').collect();
    let min_indent = lines[1..]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
            let skip: usize = line
                .chars()
                .take_while(|c| c.is_whitespace())
                .take(min_indent)
                .map(|c| c.len_utf8())
                .sum();
            out.push_str(&line[skip.min(line.len())..]);
        } else {
            out.push_str(line);
        }
    }
    out.trim_start().to_string()
}

// -------------------------------- Tests ----------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expect_reports_found_char_and_aborts() {
        let mut cur = Cursor::new("x");
        let mut errors = Vec::new();
        assert_eq!(cur.expect('{', &mut errors), Err(Abort));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Expected '{' but found 'x'");
        assert_eq!(errors[0].offset, 0);
        assert_eq!(errors[0].length, 1);
    }

    #[test]
    fn expect_reports_undefined_at_end() {
        let mut cur = Cursor::new("");
        let mut errors = Vec::new();
        assert!(cur.expect('}', &mut errors).is_err());
        assert_eq!(errors[0].message, "Expected '}' but found 'undefined'");
    }

    #[test]
    fn doubled_quote_escapes() {
        let mut cur = Cursor::new(r#""She said ""Hello""""#);
        let mut errors = Vec::new();
        let s = scan_string(&mut cur, &mut errors).unwrap();
        assert_eq!(s, r#"She said "Hello""#);
        assert!(errors.is_empty());
    }

    #[test]
    fn backslash_quote_escapes_and_other_backslash_reports() {
        let mut cur = Cursor::new(r#""a\"b""#);
        let mut errors = Vec::new();
        assert_eq!(scan_string(&mut cur, &mut errors).unwrap(), "a\"b");
        assert!(errors.is_empty());

        let mut cur = Cursor::new(r#""a\nb""#);
        let s = scan_string(&mut cur, &mut errors).unwrap();
        assert_eq!(s, "anb");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, r"Invalid escape sequence '\n'");
    }

    #[test]
    fn unterminated_string_is_structural() {
        let mut cur = Cursor::new("\"abc");
        let mut errors = Vec::new();
        assert_eq!(scan_string(&mut cur, &mut errors), Err(Abort));
        assert_eq!(errors[0].message, "Unterminated string");
    }

    #[test]
    fn dedent_strips_minimum_indent() {
        let raw = "\n    line one\n      line two\n    line three";
        assert_eq!(dedent_block(raw), "line one\n  line two\nline three");
    }

    #[test]
    fn dedent_ignores_blank_lines_for_width() {
        let raw = "\n    a\n\n    b";
        assert_eq!(dedent_block(raw), "a\n\nb");
    }

    #[test]
    fn dedent_leaves_inline_strings_alone() {
        assert_eq!(dedent_block("plain"), "plain");
    }
}
