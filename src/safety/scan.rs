//! Minimal SQL lexer.
//!
//! Produces word and punctuation lexemes with byte offsets and paren depth,
//! skipping string literals, quoted identifiers, and comments. This is not a
//! SQL parser: it only provides the lexical view the safety classifier and
//! the limit enforcer need, so keyword checks and clause insertion stop
//! tripping over text inside `'...'` literals or comments.
//!
//! Handled syntax: `'...'` strings with `''` escapes, `"..."` and `[...]`
//! quoted identifiers, `--` line comments, nestable `/* */` block comments.

/// The kind of a scanned lexeme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexemeKind {
    /// A bare word: identifier, keyword, or number.
    Word,
    /// A single punctuation character.
    Punct,
}

/// A single lexeme with its byte range and paren depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme<'a> {
    pub kind: LexemeKind,
    /// The lexeme text, sliced from the input.
    pub text: &'a str,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    /// Parenthesis nesting depth; an opening paren and its closing paren
    /// share the same depth, tokens between them sit one level deeper.
    pub depth: u32,
}

impl<'a> Lexeme<'a> {
    /// Case-insensitive comparison against an (uppercase) keyword.
    pub fn is_word(&self, keyword: &str) -> bool {
        self.kind == LexemeKind::Word && self.text.eq_ignore_ascii_case(keyword)
    }

    /// Returns true for a punctuation lexeme matching the given character.
    pub fn is_punct(&self, ch: char) -> bool {
        self.kind == LexemeKind::Punct && self.text.chars().next() == Some(ch)
    }
}

/// Scans the input into lexemes, skipping literals and comments.
///
/// Total: never fails, even on malformed SQL. Unterminated literals and
/// comments swallow the rest of the input, which is the conservative choice
/// for a safety gate (nothing hidden past them is mistaken for a token).
pub fn scan(sql: &str) -> Vec<Lexeme<'_>> {
    let bytes = sql.as_bytes();
    let mut lexemes = Vec::new();
    let mut depth: u32 = 0;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];

        match c {
            // Whitespace
            _ if c.is_ascii_whitespace() => i += 1,

            // Line comment
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }

            // Block comment, nesting allowed (T-SQL and PostgreSQL both nest)
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let mut level = 1;
                i += 2;
                while i < bytes.len() && level > 0 {
                    if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'*') {
                        level += 1;
                        i += 2;
                    } else if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
                        level -= 1;
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
            }

            // String literal with '' escape
            b'\'' => {
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == b'\'' {
                        if bytes.get(i + 1) == Some(&b'\'') {
                            i += 2;
                        } else {
                            i += 1;
                            break;
                        }
                    } else {
                        i += 1;
                    }
                }
            }

            // Double-quoted identifier
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    i += 1;
                }
                i = (i + 1).min(bytes.len());
            }

            // Bracket-quoted identifier (T-SQL)
            b'[' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b']' {
                    i += 1;
                }
                i = (i + 1).min(bytes.len());
            }

            // Word: identifier, keyword, or number
            _ if c.is_ascii_alphanumeric() || c == b'_' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'$')
                {
                    i += 1;
                }
                lexemes.push(Lexeme {
                    kind: LexemeKind::Word,
                    text: &sql[start..i],
                    start,
                    end: i,
                    depth,
                });
            }

            b'(' => {
                lexemes.push(Lexeme {
                    kind: LexemeKind::Punct,
                    text: &sql[i..i + 1],
                    start: i,
                    end: i + 1,
                    depth,
                });
                depth += 1;
                i += 1;
            }

            b')' => {
                depth = depth.saturating_sub(1);
                lexemes.push(Lexeme {
                    kind: LexemeKind::Punct,
                    text: &sql[i..i + 1],
                    start: i,
                    end: i + 1,
                    depth,
                });
                i += 1;
            }

            // Any other punctuation (operators, commas, semicolons, ...)
            _ => {
                // Step over a full UTF-8 char, not just a byte.
                let ch_len = sql[i..].chars().next().map_or(1, char::len_utf8);
                if c.is_ascii() {
                    lexemes.push(Lexeme {
                        kind: LexemeKind::Punct,
                        text: &sql[i..i + 1],
                        start: i,
                        end: i + 1,
                        depth,
                    });
                }
                i += ch_len;
            }
        }
    }

    lexemes
}
