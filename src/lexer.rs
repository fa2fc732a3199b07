//! Turns one source line into a [Token] stream.
//!
//! A byte-cursor scanner: whitespace is skipped between tokens, punctuation
//! is emitted directly, digit runs become [TokenKind::Number], and alpha
//! runs are classified against the reserved mnemonics before falling back
//! to [TokenKind::Register] or [TokenKind::LabelRef]. A semicolon opens an
//! end-of-line comment and ends tokenization early.

use crate::error::{Error, ErrorKind};
use crate::token::{Token, TokenKind};

/// Tokens past this count on a single line are rejected with
/// [ErrorKind::LexTooManyTokens] rather than growing without bound.
const MAX_TOKENS_PER_LINE: usize = 64;

/// Lex one line of casm source, stopping at `;`, `\n`, or end of string.
pub fn tokenize_line(line: &str) -> Result<Vec<Token<'_>>, Error> {
    let bytes = line.as_bytes();
    let mut tokens = Vec::new();
    let mut cur = 0usize;

    while cur < bytes.len() {
        let b = bytes[cur];

        if b == b';' || b == b'\n' {
            break;
        }
        if b == b' ' || b == b'\t' || b == b'\r' {
            cur += 1;
            continue;
        }

        if tokens.len() >= MAX_TOKENS_PER_LINE {
            return Err(Error::new(
                ErrorKind::LexTooManyTokens,
                format!(
                    "too many tokens on one line (limit {})",
                    MAX_TOKENS_PER_LINE
                ),
            ));
        }

        let start = cur;
        let kind = match b {
            b'=' => {
                cur += 1;
                TokenKind::Equal
            }
            b'[' => {
                cur += 1;
                TokenKind::LBracket
            }
            b']' => {
                cur += 1;
                TokenKind::RBracket
            }
            b'@' => {
                cur += 1;
                TokenKind::At
            }
            b'$' => {
                cur += 1;
                TokenKind::Dollar
            }
            b',' => {
                cur += 1;
                TokenKind::Comma
            }
            b':' => {
                cur += 1;
                TokenKind::Colon
            }
            b'0'..=b'9' => {
                while cur < bytes.len() && bytes[cur].is_ascii_digit() {
                    cur += 1;
                }
                TokenKind::Number
            }
            b if b.is_ascii_alphabetic() => {
                while cur < bytes.len() && (bytes[cur].is_ascii_alphanumeric() || bytes[cur] == b'_') {
                    cur += 1;
                }
                classify_identifier(&line[start..cur])
            }
            other => {
                return Err(Error::new(
                    ErrorKind::LexUnexpectedChar,
                    format!("unexpected character '{}' at column {}", other as char, start),
                ));
            }
        };

        tokens.push(Token::new(kind, &line[start..cur], start));
    }

    Ok(tokens)
}

/// Classify an already-scanned alpha run. Dispatches on the first letter
/// (a hard-coded trie over the first letters of the reserved mnemonics:
/// A, B, D, I, L, M, R, S, W, H) before falling back to the register
/// pattern `R[0-9]` and finally to a plain label reference.
fn classify_identifier(text: &str) -> TokenKind {
    let mut upper = [0u8; 8];
    let bytes = text.as_bytes();
    if bytes.len() <= upper.len() {
        for (i, b) in bytes.iter().enumerate() {
            upper[i] = b.to_ascii_uppercase();
        }
        let word = &upper[..bytes.len()];
        let first = word[0];
        let kind = match first {
            b'A' => match word {
                b"ADD" => Some(TokenKind::Add),
                _ => None,
            },
            b'B' => match word {
                b"BR" => Some(TokenKind::Br),
                b"BLT" => Some(TokenKind::Blt),
                b"BGT" => Some(TokenKind::Bgt),
                b"BLEQ" => Some(TokenKind::Bleq),
                b"BGEQ" => Some(TokenKind::Bgeq),
                b"BEQ" => Some(TokenKind::Beq),
                b"BNEQ" => Some(TokenKind::Bneq),
                _ => None,
            },
            b'D' => match word {
                b"DIV" => Some(TokenKind::Div),
                _ => None,
            },
            b'I' => match word {
                b"INC" => Some(TokenKind::Inc),
                _ => None,
            },
            b'L' => match word {
                b"LOAD" => Some(TokenKind::Load),
                _ => None,
            },
            b'M' => match word {
                b"MUL" => Some(TokenKind::Mul),
                _ => None,
            },
            b'R' => match word {
                b"READ" => Some(TokenKind::Read),
                _ => None,
            },
            b'S' => match word {
                b"STORE" => Some(TokenKind::Store),
                b"SUB" => Some(TokenKind::Sub),
                _ => None,
            },
            b'W' => match word {
                b"WRITE" => Some(TokenKind::Write),
                _ => None,
            },
            b'H' => match word {
                b"HALT" => Some(TokenKind::Halt),
                _ => None,
            },
            _ => None,
        };
        if let Some(kind) = kind {
            return kind;
        }
    }

    if is_register_pattern(text) {
        TokenKind::Register
    } else {
        TokenKind::LabelRef
    }
}

fn is_register_pattern(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 2 && bytes[0].to_ascii_uppercase() == b'R' && bytes[1].is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_punctuation() {
        let tokens = tokenize_line("=[],@$:").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Equal,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::Comma,
                TokenKind::At,
                TokenKind::Dollar,
                TokenKind::Colon,
            ]
        );
    }

    #[test]
    fn lexes_instruction_line() {
        let tokens = tokenize_line("LOAD R1, =10").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Load,
                TokenKind::Register,
                TokenKind::Comma,
                TokenKind::Equal,
                TokenKind::Number,
            ]
        );
    }

    #[test]
    fn stops_at_comment() {
        let tokens = tokenize_line("HALT ; all done").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Halt);
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let tokens = tokenize_line("load r1, =1").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Load);
        assert_eq!(tokens[1].kind, TokenKind::Register);
    }

    #[test]
    fn label_reference_is_not_a_keyword_prefix_match() {
        let tokens = tokenize_line("Loop:").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::LabelRef);
        assert_eq!(tokens[1].kind, TokenKind::Colon);
    }

    #[test]
    fn unexpected_character_is_an_error() {
        let err = tokenize_line("LOAD R1, #5").unwrap_err();
        assert_eq!(err.kind, ErrorKind::LexUnexpectedChar);
    }

    #[test]
    fn too_many_tokens_is_an_error() {
        let line = "LABELREF ".repeat(MAX_TOKENS_PER_LINE + 1);
        let err = tokenize_line(&line).unwrap_err();
        assert_eq!(err.kind, ErrorKind::LexTooManyTokens);
    }
}
