//! A cursor with one-token lookahead over a line's token list.
//!
//! Mismatches are reported through `Result`, not a shared error flag: the
//! `?` operator gives the same short-circuit behaviour the original
//! error-slot convention was standing in for (see DESIGN.md).

use crate::error::{Error, ErrorKind};
use crate::token::{Token, TokenKind};

pub struct Scanner<'a> {
    tokens: &'a [Token<'a>],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(tokens: &'a [Token<'a>]) -> Scanner<'a> {
        Scanner { tokens, pos: 0 }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// The current token without consuming it, or the `None` sentinel past
    /// the end of the list.
    pub fn peek(&self) -> Token<'a> {
        self.tokens.get(self.pos).copied().unwrap_or(Token::none())
    }

    /// The previously consumed token, or the `None` sentinel at the start.
    pub fn prev(&self) -> Token<'a> {
        if self.pos == 0 {
            Token::none()
        } else {
            self.tokens.get(self.pos - 1).copied().unwrap_or(Token::none())
        }
    }

    /// Consume and return the current token.
    pub fn advance(&mut self) -> Token<'a> {
        let tok = self.peek();
        if !self.at_end() {
            self.pos += 1;
        }
        tok
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Consume the current token if it matches `kind`, else error.
    pub fn consume(&mut self, kind: TokenKind) -> Result<Token<'a>, Error> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let found = self.peek();
            Err(Error::new(
                ErrorKind::ParseExpectedToken,
                format!("expected {:?} but found {:?} ('{}')", kind, found.kind, found.text),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize_line;

    #[test]
    fn consume_advances_on_match() {
        let tokens = tokenize_line("LOAD R1").unwrap();
        let mut scanner = Scanner::new(&tokens);
        scanner.consume(TokenKind::Load).unwrap();
        assert!(scanner.check(TokenKind::Register));
        scanner.consume(TokenKind::Register).unwrap();
        assert!(scanner.at_end());
    }

    #[test]
    fn consume_errors_on_mismatch() {
        let tokens = tokenize_line("LOAD R1").unwrap();
        let mut scanner = Scanner::new(&tokens);
        let err = scanner.consume(TokenKind::Register).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParseExpectedToken);
    }

    #[test]
    fn peek_past_end_is_none_sentinel() {
        let tokens = tokenize_line("HALT").unwrap();
        let mut scanner = Scanner::new(&tokens);
        scanner.advance();
        assert_eq!(scanner.peek().kind, TokenKind::None);
    }
}
