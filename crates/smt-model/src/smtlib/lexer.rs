// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use super::{LoadError, Span};
use std::fmt::{Debug, Formatter};

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    Open,
    Close,
    Symbol(&'a str),
    /// `|...|` with the bars removed
    Quoted(&'a str),
    /// `:name` including the colon
    Keyword(&'a str),
    /// string literal without the surrounding quotes, escapes left as written
    String(&'a str),
}

impl Debug for Token<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Open => write!(f, "("),
            Token::Close => write!(f, ")"),
            Token::Symbol(s) | Token::Keyword(s) => write!(f, "{s}"),
            Token::Quoted(s) => write!(f, "|{s}|"),
            Token::String(s) => write!(f, "\"{s}\""),
        }
    }
}

pub(crate) struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn bytes(&self) -> &'a [u8] {
        self.input.as_bytes()
    }

    fn skip_trivia(&mut self) {
        let bytes = self.bytes();
        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b' ' | b'\n' | b'\r' | b'\t' => self.pos += 1,
                b';' => {
                    while self.pos < bytes.len() && bytes[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    /// Advances past the closing `delim` and returns the position of the delimiter.
    fn find_closing(&mut self, start: usize, delim: u8, what: &str) -> Result<usize, LoadError> {
        let bytes = self.bytes();
        while self.pos < bytes.len() {
            if bytes[self.pos] == delim {
                // `""` inside a string literal is an escaped quote
                if delim == b'"' && bytes.get(self.pos + 1) == Some(&b'"') {
                    self.pos += 2;
                    continue;
                }
                self.pos += 1;
                return Ok(self.pos - 1);
            }
            self.pos += 1;
        }
        Err(LoadError::new(
            format!("unterminated {what}"),
            Span::new(start, self.input.len()),
        ))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<(Token<'a>, Span), LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_trivia();
        let bytes = self.bytes();
        let start = self.pos;
        let c = *bytes.get(start)?;
        self.pos += 1;
        let token = match c {
            b'(' => Token::Open,
            b')' => Token::Close,
            b'|' => match self.find_closing(start, b'|', "quoted symbol") {
                Ok(end) => Token::Quoted(&self.input[start + 1..end]),
                Err(e) => return Some(Err(e)),
            },
            b'"' => match self.find_closing(start, b'"', "string literal") {
                Ok(end) => Token::String(&self.input[start + 1..end]),
                Err(e) => return Some(Err(e)),
            },
            _ => {
                while self.pos < bytes.len()
                    && !matches!(
                        bytes[self.pos],
                        b'(' | b')' | b'|' | b'"' | b';' | b' ' | b'\n' | b'\r' | b'\t'
                    )
                {
                    self.pos += 1;
                }
                let text = &self.input[start..self.pos];
                if c == b':' {
                    Token::Keyword(text)
                } else {
                    Token::Symbol(text)
                }
            }
        };
        Some(Ok((token, Span::new(start, self.pos))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> String {
        Lexer::new(input)
            .map(|t| format!("{:?}", t.unwrap().0))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn tokens_and_trivia() {
        assert_eq!(lex("(bvadd a #b01)"), "( bvadd a #b01 )");
        assert_eq!(
            lex("; header\n(set-info :status |sat val|) ; trailing"),
            "( set-info :status |sat val| )"
        );
        assert_eq!(lex("(echo \"say \"\"hi\"\"\")"), "( echo \"say \"\"hi\"\"\" )");
    }

    #[test]
    fn spans_are_byte_ranges() {
        let spans: Vec<Span> = Lexer::new("  (ab |c|)").map(|t| t.unwrap().1).collect();
        assert_eq!(
            spans,
            vec![
                Span::new(2, 3),
                Span::new(3, 5),
                Span::new(6, 9),
                Span::new(9, 10)
            ]
        );
    }

    #[test]
    fn unterminated_quote() {
        let err = Lexer::new("(a |bc").find_map(|t| t.err()).unwrap();
        assert_eq!(err.span, Span::new(3, 6));
    }
}
