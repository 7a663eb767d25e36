// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use super::lexer::{Lexer, Token};
use super::{LoadError, Span};

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum SExpr<'a> {
    Atom(Token<'a>, Span),
    List(Vec<SExpr<'a>>, Span),
}

impl Drop for SExpr<'_> {
    // nested lists are flattened into one buffer so teardown does not
    // recurse once per nesting level
    fn drop(&mut self) {
        let SExpr::List(items, _) = self else {
            return;
        };
        let mut pending = std::mem::take(items);
        while let Some(mut item) = pending.pop() {
            if let SExpr::List(children, _) = &mut item {
                pending.append(children);
            }
        }
    }
}

impl<'a> SExpr<'a> {
    pub(crate) fn span(&self) -> Span {
        match self {
            SExpr::Atom(_, span) | SExpr::List(_, span) => *span,
        }
    }

    /// Plain or quoted symbol.
    pub(crate) fn symbol(&self) -> Option<&'a str> {
        match self {
            SExpr::Atom(Token::Symbol(s), _) | SExpr::Atom(Token::Quoted(s), _) => Some(*s),
            _ => None,
        }
    }

    pub(crate) fn list(&self) -> Option<&[SExpr<'a>]> {
        match self {
            SExpr::List(items, _) => Some(items),
            SExpr::Atom(..) => None,
        }
    }

    pub(crate) fn is_symbol(&self, name: &str) -> bool {
        matches!(self, SExpr::Atom(Token::Symbol(s), _) if *s == name)
    }
}

/// Reads all top-level s-expressions of `input`.
pub(crate) fn read_all(input: &str) -> Result<Vec<SExpr<'_>>, LoadError> {
    // each frame holds the start offset of its `(` and the items read so far
    let mut stack: Vec<(usize, Vec<SExpr>)> = vec![];
    let mut top = vec![];
    for token in Lexer::new(input) {
        let (token, span) = token?;
        let item = match token {
            Token::Open => {
                stack.push((span.start, vec![]));
                continue;
            }
            Token::Close => match stack.pop() {
                Some((start, items)) => SExpr::List(items, Span::new(start, span.end)),
                None => return Err(LoadError::new("unexpected `)`", span)),
            },
            atom => SExpr::Atom(atom, span),
        };
        match stack.last_mut() {
            Some((_, items)) => items.push(item),
            None => top.push(item),
        }
    }
    if let Some((start, _)) = stack.pop() {
        return Err(LoadError::new(
            "unclosed `(`",
            Span::new(start, start + 1),
        ));
    }
    Ok(top)
}
