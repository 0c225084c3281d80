//! Recursive-descent parser producing surface terms.
//!
//! The grammar is a small bidirectional lambda calculus:
//!
//! ```text
//! term   ::= lambda | let | funOrPi
//! lambda ::= λ binder+ . term
//! binder ::= x | _ | { x+ (: term)? } | ( x+ : term )
//! let    ::= let x (: term)? = term in term
//! funOrPi::= piBinder+ → term
//!          | spine (→ term)?
//! spine  ::= atom (atom | { term })*
//! atom   ::= x | U | _ | ( term )
//! ```
//!
//! Parenthesized pi binders are disambiguated from grouped terms by
//! backtracking on the token cursor.

use tela_ast::{Icit, Name, Raw, Span};

use crate::lexer::Token;
use crate::result::ParseError;
use tela_miette_util::ToMiette;

type BinderGroup = (Vec<Name>, Option<Raw>, Icit);

pub struct Parser<'src> {
    src: &'src str,
    tokens: Vec<(Token, std::ops::Range<usize>)>,
    pos: usize,
}

impl<'src> Parser<'src> {
    pub fn new(src: &'src str) -> Result<Self, ParseError> {
        use logos::Logos;
        let mut tokens = Vec::new();
        let mut lexer = Token::lexer(src);
        while let Some(tok) = lexer.next() {
            match tok {
                Ok(tok) => tokens.push((tok, lexer.span())),
                Err(()) => {
                    return Err(ParseError::InvalidToken {
                        span: Some(Span::from(lexer.span()).to_miette()),
                    });
                }
            }
        }
        Ok(Parser { src, tokens, pos: 0 })
    }

    pub fn parse(mut self) -> Result<Raw, ParseError> {
        let t = self.term()?;
        match self.peek() {
            None => Ok(t),
            Some(tok) => Err(self.unexpected(tok, "end of input")),
        }
    }

    // Cursor
    //
    //

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|(t, _)| *t)
    }

    fn advance(&mut self) -> Option<(Token, std::ops::Range<usize>)> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        match self.advance() {
            Some((tok, _)) if tok == expected => Ok(()),
            Some((tok, _)) => {
                self.pos -= 1;
                Err(self.unexpected(tok, &expected.to_string()))
            }
            None => Err(ParseError::UnexpectedEof { expected: expected.to_string() }),
        }
    }

    fn ident(&mut self) -> Result<Name, ParseError> {
        match self.advance() {
            Some((Token::Ident, span)) => Ok(Name::from(&self.src[span])),
            Some((tok, _)) => {
                self.pos -= 1;
                Err(self.unexpected(tok, "identifier"))
            }
            None => Err(ParseError::UnexpectedEof { expected: "identifier".to_owned() }),
        }
    }

    fn unexpected(&self, got: Token, expected: &str) -> ParseError {
        let span = self.tokens.get(self.pos).map(|(_, s)| Span::from(s.clone()).to_miette());
        ParseError::UnexpectedToken { got: got.to_string(), expected: expected.to_owned(), span }
    }

    fn span_from(&self, start: usize) -> Span {
        let lo = self.tokens.get(start).map(|(_, s)| s.start).unwrap_or(0);
        let hi = self.tokens.get(self.pos.saturating_sub(1)).map(|(_, s)| s.end).unwrap_or(lo);
        Span::from(lo..hi)
    }

    fn spanned(&self, start: usize, raw: Raw) -> Raw {
        match raw {
            Raw::SrcPos(..) => raw,
            raw => Raw::SrcPos(self.span_from(start), Box::new(raw)),
        }
    }

    // Grammar
    //
    //

    fn term(&mut self) -> Result<Raw, ParseError> {
        let start = self.pos;
        let raw = match self.peek() {
            Some(Token::Lambda) => self.lambda()?,
            Some(Token::Let) => self.let_()?,
            _ => self.fun_or_pi()?,
        };
        Ok(self.spanned(start, raw))
    }

    fn lambda(&mut self) -> Result<Raw, ParseError> {
        self.expect(Token::Lambda)?;
        let mut groups: Vec<BinderGroup> = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Ident) => groups.push((vec![self.ident()?], None, Icit::Expl)),
                Some(Token::Underscore) => {
                    self.advance();
                    groups.push((vec!["_".into()], None, Icit::Expl));
                }
                Some(Token::LBrace) => {
                    self.advance();
                    let (names, ann) = self.binder_group_body(true)?;
                    self.expect(Token::RBrace)?;
                    groups.push((names, ann, Icit::Impl));
                }
                Some(Token::LParen) => {
                    self.advance();
                    let (names, ann) = self.binder_group_body(false)?;
                    self.expect(Token::RParen)?;
                    groups.push((names, ann, Icit::Expl));
                }
                Some(Token::Dot) => break,
                Some(tok) => return Err(self.unexpected(tok, "lambda binder or .")),
                None => {
                    return Err(ParseError::UnexpectedEof { expected: ".".to_owned() });
                }
            }
        }
        if groups.is_empty() {
            return Err(self.unexpected(Token::Dot, "lambda binder"));
        }
        self.expect(Token::Dot)?;
        let mut body = self.term()?;
        for (names, ann, icit) in groups.into_iter().rev() {
            for name in names.into_iter().rev() {
                body = Raw::Lam(name, ann.clone().map(Box::new), icit, Box::new(body));
            }
        }
        Ok(body)
    }

    /// `x+ (: term)?` inside braces, `x+ : term` inside parens.
    fn binder_group_body(&mut self, ann_optional: bool) -> Result<(Vec<Name>, Option<Raw>), ParseError> {
        let mut names = vec![self.ident()?];
        while let Some(Token::Ident) = self.peek() {
            names.push(self.ident()?);
        }
        let ann = match self.peek() {
            Some(Token::Colon) => {
                self.advance();
                Some(self.term()?)
            }
            _ if ann_optional => None,
            Some(tok) => return Err(self.unexpected(tok, ":")),
            None => return Err(ParseError::UnexpectedEof { expected: ":".to_owned() }),
        };
        Ok((names, ann))
    }

    fn let_(&mut self) -> Result<Raw, ParseError> {
        self.expect(Token::Let)?;
        let name = self.ident()?;
        let ann = match self.peek() {
            Some(Token::Colon) => {
                self.advance();
                self.term()?
            }
            _ => Raw::Hole,
        };
        self.expect(Token::Eq)?;
        let t = self.term()?;
        self.expect(Token::In)?;
        let u = self.term()?;
        Ok(Raw::Let(name, Box::new(ann), Box::new(t), Box::new(u)))
    }

    fn fun_or_pi(&mut self) -> Result<Raw, ParseError> {
        if let Some(pi) = self.try_pi()? {
            return Ok(pi);
        }
        let dom = self.spine()?;
        match self.peek() {
            Some(Token::Arrow) => {
                self.advance();
                let cod = self.term()?;
                Ok(Raw::Pi("_".into(), Icit::Expl, Box::new(dom), Box::new(cod)))
            }
            _ => Ok(dom),
        }
    }

    /// Attempt to parse `((x+ : term) | {x+ (: term)?})+ → term`, resetting
    /// the cursor if the tokens turn out not to form pi binders.
    fn try_pi(&mut self) -> Result<Option<Raw>, ParseError> {
        let start = self.pos;
        let mut groups: Vec<BinderGroup> = Vec::new();
        loop {
            match self.peek() {
                Some(Token::LParen) => {
                    let group_start = self.pos;
                    self.advance();
                    let body = self.binder_group_body(false);
                    match body {
                        Ok((names, ann)) if self.peek() == Some(Token::RParen) => {
                            self.advance();
                            groups.push((names, ann, Icit::Expl));
                        }
                        _ => {
                            // Not a binder group, e.g. a parenthesized term.
                            self.pos = group_start;
                            break;
                        }
                    }
                }
                Some(Token::LBrace) => {
                    let group_start = self.pos;
                    self.advance();
                    let body = self.binder_group_body(true);
                    match body {
                        Ok((names, ann)) if self.peek() == Some(Token::RBrace) => {
                            self.advance();
                            groups.push((names, ann, Icit::Impl));
                        }
                        _ => {
                            self.pos = group_start;
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
        if groups.is_empty() || self.peek() != Some(Token::Arrow) {
            self.pos = start;
            return Ok(None);
        }
        self.advance();
        let mut cod = self.term()?;
        for (names, ann, icit) in groups.into_iter().rev() {
            for name in names.into_iter().rev() {
                let dom = ann.clone().unwrap_or(Raw::Hole);
                cod = Raw::Pi(name, icit, Box::new(dom), Box::new(cod));
            }
        }
        Ok(Some(cod))
    }

    fn spine(&mut self) -> Result<Raw, ParseError> {
        let start = self.pos;
        let mut head = self.atom()?;
        loop {
            match self.peek() {
                Some(Token::Ident | Token::Univ | Token::Underscore | Token::LParen) => {
                    let arg = self.atom()?;
                    head = Raw::App(Box::new(head), Box::new(arg), Icit::Expl);
                }
                Some(Token::LBrace) => {
                    self.advance();
                    let arg = self.term()?;
                    self.expect(Token::RBrace)?;
                    head = Raw::App(Box::new(head), Box::new(arg), Icit::Impl);
                }
                _ => break,
            }
            head = self.spanned(start, head);
        }
        Ok(head)
    }

    fn atom(&mut self) -> Result<Raw, ParseError> {
        let start = self.pos;
        match self.advance() {
            Some((Token::Ident, span)) => {
                let raw = Raw::Var(Name::from(&self.src[span]));
                Ok(self.spanned(start, raw))
            }
            Some((Token::Univ, _)) => Ok(Raw::U),
            Some((Token::Underscore, _)) => Ok(self.spanned(start, Raw::Hole)),
            Some((Token::LParen, _)) => {
                let t = self.term()?;
                self.expect(Token::RParen)?;
                Ok(t)
            }
            Some((tok, _)) => {
                self.pos -= 1;
                Err(self.unexpected(tok, "a term"))
            }
            None => Err(ParseError::UnexpectedEof { expected: "a term".to_owned() }),
        }
    }
}
