use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"--[^\n\r]*")]
pub enum Token {
    // Keywords
    //
    //
    #[token("let", priority = 10)]
    Let,
    #[token("in", priority = 10)]
    In,
    #[token("U", priority = 10)]
    Univ,

    // Parens and Braces
    //
    //
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // Symbols
    //
    //
    #[token("λ")]
    #[token("\\")]
    Lambda,
    #[token("→")]
    #[token("->")]
    Arrow,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token("=")]
    Eq,
    #[token("_")]
    Underscore,

    // Names
    //
    //
    #[regex(r"[a-zA-Z][a-zA-Z0-9'_]*")]
    Ident,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Token::Let => "let",
            Token::In => "in",
            Token::Univ => "U",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Lambda => "λ",
            Token::Arrow => "→",
            Token::Dot => ".",
            Token::Colon => ":",
            Token::Eq => "=",
            Token::Underscore => "_",
            Token::Ident => "identifier",
        };
        write!(f, "{s}")
    }
}
