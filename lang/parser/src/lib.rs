mod grammar;
pub mod lexer;
mod result;

pub use grammar::Parser;
pub use result::ParseError;

use tela_ast::Raw;

/// Parse a single surface term.
pub fn parse_term(src: &str) -> Result<Raw, ParseError> {
    Parser::new(src)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tela_ast::{Icit, Raw};

    fn strip(raw: &Raw) -> &Raw {
        match raw {
            Raw::SrcPos(_, inner) => strip(inner),
            raw => raw,
        }
    }

    #[test]
    fn parses_lambda() {
        let raw = parse_term("λ x. x").unwrap();
        let Raw::Lam(x, None, Icit::Expl, body) = strip(&raw) else {
            panic!("expected lambda")
        };
        assert_eq!(&**x, "x");
        let Raw::Var(y) = strip(body) else { panic!("expected variable") };
        assert_eq!(&**y, "x");
    }

    #[test]
    fn parses_ascii_lambda_and_arrow() {
        let raw = parse_term("\\x. U -> U").unwrap();
        let Raw::Lam(_, None, Icit::Expl, body) = strip(&raw) else {
            panic!("expected lambda")
        };
        let Raw::Pi(x, Icit::Expl, dom, cod) = strip(body) else { panic!("expected pi") };
        assert_eq!(&**x, "_");
        assert!(matches!(strip(dom), Raw::U));
        assert!(matches!(strip(cod), Raw::U));
    }

    #[test]
    fn parses_implicit_binder_group() {
        let raw = parse_term("{A B} → A → B → A").unwrap();
        let Raw::Pi(a, Icit::Impl, dom_a, rest) = strip(&raw) else { panic!("expected pi") };
        assert_eq!(&**a, "A");
        assert!(matches!(strip(dom_a), Raw::Hole));
        let Raw::Pi(b, Icit::Impl, _, _) = strip(rest) else { panic!("expected nested pi") };
        assert_eq!(&**b, "B");
    }

    #[test]
    fn parses_annotated_pi_binder() {
        let raw = parse_term("(A : U) → A").unwrap();
        let Raw::Pi(a, Icit::Expl, dom, cod) = strip(&raw) else { panic!("expected pi") };
        assert_eq!(&**a, "A");
        assert!(matches!(strip(dom), Raw::U));
        assert!(matches!(strip(cod), Raw::Var(_)));
    }

    #[test]
    fn grouped_domain_is_not_a_binder() {
        let raw = parse_term("(U → U) → U").unwrap();
        let Raw::Pi(x, Icit::Expl, dom, _) = strip(&raw) else { panic!("expected pi") };
        assert_eq!(&**x, "_");
        assert!(matches!(strip(dom), Raw::Pi(..)));
    }

    #[test]
    fn parses_let_without_annotation() {
        let raw = parse_term("let f = λ x. x in f").unwrap();
        let Raw::Let(f, ann, _, body) = strip(&raw) else { panic!("expected let") };
        assert_eq!(&**f, "f");
        assert!(matches!(strip(ann), Raw::Hole));
        assert!(matches!(strip(body), Raw::Var(_)));
    }

    #[test]
    fn parses_implicit_application() {
        let raw = parse_term("f {U} x").unwrap();
        let Raw::App(fu, x, Icit::Expl) = strip(&raw) else { panic!("expected application") };
        assert!(matches!(strip(x), Raw::Var(_)));
        let Raw::App(f, u, Icit::Impl) = strip(fu) else { panic!("expected implicit app") };
        assert!(matches!(strip(f), Raw::Var(_)));
        assert!(matches!(strip(u), Raw::U));
    }

    #[test]
    fn rejects_unclosed_paren() {
        assert!(parse_term("(λ x. x").is_err());
    }

    #[test]
    fn rejects_stray_token() {
        assert!(parse_term("λ x. x x )").is_err());
    }

    #[test]
    fn rejects_unknown_character() {
        assert!(matches!(parse_term("f # x"), Err(ParseError::InvalidToken { .. })));
    }
}
