use std::sync::Arc;

use tela_miette_util::codespan::Span;

use crate::idx::{Ix, MId};

pub type Name = Arc<str>;

/// Whether an argument is written by the user (explicit) or may be inserted
/// by elaboration (implicit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icit {
    Impl,
    Expl,
}

impl std::fmt::Display for Icit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Icit::Impl => write!(f, "implicit"),
            Icit::Expl => write!(f, "explicit"),
        }
    }
}

/// Surface syntax, produced by the parser. Variables are named; binding
/// structure is resolved during elaboration.
#[derive(Debug, Clone)]
pub enum Raw {
    Var(Name),
    /// Lambda with an optional domain annotation.
    Lam(Name, Option<Box<Raw>>, Icit, Box<Raw>),
    App(Box<Raw>, Box<Raw>, Icit),
    U,
    Pi(Name, Icit, Box<Raw>, Box<Raw>),
    /// `let x : a = t in u`; a missing surface annotation parses as a hole.
    Let(Name, Box<Raw>, Box<Raw>, Box<Raw>),
    Hole,
    /// Source position wrapper installed by the parser, used to tag thrown
    /// elaboration errors.
    SrcPos(Span, Box<Raw>),
}

impl Raw {
    /// The position of the outermost wrapper node, if any.
    pub fn span(&self) -> Option<Span> {
        match self {
            Raw::SrcPos(span, _) => Some(*span),
            _ => None,
        }
    }
}

pub type Ty = Tm;

/// Core syntax. Every binder is annotated and variables are de Bruijn
/// indices. The telescope formers have the following typing rules:
///
/// ```text
/// Tel    : U
/// TEmpty : Tel
/// TCons  : (A : U) → (A → Tel) → Tel
/// Rec    : Tel → U
/// Tempty : Rec TEmpty
/// Tcons  : (t : A) → Rec (B t) → Rec (TCons A B)
/// PiTel  : (A : Tel) → (Rec A → U) → U
/// ```
///
/// `AppTel` stores the telescope-domain type of the function so that
/// evaluation can unfold the application when the telescope becomes
/// concrete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tm {
    Var(Ix),
    Let(Name, Box<Ty>, Box<Tm>, Box<Tm>),
    Pi(Name, Icit, Box<Ty>, Box<Ty>),
    Lam(Name, Icit, Box<Ty>, Box<Tm>),
    App(Box<Tm>, Box<Tm>, Icit),
    Tel,
    TEmpty,
    TCons(Name, Box<Ty>, Box<Ty>),
    Rec(Box<Tm>),
    Tempty,
    Tcons(Box<Tm>, Box<Tm>),
    Proj1(Box<Tm>),
    Proj2(Box<Tm>),
    PiTel(Name, Box<Ty>, Box<Ty>),
    AppTel(Box<Ty>, Box<Tm>, Box<Tm>),
    LamTel(Name, Box<Ty>, Box<Tm>),
    U,
    Meta(MId),
    /// Explicit strengthening past a bound variable. Only produced while
    /// closing the type of a fresh metavariable over a context with
    /// let-bound entries; eliminated by evaluation.
    Skip(Box<Tm>),
}
