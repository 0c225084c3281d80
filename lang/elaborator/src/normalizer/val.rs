use std::rc::Rc;

use tela_ast::{Icit, Lvl, MId, Name, Tm};

use crate::normalizer::env::Env;

/// The head of a neutral value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Head {
    Var(Lvl),
    Meta(MId),
}

/// One eliminator applied to a neutral head.
#[derive(Debug, Clone)]
pub enum Elim {
    App(Rc<Val>, Icit),
    /// Telescope application; carries the telescope-domain type so the
    /// application can unfold once the telescope becomes concrete.
    AppTel(Rc<Val>, Rc<Val>),
    Proj1,
    Proj2,
}

/// The eliminators applied to a neutral head, first-applied first.
#[derive(Debug, Clone, Default)]
pub struct Spine(Vec<Elim>);

impl Spine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, e: Elim) {
        self.0.push(e);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Elim> {
        self.0.iter()
    }
}

/// Weak-head normal forms. Binders carry closures which are applied with
/// [`Closure::apply`].
#[derive(Debug, Clone)]
pub enum Val {
    Ne(Head, Spine),
    Pi(Name, Icit, Rc<Val>, Closure),
    Lam(Name, Icit, Rc<Val>, Closure),
    U,
    Tel,
    Rec(Rc<Val>),
    TEmpty,
    TCons(Name, Rc<Val>, Closure),
    Tempty,
    Tcons(Rc<Val>, Rc<Val>),
    PiTel(Name, Rc<Val>, Closure),
    LamTel(Name, Rc<Val>, Closure),
}

pub type VTy = Val;

impl Val {
    pub fn var(l: Lvl) -> Val {
        Val::Ne(Head::Var(l), Spine::new())
    }

    pub fn meta(m: MId) -> Val {
        Val::Ne(Head::Meta(m), Spine::new())
    }
}

/// A binder body. The basic form is a term paired with its captured
/// environment; the remaining forms arise when unification and evaluation
/// need to compose binders without a syntactic body, while currying a
/// telescope binder into implicit functions.
#[derive(Debug, Clone)]
pub enum Closure {
    /// Evaluate `body` in `env` extended by the argument.
    Term { env: Env, body: Rc<Tm> },
    /// `|rest| body (Tcons fst rest)`: fixes the first entry of a telescope
    /// binder.
    ConsTail { fst: Rc<Val>, body: Rc<Closure> },
    /// `|u| v_pi_tel(name, tail u, |rest| body (Tcons u rest))`: one step of
    /// currying a telescope Π.
    PiTelStep { name: Name, tail: Rc<Closure>, body: Rc<Closure> },
    /// Like `PiTelStep`, for a telescope λ.
    LamTelStep { name: Name, tail: Rc<Closure>, body: Rc<Closure> },
}

impl Closure {
    /// The basic term-in-environment closure.
    pub fn term(env: Env, body: Tm) -> Closure {
        Closure::Term { env, body: Rc::new(body) }
    }
}
