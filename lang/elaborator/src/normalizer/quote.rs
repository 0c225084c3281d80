//! Reading values back into core terms.

use std::rc::Rc;

use tela_ast::{Lvl, Tm};

use crate::metas::MetaCxt;
use crate::normalizer::eval::{force, force_sp};
use crate::normalizer::val::{Closure, Elim, Head, Val};

/// Re-reify a value at context depth `d`. Binders are read back by applying
/// their closure to the next free variable.
pub fn quote(metas: &MetaCxt, d: Lvl, v: &Rc<Val>) -> Tm {
    let vf = force(metas, v);
    match &*vf {
        Val::Ne(h, sp) => {
            let w = force_sp(metas, *h, sp);
            let Val::Ne(h, sp) = &*w else { unreachable!("re-eliminated neutral lost its head") };
            let head = match h {
                Head::Var(l) => Tm::Var(l.to_ix(d)),
                Head::Meta(m) => Tm::Meta(*m),
            };
            sp.iter().fold(head, |t, e| match e {
                Elim::App(u, i) => {
                    Tm::App(Box::new(t), Box::new(quote(metas, d, u)), *i)
                }
                Elim::AppTel(a, u) => Tm::AppTel(
                    Box::new(quote(metas, d, a)),
                    Box::new(t),
                    Box::new(quote(metas, d, u)),
                ),
                Elim::Proj1 => Tm::Proj1(Box::new(t)),
                Elim::Proj2 => Tm::Proj2(Box::new(t)),
            })
        }
        Val::Pi(x, i, a, b) => Tm::Pi(
            x.clone(),
            *i,
            Box::new(quote(metas, d, a)),
            Box::new(quote_bind(metas, d, b)),
        ),
        Val::Lam(x, i, a, t) => Tm::Lam(
            x.clone(),
            *i,
            Box::new(quote(metas, d, a)),
            Box::new(quote_bind(metas, d, t)),
        ),
        Val::U => Tm::U,
        Val::Tel => Tm::Tel,
        Val::Rec(a) => Tm::Rec(Box::new(quote(metas, d, a))),
        Val::TEmpty => Tm::TEmpty,
        Val::TCons(x, a, b) => Tm::TCons(
            x.clone(),
            Box::new(quote(metas, d, a)),
            Box::new(quote_bind(metas, d, b)),
        ),
        Val::Tempty => Tm::Tempty,
        Val::Tcons(t, u) => {
            Tm::Tcons(Box::new(quote(metas, d, t)), Box::new(quote(metas, d, u)))
        }
        Val::PiTel(x, a, b) => Tm::PiTel(
            x.clone(),
            Box::new(quote(metas, d, a)),
            Box::new(quote_bind(metas, d, b)),
        ),
        Val::LamTel(x, a, t) => Tm::LamTel(
            x.clone(),
            Box::new(quote(metas, d, a)),
            Box::new(quote_bind(metas, d, t)),
        ),
    }
}

fn quote_bind(metas: &MetaCxt, d: Lvl, cl: &Closure) -> Tm {
    quote(metas, d.inc(), &cl.apply(metas, Rc::new(Val::var(d))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::env::Env;
    use crate::normalizer::eval::{Eval, v_app_tel, v_pi_tel};
    use tela_ast::{Icit, Ix};

    fn eval0(metas: &MetaCxt, t: &Tm) -> Rc<Val> {
        t.eval(metas, &Env::new())
    }

    /// `λ A x. x`
    fn id_tm() -> Tm {
        Tm::Lam(
            "A".into(),
            Icit::Expl,
            Box::new(Tm::U),
            Box::new(Tm::Lam(
                "x".into(),
                Icit::Expl,
                Box::new(Tm::Var(Ix(0))),
                Box::new(Tm::Var(Ix(0))),
            )),
        )
    }

    #[test]
    fn quote_of_the_first_variable() {
        // the level/index conversion: quote(1, @0) is Var 0
        let metas = MetaCxt::new();
        assert_eq!(quote(&metas, Lvl(1), &Rc::new(Val::var(Lvl(0)))), Tm::Var(Ix(0)));
    }

    #[test]
    fn closed_terms_round_trip() {
        let metas = MetaCxt::new();
        let t = id_tm();
        assert_eq!(quote(&metas, Lvl(0), &eval0(&metas, &t)), t);
    }

    #[test]
    fn beta_reduction_happens_during_eval() {
        let metas = MetaCxt::new();
        let t = Tm::App(
            Box::new(Tm::App(Box::new(id_tm()), Box::new(Tm::U), Icit::Expl)),
            Box::new(Tm::U),
            Icit::Expl,
        );
        assert_eq!(quote(&metas, Lvl(0), &eval0(&metas, &t)), Tm::U);
    }

    #[test]
    fn empty_telescope_application_vanishes() {
        let metas = MetaCxt::new();
        let v = v_app_tel(
            &metas,
            Rc::new(Val::TEmpty),
            Rc::new(Val::U),
            Rc::new(Val::Tempty),
        );
        assert_eq!(quote(&metas, Lvl(0), &v), Tm::U);
    }

    #[test]
    fn cons_telescope_pi_curries_into_implicit_pi() {
        let metas = MetaCxt::new();
        // Γ : (A : U) ▷ ∙ gives {A : U} → cod
        let dom = Rc::new(Val::TCons(
            "A".into(),
            Rc::new(Val::U),
            Closure::term(Env::new(), Tm::TEmpty),
        ));
        let v = v_pi_tel(&metas, "Γ".into(), dom, Closure::term(Env::new(), Tm::U));
        assert_eq!(
            quote(&metas, Lvl(0), &v),
            Tm::Pi("A".into(), Icit::Impl, Box::new(Tm::U), Box::new(Tm::U))
        );
    }

    #[test]
    fn skipped_environment_slots_are_neutral_variables() {
        let metas = MetaCxt::new();
        let mut env = Env::new();
        env.push_skipped();
        let v = Tm::Var(Ix(0)).eval(&metas, &env);
        assert_eq!(quote(&metas, Lvl(1), &v), Tm::Var(Ix(0)));
    }
}
