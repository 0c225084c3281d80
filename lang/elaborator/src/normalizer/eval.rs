//! Closure-based evaluation to weak-head normal forms.
//!
//! Evaluation is total on well-typed terms; the `unreachable!` cases can
//! only be hit by ill-typed internal terms, which would be a bug in
//! elaboration rather than in user input.

use std::rc::Rc;

use tela_ast::{Icit, MId, Name, Tm};

use crate::metas::{MetaCxt, MetaEntry};
use crate::normalizer::env::Env;
use crate::normalizer::val::{Closure, Elim, Head, Spine, Val};

pub trait Eval {
    fn eval(&self, metas: &MetaCxt, env: &Env) -> Rc<Val>;
}

impl Eval for Tm {
    fn eval(&self, metas: &MetaCxt, env: &Env) -> Rc<Val> {
        match self {
            Tm::Var(ix) => env.lookup(*ix),
            Tm::Let(_, _, t, u) => {
                let vt = t.eval(metas, env);
                u.eval(metas, &env.defined(vt))
            }
            Tm::Pi(x, i, a, b) => Rc::new(Val::Pi(
                x.clone(),
                *i,
                a.eval(metas, env),
                Closure::Term { env: env.clone(), body: Rc::new((**b).clone()) },
            )),
            Tm::Lam(x, i, a, t) => Rc::new(Val::Lam(
                x.clone(),
                *i,
                a.eval(metas, env),
                Closure::Term { env: env.clone(), body: Rc::new((**t).clone()) },
            )),
            Tm::App(t, u, i) => v_app(metas, t.eval(metas, env), u.eval(metas, env), *i),
            Tm::Tel => Rc::new(Val::Tel),
            Tm::TEmpty => Rc::new(Val::TEmpty),
            Tm::TCons(x, a, b) => Rc::new(Val::TCons(
                x.clone(),
                a.eval(metas, env),
                Closure::Term { env: env.clone(), body: Rc::new((**b).clone()) },
            )),
            Tm::Rec(a) => Rc::new(Val::Rec(a.eval(metas, env))),
            Tm::Tempty => Rc::new(Val::Tempty),
            Tm::Tcons(t, u) => Rc::new(Val::Tcons(t.eval(metas, env), u.eval(metas, env))),
            Tm::Proj1(t) => v_proj1(t.eval(metas, env)),
            Tm::Proj2(t) => v_proj2(t.eval(metas, env)),
            Tm::PiTel(x, a, b) => v_pi_tel(
                metas,
                x.clone(),
                a.eval(metas, env),
                Closure::Term { env: env.clone(), body: Rc::new((**b).clone()) },
            ),
            Tm::AppTel(a, t, u) => {
                v_app_tel(metas, a.eval(metas, env), t.eval(metas, env), u.eval(metas, env))
            }
            Tm::LamTel(x, a, t) => v_lam_tel(
                metas,
                x.clone(),
                a.eval(metas, env),
                Closure::Term { env: env.clone(), body: Rc::new((**t).clone()) },
            ),
            Tm::U => Rc::new(Val::U),
            Tm::Meta(m) => v_meta(metas, *m),
            Tm::Skip(t) => t.eval(metas, &env.skipped()),
        }
    }
}

impl Closure {
    pub fn apply(&self, metas: &MetaCxt, v: Rc<Val>) -> Rc<Val> {
        match self {
            Closure::Term { env, body } => body.eval(metas, &env.defined(v)),
            Closure::ConsTail { fst, body } => {
                body.apply(metas, Rc::new(Val::Tcons(fst.clone(), v)))
            }
            Closure::PiTelStep { name, tail, body } => {
                let rest = tail.apply(metas, v.clone());
                v_pi_tel(
                    metas,
                    name.clone(),
                    rest,
                    Closure::ConsTail { fst: v, body: body.clone() },
                )
            }
            Closure::LamTelStep { name, tail, body } => {
                let rest = tail.apply(metas, v.clone());
                v_lam_tel(
                    metas,
                    name.clone(),
                    rest,
                    Closure::ConsTail { fst: v, body: body.clone() },
                )
            }
        }
    }
}

pub fn v_meta(metas: &MetaCxt, m: MId) -> Rc<Val> {
    match metas.lookup(m) {
        MetaEntry::Solved(v) => v.clone(),
        _ => Rc::new(Val::meta(m)),
    }
}

pub fn v_app(metas: &MetaCxt, t: Rc<Val>, u: Rc<Val>, i: Icit) -> Rc<Val> {
    match &*t {
        Val::Lam(_, _, _, cl) => cl.apply(metas, u),
        Val::Ne(h, sp) => {
            let mut sp = sp.clone();
            sp.push(Elim::App(u, i));
            Rc::new(Val::Ne(*h, sp))
        }
        Val::LamTel(x, a, cl) => {
            // the telescope λ must curry into an ordinary λ before an
            // ordinary application can consume it
            let unfolded = v_lam_tel(metas, x.clone(), a.clone(), cl.clone());
            match &*unfolded {
                Val::LamTel(..) => unreachable!("application to a stuck telescope lambda"),
                _ => v_app(metas, unfolded, u, i),
            }
        }
        _ => unreachable!("application of a non-function value"),
    }
}

pub fn v_proj1(v: Rc<Val>) -> Rc<Val> {
    match &*v {
        Val::Tcons(t, _) => t.clone(),
        Val::Ne(h, sp) => {
            let mut sp = sp.clone();
            sp.push(Elim::Proj1);
            Rc::new(Val::Ne(*h, sp))
        }
        _ => unreachable!("first projection of a non-record value"),
    }
}

pub fn v_proj2(v: Rc<Val>) -> Rc<Val> {
    match &*v {
        Val::Tcons(_, u) => u.clone(),
        Val::Ne(h, sp) => {
            let mut sp = sp.clone();
            sp.push(Elim::Proj2);
            Rc::new(Val::Ne(*h, sp))
        }
        _ => unreachable!("second projection of a non-record value"),
    }
}

/// Apply a value to a telescope-typed argument. With an empty telescope the
/// application vanishes; with a cons telescope it unfolds pointwise through
/// the record projections.
pub fn v_app_tel(metas: &MetaCxt, a: Rc<Val>, t: Rc<Val>, u: Rc<Val>) -> Rc<Val> {
    let af = force(metas, &a);
    match &*af {
        Val::TEmpty => t,
        Val::TCons(_, _, rest) => {
            let u1 = v_proj1(u.clone());
            let rest_tel = rest.apply(metas, u1.clone());
            let t1 = v_app(metas, t, u1, Icit::Impl);
            let u2 = v_proj2(u);
            v_app_tel(metas, rest_tel, t1, u2)
        }
        _ => match &*t {
            Val::LamTel(_, _, cl) => cl.apply(metas, u),
            Val::Ne(h, sp) => {
                let mut sp = sp.clone();
                sp.push(Elim::AppTel(af, u));
                Rc::new(Val::Ne(*h, sp))
            }
            _ => unreachable!("telescope application of a non-function value"),
        },
    }
}

/// Smart constructor for the telescope Π: a concrete domain immediately
/// collapses (empty) or curries into an implicit Π (cons).
pub fn v_pi_tel(metas: &MetaCxt, x: Name, a: Rc<Val>, b: Closure) -> Rc<Val> {
    let af = force(metas, &a);
    match &*af {
        Val::TEmpty => b.apply(metas, Rc::new(Val::Tempty)),
        Val::TCons(x1, a1, rest) => Rc::new(Val::Pi(
            x1.clone(),
            Icit::Impl,
            a1.clone(),
            Closure::PiTelStep { name: x, tail: Rc::new(rest.clone()), body: Rc::new(b) },
        )),
        _ => Rc::new(Val::PiTel(x, af, b)),
    }
}

/// Smart constructor for the telescope λ, mirror of [`v_pi_tel`].
pub fn v_lam_tel(metas: &MetaCxt, x: Name, a: Rc<Val>, t: Closure) -> Rc<Val> {
    let af = force(metas, &a);
    match &*af {
        Val::TEmpty => t.apply(metas, Rc::new(Val::Tempty)),
        Val::TCons(x1, a1, rest) => Rc::new(Val::Lam(
            x1.clone(),
            Icit::Impl,
            a1.clone(),
            Closure::LamTelStep { name: x, tail: Rc::new(rest.clone()), body: Rc::new(t) },
        )),
        _ => Rc::new(Val::LamTel(x, af, t)),
    }
}

fn v_apply_elim(metas: &MetaCxt, t: Rc<Val>, e: &Elim) -> Rc<Val> {
    match e {
        Elim::App(u, i) => v_app(metas, t, u.clone(), *i),
        Elim::AppTel(a, u) => v_app_tel(metas, a.clone(), t, u.clone()),
        Elim::Proj1 => v_proj1(t),
        Elim::Proj2 => v_proj2(t),
    }
}

/// Unfold solved metavariables at the head until a concrete former or an
/// unsolved head is exposed. A telescope Π/λ is re-examined because its
/// domain may have become a concrete telescope since it was built.
pub fn force(metas: &MetaCxt, v: &Rc<Val>) -> Rc<Val> {
    match &**v {
        Val::Ne(Head::Meta(m), sp) => match metas.lookup(*m) {
            MetaEntry::Solved(sol) => {
                let mut t = sol.clone();
                for e in sp.iter() {
                    t = v_apply_elim(metas, t, e);
                }
                force(metas, &t)
            }
            _ => v.clone(),
        },
        Val::PiTel(x, a, b) => {
            let w = v_pi_tel(metas, x.clone(), a.clone(), b.clone());
            match &*w {
                Val::PiTel(..) => w,
                _ => force(metas, &w),
            }
        }
        Val::LamTel(x, a, t) => {
            let w = v_lam_tel(metas, x.clone(), a.clone(), t.clone());
            match &*w {
                Val::LamTel(..) => w,
                _ => force(metas, &w),
            }
        }
        _ => v.clone(),
    }
}

/// Re-eliminate a whole neutral through the smart application functions.
/// This collapses telescope applications whose stored domain has become
/// concrete, which plain [`force`] cannot see under an unsolved head.
pub fn force_sp(metas: &MetaCxt, h: Head, sp: &Spine) -> Rc<Val> {
    let mut t = match h {
        Head::Meta(m) => v_meta(metas, m),
        Head::Var(l) => Rc::new(Val::var(l)),
    };
    for e in sp.iter() {
        t = v_apply_elim(metas, t, e);
    }
    force(metas, &t)
}
