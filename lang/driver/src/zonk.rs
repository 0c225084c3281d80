//! Zonking: substituting solved metavariables into an elaborated term.
//!
//! A solved meta applied to a spine is beta-reduced by evaluating the spine
//! and reading the result back, so solutions disappear from the output
//! instead of showing up as redexes. Unsolved metas are left in place.

use std::rc::Rc;

use tela_ast::{Lvl, Tm};
use tela_elaborator::metas::{MetaCxt, MetaEntry};
use tela_elaborator::normalizer::env::Env;
use tela_elaborator::normalizer::eval::{Eval, v_app, v_app_tel};
use tela_elaborator::normalizer::quote::quote;
use tela_elaborator::normalizer::val::Val;

enum SpineHead {
    Solved(Rc<Val>),
    Stuck(Tm),
}

fn zonk_sp(metas: &MetaCxt, env: &Env, t: &Tm) -> SpineHead {
    match t {
        Tm::Meta(m) => match metas.lookup(*m) {
            MetaEntry::Solved(v) => SpineHead::Solved(v.clone()),
            _ => SpineHead::Stuck(Tm::Meta(*m)),
        },
        Tm::App(t, u, i) => match zonk_sp(metas, env, t) {
            SpineHead::Solved(v) => {
                SpineHead::Solved(v_app(metas, v, u.eval(metas, env), *i))
            }
            SpineHead::Stuck(t) => {
                SpineHead::Stuck(Tm::App(Box::new(t), Box::new(zonk(metas, env, u)), *i))
            }
        },
        Tm::AppTel(a, t, u) => match zonk_sp(metas, env, t) {
            SpineHead::Solved(v) => SpineHead::Solved(v_app_tel(
                metas,
                a.eval(metas, env),
                v,
                u.eval(metas, env),
            )),
            SpineHead::Stuck(t) => SpineHead::Stuck(Tm::AppTel(
                Box::new(zonk(metas, env, a)),
                Box::new(t),
                Box::new(zonk(metas, env, u)),
            )),
        },
        t => SpineHead::Stuck(zonk(metas, env, t)),
    }
}

pub fn zonk(metas: &MetaCxt, env: &Env, t: &Tm) -> Tm {
    let d = Lvl(env.len());
    match t {
        Tm::Var(ix) => Tm::Var(*ix),
        Tm::Meta(m) => match metas.lookup(*m) {
            MetaEntry::Solved(v) => quote(metas, d, v),
            _ => Tm::Meta(*m),
        },
        Tm::App(..) | Tm::AppTel(..) => match zonk_sp(metas, env, t) {
            SpineHead::Solved(v) => quote(metas, d, &v),
            SpineHead::Stuck(t) => t,
        },
        Tm::Let(x, a, t, u) => Tm::Let(
            x.clone(),
            Box::new(zonk(metas, env, a)),
            Box::new(zonk(metas, env, t)),
            Box::new(zonk(metas, &env.skipped(), u)),
        ),
        Tm::Pi(x, i, a, b) => Tm::Pi(
            x.clone(),
            *i,
            Box::new(zonk(metas, env, a)),
            Box::new(zonk(metas, &env.skipped(), b)),
        ),
        Tm::Lam(x, i, a, t) => Tm::Lam(
            x.clone(),
            *i,
            Box::new(zonk(metas, env, a)),
            Box::new(zonk(metas, &env.skipped(), t)),
        ),
        Tm::Tel => Tm::Tel,
        Tm::TEmpty => Tm::TEmpty,
        Tm::TCons(x, a, b) => Tm::TCons(
            x.clone(),
            Box::new(zonk(metas, env, a)),
            Box::new(zonk(metas, &env.skipped(), b)),
        ),
        Tm::Rec(a) => Tm::Rec(Box::new(zonk(metas, env, a))),
        Tm::Tempty => Tm::Tempty,
        Tm::Tcons(t, u) => Tm::Tcons(
            Box::new(zonk(metas, env, t)),
            Box::new(zonk(metas, env, u)),
        ),
        Tm::Proj1(t) => Tm::Proj1(Box::new(zonk(metas, env, t))),
        Tm::Proj2(t) => Tm::Proj2(Box::new(zonk(metas, env, t))),
        Tm::PiTel(x, a, b) => Tm::PiTel(
            x.clone(),
            Box::new(zonk(metas, env, a)),
            Box::new(zonk(metas, &env.skipped(), b)),
        ),
        Tm::LamTel(x, a, t) => Tm::LamTel(
            x.clone(),
            Box::new(zonk(metas, env, a)),
            Box::new(zonk(metas, &env.skipped(), t)),
        ),
        Tm::U => Tm::U,
        Tm::Skip(t) => Tm::Skip(Box::new(zonk(metas, &env.skipped(), t))),
    }
}
