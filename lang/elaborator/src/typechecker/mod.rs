//! Bidirectional elaboration.
//!
//! For checking we use the syntax
//!
//! ```text
//! Γ ⊢ t ⇐ A
//! ```
//!
//! and for inference
//!
//! ```text
//! Γ ⊢ t ⇒ A
//! ```
//!
//! where `Γ` is the elaboration context and `A` a value. Both directions
//! insert implicit arguments and implicit lambdas; checking against an
//! unknown (meta-headed) type additionally inserts a telescope lambda whose
//! domain is decided later by a constancy constraint.

use std::rc::Rc;

use log::trace;

use tela_ast::{Icit, Name, Raw, Tm};

use crate::ctx::{Cxt, NameOrigin};
use crate::metas::MetaCxt;
use crate::normalizer::eval::{Eval, force, v_pi_tel};
use crate::normalizer::quote::quote;
use crate::normalizer::val::{Closure, Head, Val};
use crate::result::ElabError;
use crate::unification::constancy::new_constancy;
use crate::unification::unify;

type Infer = (Tm, Rc<Val>);

/// Unify, decorating a failure with the caller's original sides.
fn unify_while(
    metas: &mut MetaCxt,
    cxt: &Cxt,
    l: &Rc<Val>,
    r: &Rc<Val>,
) -> Result<(), ElabError> {
    let lhs = quote(metas, cxt.len(), l);
    let rhs = quote(metas, cxt.len(), r);
    unify(metas, cxt, l, r).map_err(|source| ElabError::UnifyErrorWhile {
        names: cxt.names.clone(),
        lhs,
        rhs,
        source,
        span: None,
    })
}

/// Insert fresh implicit applications while the type is an implicit Π.
fn insert_metas(metas: &mut MetaCxt, cxt: &Cxt, (mut t, mut va): Infer) -> Infer {
    loop {
        match &*force(metas, &va) {
            Val::Pi(_, Icit::Impl, dom, cod) => {
                let m_tm = cxt.fresh_meta(metas, dom);
                let m_val = m_tm.eval(metas, &cxt.env);
                t = Tm::App(Box::new(t), Box::new(m_tm), Icit::Impl);
                va = cod.apply(metas, m_val);
            }
            _ => break,
        }
    }
    (t, va)
}

/// Like [`insert_metas`], but a term which is itself an implicit lambda is
/// left unpeeled.
fn insert(metas: &mut MetaCxt, cxt: &Cxt, res: Infer) -> Infer {
    match &res.0 {
        Tm::Lam(_, Icit::Impl, _, _) => res,
        _ => insert_metas(metas, cxt, res),
    }
}

pub fn check(metas: &mut MetaCxt, cxt: &Cxt, t: &Raw, a: &Rc<Val>) -> Result<Tm, ElabError> {
    let af = force(metas, a);
    trace!("⊢ ⇐ {}", cxt.show_val(metas, &af));
    match (t, &*af) {
        (Raw::SrcPos(span, t), _) => {
            check(metas, cxt, t, &af).map_err(|e| e.with_span(*span))
        }
        (Raw::Lam(x, ann, i, body), Val::Pi(_, i2, dom, cod)) if i == i2 => {
            let ann_tm = match ann {
                Some(ann) => {
                    let ann_tm = check(metas, cxt, ann, &Rc::new(Val::U))?;
                    let ann_val = ann_tm.eval(metas, &cxt.env);
                    unify_while(metas, cxt, &ann_val, dom)?;
                    ann_tm
                }
                None => quote(metas, cxt.len(), dom),
            };
            let var = Rc::new(Val::var(cxt.len()));
            let cxt2 = cxt.bind(x.clone(), NameOrigin::Source, dom.clone());
            let body_tm = check(metas, &cxt2, body, &cod.apply(metas, var))?;
            Ok(Tm::Lam(x.clone(), *i, Box::new(ann_tm), Box::new(body_tm)))
        }
        (t, Val::Pi(x, Icit::Impl, dom, cod)) => {
            // the term is not an implicit lambda: insert one
            let var = Rc::new(Val::var(cxt.len()));
            let cxt2 = cxt.bind(x.clone(), NameOrigin::Inserted, dom.clone());
            let body_tm = check(metas, &cxt2, t, &cod.apply(metas, var))?;
            Ok(Tm::Lam(
                x.clone(),
                Icit::Impl,
                Box::new(quote(metas, cxt.len(), dom)),
                Box::new(body_tm),
            ))
        }
        (t, Val::Ne(Head::Meta(_), _)) => {
            // the expected type is unknown: insert a telescope lambda and
            // let constancy decide whether its domain survives
            let x: Name = format!("Γ{}", metas.next_mid().0).into();
            let dom_tm = cxt.fresh_meta(metas, &Rc::new(Val::Tel));
            let dom_val = dom_tm.eval(metas, &cxt.env);
            let cxt2 = cxt.bind(x.clone(), NameOrigin::Inserted, Rc::new(Val::Rec(dom_val.clone())));
            let inferred = infer(metas, &cxt2, t)?;
            let (body_tm, body_ty) = insert(metas, &cxt2, inferred);
            let body_cl = cxt.lift_val(metas, &body_ty);
            new_constancy(metas, cxt, &dom_val, &body_cl)?;
            let lhs = v_pi_tel(metas, x.clone(), dom_val, body_cl);
            unify_while(metas, cxt, &af, &lhs)?;
            Ok(Tm::LamTel(x, Box::new(dom_tm), Box::new(body_tm)))
        }
        (Raw::Let(x, a, t, u), _) => {
            let a_tm = check(metas, cxt, a, &Rc::new(Val::U))?;
            let va = a_tm.eval(metas, &cxt.env);
            let t_tm = check(metas, cxt, t, &va)?;
            let vt = t_tm.eval(metas, &cxt.env);
            let cxt2 = cxt.define(x.clone(), va, vt);
            let u_tm = check(metas, &cxt2, u, &af)?;
            Ok(Tm::Let(x.clone(), Box::new(a_tm), Box::new(t_tm), Box::new(u_tm)))
        }
        (Raw::Hole, _) => Ok(cxt.fresh_meta(metas, &af)),
        _ => {
            let inferred = infer(metas, cxt, t)?;
            let (t_tm, va) = insert(metas, cxt, inferred);
            unify_while(metas, cxt, &va, &af)?;
            Ok(t_tm)
        }
    }
}

pub fn infer(metas: &mut MetaCxt, cxt: &Cxt, t: &Raw) -> Result<Infer, ElabError> {
    match t {
        Raw::SrcPos(span, t) => infer(metas, cxt, t).map_err(|e| e.with_span(*span)),
        Raw::U => Ok((Tm::U, Rc::new(Val::U))),
        Raw::Var(x) => {
            let entries = cxt
                .names
                .iter()
                .zip(cxt.origins.iter())
                .zip(cxt.types.iter())
                .rev()
                .enumerate();
            for (i, ((name, origin), entry)) in entries {
                let visible = *origin == NameOrigin::Source
                    && (**name == **x
                        || name.strip_prefix('*').is_some_and(|stripped| *stripped == **x));
                if visible {
                    trace!("⊢ {x} ⇒ {}", cxt.show_val(metas, entry.ty()));
                    return Ok((Tm::Var(tela_ast::Ix(i)), entry.ty().clone()));
                }
            }
            Err(ElabError::NameNotInScope { name: x.clone(), span: None })
        }
        Raw::Pi(x, i, a, b) => {
            let a_tm = check(metas, cxt, a, &Rc::new(Val::U))?;
            let va = a_tm.eval(metas, &cxt.env);
            let cxt2 = cxt.bind(x.clone(), NameOrigin::Source, va);
            let b_tm = check(metas, &cxt2, b, &Rc::new(Val::U))?;
            Ok((
                Tm::Pi(x.clone(), *i, Box::new(a_tm), Box::new(b_tm)),
                Rc::new(Val::U),
            ))
        }
        Raw::App(t, u, i) => {
            let head = infer(metas, cxt, t)?;
            let (t_tm, t_ty) = match i {
                Icit::Expl => insert_metas(metas, cxt, head),
                Icit::Impl => head,
            };
            let (dom, cod) = ensure_fun(metas, cxt, &t_ty, *i)?;
            let u_tm = check(metas, cxt, u, &dom)?;
            let u_val = u_tm.eval(metas, &cxt.env);
            Ok((
                Tm::App(Box::new(t_tm), Box::new(u_tm), *i),
                cod.apply(metas, u_val),
            ))
        }
        Raw::Lam(x, ann, i, body) => {
            let a_tm = match ann {
                Some(ann) => check(metas, cxt, ann, &Rc::new(Val::U))?,
                None => cxt.fresh_meta(metas, &Rc::new(Val::U)),
            };
            let va = a_tm.eval(metas, &cxt.env);
            let cxt2 = cxt.bind(x.clone(), NameOrigin::Source, va.clone());
            let inferred = infer(metas, &cxt2, body)?;
            let (body_tm, body_ty) = insert(metas, &cxt2, inferred);
            let body_cl = cxt.lift_val(metas, &body_ty);
            Ok((
                Tm::Lam(x.clone(), *i, Box::new(a_tm), Box::new(body_tm)),
                Rc::new(Val::Pi(x.clone(), *i, va, body_cl)),
            ))
        }
        Raw::Hole => {
            let a_tm = cxt.fresh_meta(metas, &Rc::new(Val::U));
            let va = a_tm.eval(metas, &cxt.env);
            let t_tm = cxt.fresh_meta(metas, &va);
            Ok((t_tm, va))
        }
        Raw::Let(x, a, t, u) => {
            let a_tm = check(metas, cxt, a, &Rc::new(Val::U))?;
            let va = a_tm.eval(metas, &cxt.env);
            let t_tm = check(metas, cxt, t, &va)?;
            let vt = t_tm.eval(metas, &cxt.env);
            let cxt2 = cxt.define(x.clone(), va, vt);
            let (u_tm, ub) = infer(metas, &cxt2, u)?;
            Ok((
                Tm::Let(x.clone(), Box::new(a_tm), Box::new(t_tm), Box::new(u_tm)),
                ub,
            ))
        }
    }
}

/// Make a function type available for an application: unify the type
/// against a Π built from two fresh metas.
#[cfg(not(feature = "strict-app-inference"))]
fn ensure_fun(
    metas: &mut MetaCxt,
    cxt: &Cxt,
    t_ty: &Rc<Val>,
    i: Icit,
) -> Result<(Rc<Val>, Closure), ElabError> {
    fresh_fun_ty(metas, cxt, t_ty, i)
}

/// Make a function type available for an application by matching on the
/// forced head. More precise errors, less complete inference.
#[cfg(feature = "strict-app-inference")]
fn ensure_fun(
    metas: &mut MetaCxt,
    cxt: &Cxt,
    t_ty: &Rc<Val>,
    i: Icit,
) -> Result<(Rc<Val>, Closure), ElabError> {
    match &*force(metas, t_ty) {
        Val::Pi(_, i2, dom, cod) => {
            if *i2 != i {
                return Err(ElabError::IcitMismatch { expected: *i2, got: i, span: None });
            }
            Ok((dom.clone(), cod.clone()))
        }
        Val::Ne(Head::Meta(_), _) => fresh_fun_ty(metas, cxt, t_ty, i),
        _ => Err(ElabError::ExpectedFunction {
            got: cxt.show_val(metas, t_ty),
            span: None,
        }),
    }
}

fn fresh_fun_ty(
    metas: &mut MetaCxt,
    cxt: &Cxt,
    t_ty: &Rc<Val>,
    i: Icit,
) -> Result<(Rc<Val>, Closure), ElabError> {
    let dom_tm = cxt.fresh_meta(metas, &Rc::new(Val::U));
    let dom_val = dom_tm.eval(metas, &cxt.env);
    let cxt2 = cxt.bind("x".into(), NameOrigin::Inserted, dom_val.clone());
    let cod_tm = cxt2.fresh_meta(metas, &Rc::new(Val::U));
    let cod_cl = Closure::term(cxt.env.clone(), cod_tm);
    let fun = Rc::new(Val::Pi("x".into(), i, dom_val.clone(), cod_cl.clone()));
    unify_while(metas, cxt, t_ty, &fun)?;
    Ok((dom_val, cod_cl))
}

/// Infer a term whose leading lambdas are treated as postulates: their
/// context names are starred so that ordinary variable lookup still finds
/// them, and the elaborated term is still a nest of ordinary lambdas.
pub fn infer_top_lams(metas: &mut MetaCxt, cxt: &Cxt, t: &Raw) -> Result<Infer, ElabError> {
    match t {
        Raw::SrcPos(span, t) => {
            infer_top_lams(metas, cxt, t).map_err(|e| e.with_span(*span))
        }
        Raw::Lam(x, ann, i, body) => {
            let a_tm = match ann {
                Some(ann) => check(metas, cxt, ann, &Rc::new(Val::U))?,
                None => cxt.fresh_meta(metas, &Rc::new(Val::U)),
            };
            let va = a_tm.eval(metas, &cxt.env);
            let starred: Name = format!("*{x}").into();
            let cxt2 = cxt.bind(starred, NameOrigin::Source, va.clone());
            let (body_tm, body_ty) = infer_top_lams(metas, &cxt2, body)?;
            let body_cl = cxt.lift_val(metas, &body_ty);
            Ok((
                Tm::Lam(x.clone(), *i, Box::new(a_tm), Box::new(body_tm)),
                Rc::new(Val::Pi(x.clone(), *i, va, body_cl)),
            ))
        }
        t => {
            let inferred = infer(metas, cxt, t)?;
            Ok(insert(metas, cxt, inferred))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metas::MetaEntry;
    use crate::normalizer::env::Env;
    use tela_ast::{Ix, Lvl};

    fn eval0(metas: &MetaCxt, t: &Tm) -> Rc<Val> {
        t.eval(metas, &Env::new())
    }

    /// `{A : U} → A → A`
    fn impl_id_ty() -> Tm {
        Tm::Pi(
            "A".into(),
            Icit::Impl,
            Box::new(Tm::U),
            Box::new(Tm::Pi(
                "x".into(),
                Icit::Expl,
                Box::new(Tm::Var(Ix(0))),
                Box::new(Tm::Var(Ix(1))),
            )),
        )
    }

    fn raw_id() -> Raw {
        Raw::Lam("x".into(), None, Icit::Expl, Box::new(Raw::Var("x".into())))
    }

    #[test]
    fn checking_id_against_implicit_pi_inserts_the_lambda() {
        let mut metas = MetaCxt::new();
        let cxt = Cxt::empty();
        let expected = eval0(&metas, &impl_id_ty());
        let tm = check(&mut metas, &cxt, &raw_id(), &expected).unwrap();
        let want = Tm::Lam(
            "A".into(),
            Icit::Impl,
            Box::new(Tm::U),
            Box::new(Tm::Lam(
                "x".into(),
                Icit::Expl,
                Box::new(Tm::Var(Ix(0))),
                Box::new(Tm::Var(Ix(0))),
            )),
        );
        assert_eq!(tm, want);
    }

    #[test]
    fn unknown_variable_is_reported() {
        let mut metas = MetaCxt::new();
        let cxt = Cxt::empty();
        let res = infer(&mut metas, &cxt, &Raw::Var("nope".into()));
        assert!(matches!(res, Err(ElabError::NameNotInScope { .. })));
    }

    #[test]
    fn universe_infers_universe() {
        let mut metas = MetaCxt::new();
        let cxt = Cxt::empty();
        let (tm, ty) = infer(&mut metas, &cxt, &Raw::U).unwrap();
        assert_eq!(tm, Tm::U);
        assert_eq!(quote(&metas, Lvl(0), &ty), Tm::U);
    }

    #[test]
    fn top_level_lambdas_become_postulates() {
        // λ A x. x  ⇒  (A : ?0) → (x : ?1 A) → ?1 A
        let mut metas = MetaCxt::new();
        let cxt = Cxt::empty();
        let raw = Raw::Lam(
            "A".into(),
            None,
            Icit::Expl,
            Box::new(Raw::Lam(
                "x".into(),
                None,
                Icit::Expl,
                Box::new(Raw::Var("x".into())),
            )),
        );
        let (tm, ty) = infer_top_lams(&mut metas, &cxt, &raw).unwrap();
        let Tm::Lam(a, Icit::Expl, _, body) = tm else { panic!("expected a lambda") };
        assert_eq!(&*a, "A");
        let Tm::Lam(x, Icit::Expl, _, body) = *body else { panic!("expected a lambda") };
        assert_eq!(&*x, "x");
        assert_eq!(*body, Tm::Var(Ix(0)));
        let ty = quote(&metas, Lvl(0), &ty);
        assert_eq!(
            ty.print_to_string(&mut tela_ast::NameCtx::empty(), None),
            "(A : ?0) → (x : ?1 A) → ?1 A"
        );
    }

    #[test]
    fn checking_against_a_meta_inserts_a_telescope_lambda() {
        let mut metas = MetaCxt::new();
        let cxt = Cxt::empty();
        let hole = cxt.fresh_meta(&mut metas, &Rc::new(Val::U));
        let expected = eval0(&metas, &hole);
        let tm = check(&mut metas, &cxt, &raw_id(), &expected).unwrap();
        assert!(matches!(tm, Tm::LamTel(..)), "got {tm:?}");
    }

    #[test]
    fn blocked_constancy_indexes_are_bidirectional() {
        // checking λ x. x against an unknown type leaves a constancy
        // constraint blocked on the lambda's domain meta
        let mut metas = MetaCxt::new();
        let cxt = Cxt::empty();
        let hole = cxt.fresh_meta(&mut metas, &Rc::new(Val::U));
        let expected = eval0(&metas, &hole);
        check(&mut metas, &cxt, &raw_id(), &expected).unwrap();

        let mut seen_constancy = false;
        for (m, entry) in metas.iter() {
            match entry {
                MetaEntry::Unsolved { blockers, .. } => {
                    for c in blockers {
                        let Some(MetaEntry::Constancy { blockers: cb, .. }) = metas.get(*c) else {
                            panic!("blocker {c} of {m} is not a constancy constraint");
                        };
                        assert!(cb.contains(&m), "constancy {c} does not index {m}");
                    }
                }
                MetaEntry::Constancy { blockers, .. } => {
                    seen_constancy = true;
                    for b in blockers {
                        let Some(MetaEntry::Unsolved { blockers: ub, .. }) = metas.get(*b) else {
                            panic!("constancy {m} blocked on non-open meta {b}");
                        };
                        assert!(ub.contains(&m), "meta {b} does not index constancy {m}");
                    }
                }
                MetaEntry::Solved(_) => {}
            }
        }
        assert!(seen_constancy, "no constancy constraint was created");
    }
}
