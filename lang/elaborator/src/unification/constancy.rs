//! Constancy constraints: deciding whether an inserted telescope is empty.
//!
//! A constraint over `(cxt, dom, cod)` is discharged when the codomain's use
//! of the telescope-bound variable becomes known: no use at all forces the
//! telescope empty, a rigid use keeps it. Uses that only happen inside the
//! spines of unsolved metas postpone the decision; the constraint then
//! subscribes to those metas and is retried when one of them is solved.

use std::rc::Rc;

use fxhash::FxHashSet;

use log::trace;

use tela_ast::{Lvl, MId};

use crate::ctx::Cxt;
use crate::metas::{MetaCxt, MetaEntry};
use crate::normalizer::eval::{force, force_sp};
use crate::normalizer::val::{Closure, Elim, Head, Val};
use crate::result::UnifyError;
use crate::unification::unify;

/// Classification of the occurrences of a bound level in a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Occurs {
    None,
    /// At least one occurrence outside any metavariable spine.
    Rigid,
    /// All occurrences are inside the spines of these metas.
    Flex(FxHashSet<MId>),
}

impl Occurs {
    fn plus(self, other: Occurs) -> Occurs {
        match (self, other) {
            (Occurs::Rigid, _) | (_, Occurs::Rigid) => Occurs::Rigid,
            (Occurs::None, o) | (o, Occurs::None) => o,
            (Occurs::Flex(mut a), Occurs::Flex(b)) => {
                a.extend(b);
                Occurs::Flex(a)
            }
        }
    }
}

/// Classify the occurrences of the level `x` in `v` at depth `d`. Runs on
/// values: only forced values expose which occurrences sit under meta
/// spines.
pub fn occurs(metas: &MetaCxt, d: Lvl, x: Lvl, v: &Rc<Val>) -> Occurs {
    let go = |v: &Rc<Val>| occurs(metas, d, x, v);
    let go_bind = |cl: &Closure| {
        occurs(metas, d.inc(), x, &cl.apply(metas, Rc::new(Val::var(d))))
    };

    let vf = force(metas, v);
    match &*vf {
        Val::Ne(h, sp) => {
            let w = force_sp(metas, *h, sp);
            let Val::Ne(h, sp) = &*w else { unreachable!("re-eliminated neutral lost its head") };
            let sp_occ = sp.iter().fold(Occurs::None, |acc, e| {
                acc.plus(match e {
                    Elim::App(u, _) => go(u),
                    Elim::AppTel(a, u) => go(a).plus(go(u)),
                    Elim::Proj1 | Elim::Proj2 => Occurs::None,
                })
            });
            match h {
                Head::Var(y) => {
                    let head_occ = if *y == x { Occurs::Rigid } else { Occurs::None };
                    head_occ.plus(sp_occ)
                }
                Head::Meta(m) => match sp_occ {
                    Occurs::None => Occurs::None,
                    Occurs::Rigid => {
                        let mut ms = FxHashSet::default();
                        ms.insert(*m);
                        Occurs::Flex(ms)
                    }
                    Occurs::Flex(mut ms) => {
                        ms.insert(*m);
                        Occurs::Flex(ms)
                    }
                },
            }
        }
        Val::Pi(_, _, a, b) => go(a).plus(go_bind(b)),
        Val::Lam(_, _, a, t) => go(a).plus(go_bind(t)),
        Val::U | Val::Tel | Val::TEmpty | Val::Tempty => Occurs::None,
        Val::Rec(a) => go(a),
        Val::TCons(_, a, b) => go(a).plus(go_bind(b)),
        Val::Tcons(t, u) => go(t).plus(go(u)),
        Val::PiTel(_, a, b) => go(a).plus(go_bind(b)),
        Val::LamTel(_, a, t) => go(a).plus(go_bind(t)),
    }
}

/// Retry a constancy constraint. Clears the constraint's old subscriptions,
/// reclassifies the codomain's use of the telescope variable and either
/// discharges the constraint or re-subscribes it.
pub fn try_constancy(metas: &mut MetaCxt, constm: MId) -> Result<(), UnifyError> {
    let Some(entry) = metas.get(constm) else {
        // discharged while another blocker of the same solve was retried
        return Ok(());
    };
    let (cxt, dom, cod, blockers) = match entry {
        MetaEntry::Constancy { cxt, dom, cod, blockers } => {
            (cxt.clone(), dom.clone(), cod.clone(), blockers.clone())
        }
        _ => unreachable!("retried a non-constancy entry"),
    };

    for m in blockers {
        metas.modify(m, |entry| {
            if let MetaEntry::Unsolved { blockers, .. } = entry {
                blockers.remove(&constm);
            }
        });
    }

    match occurs(metas, cxt.len().inc(), cxt.len(), &cod) {
        Occurs::None => {
            trace!("constancy {constm}: unused, telescope collapses");
            unify(metas, &cxt, &dom, &Rc::new(Val::TEmpty))?;
            metas.remove(constm);
        }
        Occurs::Rigid => {
            trace!("constancy {constm}: rigid use, telescope kept");
            metas.remove(constm);
        }
        Occurs::Flex(ms) => {
            trace!("constancy {constm}: flexible use, blocked on {ms:?}");
            for m in &ms {
                metas.modify(*m, |entry| {
                    if let MetaEntry::Unsolved { blockers, .. } = entry {
                        blockers.insert(constm);
                    }
                });
            }
            metas.write(constm, MetaEntry::Constancy { cxt, dom, cod, blockers: ms });
        }
    }
    Ok(())
}

/// Allocate a constancy constraint for `dom` with codomain binder `cod` and
/// immediately try to discharge it.
pub fn new_constancy(
    metas: &mut MetaCxt,
    cxt: &Cxt,
    dom: &Rc<Val>,
    cod: &Closure,
) -> Result<(), UnifyError> {
    let cod = cod.apply(metas, Rc::new(Val::var(cxt.len())));
    let constm = metas.fresh(MetaEntry::Constancy {
        cxt: cxt.clone(),
        dom: dom.clone(),
        cod,
        blockers: Default::default(),
    });
    try_constancy(metas, constm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::env::Env;
    use crate::normalizer::eval::Eval;
    use crate::normalizer::quote::quote;
    use crate::normalizer::val::Spine;
    use tela_ast::{Icit, Ix, MId, Tm};

    fn fresh_unsolved(metas: &mut MetaCxt, ty: &Tm) -> MId {
        let ty = ty.eval(metas, &Env::new());
        metas.fresh(MetaEntry::Unsolved { blockers: Default::default(), ty })
    }

    #[test]
    fn occurrence_of_the_variable_itself_is_rigid() {
        let metas = MetaCxt::new();
        let v = Rc::new(Val::var(Lvl(0)));
        assert_eq!(occurs(&metas, Lvl(1), Lvl(0), &v), Occurs::Rigid);
    }

    #[test]
    fn no_occurrence_is_none() {
        let metas = MetaCxt::new();
        assert_eq!(occurs(&metas, Lvl(1), Lvl(0), &Rc::new(Val::U)), Occurs::None);
        assert_eq!(
            occurs(&metas, Lvl(1), Lvl(0), &Rc::new(Val::var(Lvl(5)))),
            Occurs::None
        );
    }

    #[test]
    fn occurrence_under_a_meta_spine_is_flexible() {
        let mut metas = MetaCxt::new();
        let m = fresh_unsolved(
            &mut metas,
            &Tm::Pi("A".into(), Icit::Expl, Box::new(Tm::U), Box::new(Tm::U)),
        );
        let mut sp = Spine::new();
        sp.push(Elim::App(Rc::new(Val::var(Lvl(0))), Icit::Expl));
        let v = Rc::new(Val::Ne(Head::Meta(m), sp));
        let Occurs::Flex(ms) = occurs(&metas, Lvl(1), Lvl(0), &v) else {
            panic!("expected a flexible occurrence")
        };
        assert!(ms.contains(&m));
    }

    #[test]
    fn unused_codomain_collapses_the_telescope() {
        let mut metas = MetaCxt::new();
        let cxt = Cxt::empty();
        let dom = fresh_unsolved(&mut metas, &Tm::Tel);
        let dom_val = Rc::new(Val::meta(dom));
        let cod = Closure::term(Env::new(), Tm::U);
        let constm = metas.next_mid();
        new_constancy(&mut metas, &cxt, &dom_val, &cod).unwrap();
        let MetaEntry::Solved(sol) = metas.lookup(dom) else {
            panic!("telescope not collapsed")
        };
        assert_eq!(quote(&metas, Lvl(0), &sol.clone()), Tm::TEmpty);
        assert!(metas.get(constm).is_none(), "constraint not discharged");
    }

    #[test]
    fn rigid_codomain_keeps_the_telescope() {
        let mut metas = MetaCxt::new();
        let cxt = Cxt::empty();
        let dom = fresh_unsolved(&mut metas, &Tm::Tel);
        let dom_val = Rc::new(Val::meta(dom));
        let cod = Closure::term(Env::new(), Tm::Var(Ix(0)));
        let constm = metas.next_mid();
        new_constancy(&mut metas, &cxt, &dom_val, &cod).unwrap();
        assert!(matches!(metas.lookup(dom), MetaEntry::Unsolved { .. }));
        assert!(metas.get(constm).is_none(), "constraint not discharged");
    }

    #[test]
    fn flexible_codomain_blocks_and_subscribes() {
        let mut metas = MetaCxt::new();
        let cxt = Cxt::empty();
        let dom = fresh_unsolved(&mut metas, &Tm::Tel);
        let dom_val = Rc::new(Val::meta(dom));
        let k = fresh_unsolved(
            &mut metas,
            &Tm::Pi("A".into(), Icit::Expl, Box::new(Tm::U), Box::new(Tm::U)),
        );
        let cod = Closure::term(
            Env::new(),
            Tm::App(Box::new(Tm::Meta(k)), Box::new(Tm::Var(Ix(0))), Icit::Expl),
        );
        let constm = metas.next_mid();
        new_constancy(&mut metas, &cxt, &dom_val, &cod).unwrap();
        let Some(MetaEntry::Constancy { blockers, .. }) = metas.get(constm) else {
            panic!("constraint should still be open")
        };
        assert!(blockers.contains(&k));
        let MetaEntry::Unsolved { blockers, .. } = metas.lookup(k) else {
            panic!("blocking meta should be unsolved")
        };
        assert!(blockers.contains(&constm));
        assert!(matches!(metas.lookup(dom), MetaEntry::Unsolved { .. }));
    }
}
