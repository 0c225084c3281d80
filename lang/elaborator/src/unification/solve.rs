//! Solving metavariables: the pattern condition, strengthening with
//! recursive pruning and occurs check, and writing solutions.

use std::rc::Rc;

use fxhash::FxHashMap;

use log::trace;

use tela_ast::{Ix, Lvl, MId, Name, Tm};

use crate::ctx::Cxt;
use crate::metas::{MetaCxt, MetaEntry};
use crate::normalizer::env::Env;
use crate::normalizer::eval::{Eval, force, force_sp};
use crate::normalizer::quote::quote;
use crate::normalizer::val::{Elim, Head, Spine, Val};
use crate::result::{SpineError, StrengtheningError, UnifyError};
use crate::unification::constancy::try_constancy;

/// Partial map from bound levels to bound levels; a level missing from the
/// map is out of scope.
pub(crate) type Renaming = FxHashMap<Lvl, Lvl>;

/// A strengthening: re-quote a value of a context of depth `cod` into a term
/// of a context of depth `dom` along `ren`, optionally checking that `occ`
/// does not occur.
pub(crate) struct Str {
    pub dom: usize,
    pub cod: usize,
    pub ren: Renaming,
    pub occ: Option<MId>,
}

impl Str {
    pub fn new(dom: usize, cod: usize, ren: Renaming, occ: Option<MId>) -> Str {
        Str { dom, cod, ren, occ }
    }

    /// Go under a binder kept on both sides.
    pub fn lift(&self) -> Str {
        let mut ren = self.ren.clone();
        ren.insert(Lvl(self.cod), Lvl(self.dom));
        Str { dom: self.dom + 1, cod: self.cod + 1, ren, occ: self.occ }
    }

    /// Go under a binder dropped on the strengthened side.
    pub fn skip(&self) -> Str {
        Str { dom: self.dom, cod: self.cod + 1, ren: self.ren.clone(), occ: self.occ }
    }
}

/// A spine acts as a variable substitution iff every eliminator is an
/// application and the arguments are pairwise distinct bound variables.
/// Returns the renaming, the spine length and the argument levels in
/// application order.
pub(crate) fn check_sp(
    metas: &MetaCxt,
    sp: &Spine,
) -> Result<(Renaming, usize, Vec<Lvl>), SpineError> {
    let mut ren = Renaming::default();
    let mut vars = Vec::with_capacity(sp.len());
    for (pos, e) in sp.iter().enumerate() {
        let u = match e {
            Elim::App(u, _) => u,
            Elim::AppTel(_, u) => u,
            Elim::Proj1 | Elim::Proj2 => return Err(SpineError::SpineProjection),
        };
        match &*force(metas, u) {
            Val::Ne(Head::Var(x), inner) if inner.is_empty() => {
                if ren.insert(*x, Lvl(pos)).is_some() {
                    return Err(SpineError::NonLinearSpine(*x));
                }
                vars.push(*x);
            }
            _ => return Err(SpineError::SpineNonVar),
        }
    }
    Ok((ren, sp.len(), vars))
}

/// Re-quote `v` under the renaming. A bound level outside the renaming is a
/// scope error; a neutral under the occurs meta is a cycle. Neutrals headed
/// by other metas are pruned first when their spine allows it.
pub(crate) fn strengthen(
    metas: &mut MetaCxt,
    str: &Str,
    v: &Rc<Val>,
) -> Result<Tm, StrengtheningError> {
    let vf = force(metas, v);
    match &*vf {
        Val::Ne(h, sp) => {
            let w = force_sp(metas, *h, sp);
            let Val::Ne(h, sp) = &*w else { unreachable!("re-eliminated neutral lost its head") };
            match *h {
                Head::Var(x) => {
                    let x2 = str
                        .ren
                        .get(&x)
                        .copied()
                        .ok_or(StrengtheningError::ScopeError(x))?;
                    str_sp(metas, str, Tm::Var(Ix(str.dom - x2.0 - 1)), sp)
                }
                Head::Meta(m) => {
                    if str.occ == Some(m) {
                        return Err(StrengtheningError::OccursCheck);
                    }
                    prune(metas, str, m, sp)?;
                    let w2 = force_sp(metas, Head::Meta(m), sp);
                    match &*w2 {
                        Val::Ne(Head::Meta(m2), sp2) => str_sp(metas, str, Tm::Meta(*m2), sp2),
                        _ => strengthen(metas, str, &w2),
                    }
                }
            }
        }
        Val::Pi(x, i, a, b) => Ok(Tm::Pi(
            x.clone(),
            *i,
            Box::new(strengthen(metas, str, a)?),
            Box::new(str_bind(metas, str, b)?),
        )),
        Val::Lam(x, i, a, t) => Ok(Tm::Lam(
            x.clone(),
            *i,
            Box::new(strengthen(metas, str, a)?),
            Box::new(str_bind(metas, str, t)?),
        )),
        Val::U => Ok(Tm::U),
        Val::Tel => Ok(Tm::Tel),
        Val::Rec(a) => Ok(Tm::Rec(Box::new(strengthen(metas, str, a)?))),
        Val::TEmpty => Ok(Tm::TEmpty),
        Val::TCons(x, a, b) => Ok(Tm::TCons(
            x.clone(),
            Box::new(strengthen(metas, str, a)?),
            Box::new(str_bind(metas, str, b)?),
        )),
        Val::Tempty => Ok(Tm::Tempty),
        Val::Tcons(t, u) => Ok(Tm::Tcons(
            Box::new(strengthen(metas, str, t)?),
            Box::new(strengthen(metas, str, u)?),
        )),
        Val::PiTel(x, a, b) => Ok(Tm::PiTel(
            x.clone(),
            Box::new(strengthen(metas, str, a)?),
            Box::new(str_bind(metas, str, b)?),
        )),
        Val::LamTel(x, a, t) => Ok(Tm::LamTel(
            x.clone(),
            Box::new(strengthen(metas, str, a)?),
            Box::new(str_bind(metas, str, t)?),
        )),
    }
}

fn str_bind(
    metas: &mut MetaCxt,
    str: &Str,
    cl: &crate::normalizer::val::Closure,
) -> Result<Tm, StrengtheningError> {
    let v = cl.apply(metas, Rc::new(Val::var(Lvl(str.cod))));
    strengthen(metas, &str.lift(), &v)
}

fn str_sp(metas: &mut MetaCxt, str: &Str, head: Tm, sp: &Spine) -> Result<Tm, StrengtheningError> {
    let mut t = head;
    for e in sp.iter() {
        t = match e {
            Elim::App(u, i) => {
                Tm::App(Box::new(t), Box::new(strengthen(metas, str, u)?), *i)
            }
            Elim::AppTel(a, u) => Tm::AppTel(
                Box::new(strengthen(metas, str, a)?),
                Box::new(t),
                Box::new(strengthen(metas, str, u)?),
            ),
            Elim::Proj1 => Tm::Proj1(Box::new(t)),
            Elim::Proj2 => Tm::Proj2(Box::new(t)),
        };
    }
    Ok(t)
}

/// Replace `m` by a fresh meta of smaller arity when some of its spine
/// variables are outside the renaming. Only all-variable spines are pruned;
/// anything else is left for the surrounding traversal, which may still fail
/// with a scope error.
fn prune(metas: &mut MetaCxt, str: &Str, m: MId, sp: &Spine) -> Result<(), StrengtheningError> {
    let mut args: Vec<Lvl> = Vec::with_capacity(sp.len());
    for e in sp.iter() {
        let u = match e {
            Elim::App(u, _) => u,
            Elim::AppTel(_, u) => u,
            Elim::Proj1 | Elim::Proj2 => return Ok(()),
        };
        match &*force(metas, u) {
            Val::Ne(Head::Var(x), inner) if inner.is_empty() => args.push(*x),
            _ => return Ok(()),
        }
    }
    let keep: Vec<bool> = args.iter().map(|x| str.ren.contains_key(x)).collect();
    if keep.iter().all(|k| *k) {
        return Ok(());
    }

    trace!("pruning {m}: keeping {keep:?}");

    let mty = match metas.lookup(m) {
        MetaEntry::Unsolved { ty, .. } => ty.clone(),
        _ => unreachable!("pruning a solved metavariable"),
    };

    let pruned_ty = prune_ty(metas, &keep, &mty)?;
    let pruned_val = pruned_ty.eval(metas, &Env::new());
    let m2 = metas.fresh(MetaEntry::Unsolved { blockers: Default::default(), ty: pruned_val });

    // the solution for m: the new meta applied to the kept arguments
    let n = keep.len();
    let mut body = Tm::Meta(m2);
    let mut layer_ty = mty.clone();
    for (j, keep_j) in keep.iter().enumerate() {
        let forced = force(metas, &layer_ty);
        match &*forced {
            Val::Pi(_, i, _, b) => {
                if *keep_j {
                    body = Tm::App(Box::new(body), Box::new(Tm::Var(Ix(n - j - 1))), *i);
                }
                layer_ty = b.apply(metas, Rc::new(Val::var(Lvl(j))));
            }
            Val::PiTel(_, dom, b) => {
                if *keep_j {
                    body = Tm::AppTel(
                        Box::new(quote(metas, Lvl(n), dom)),
                        Box::new(body),
                        Box::new(Tm::Var(Ix(n - j - 1))),
                    );
                }
                layer_ty = b.apply(metas, Rc::new(Val::var(Lvl(j))));
            }
            _ => unreachable!("metavariable type has fewer layers than its spine"),
        }
    }

    let closed = closing_tm(metas, &mty, n, &[], body);
    metas.write(m, MetaEntry::Solved(closed.eval(metas, &Env::new())));
    Ok(())
}

/// Rebuild a (closed) meta type, dropping the layers whose mask entry is
/// false. Dropping a layer another kept layer depends on fails with a scope
/// error.
fn prune_ty(metas: &mut MetaCxt, keep: &[bool], a: &Rc<Val>) -> Result<Tm, StrengtheningError> {
    fn go(
        metas: &mut MetaCxt,
        keep: &[bool],
        str: &Str,
        a: &Rc<Val>,
    ) -> Result<Tm, StrengtheningError> {
        let Some((k, rest)) = keep.split_first() else {
            return strengthen(metas, str, a);
        };
        let forced = force(metas, a);
        match (&*forced, k) {
            (Val::Pi(x, i, dom, b), true) => {
                let dom_tm = strengthen(metas, str, dom)?;
                let body = b.apply(metas, Rc::new(Val::var(Lvl(str.cod))));
                Ok(Tm::Pi(
                    x.clone(),
                    *i,
                    Box::new(dom_tm),
                    Box::new(go(metas, rest, &str.lift(), &body)?),
                ))
            }
            (Val::Pi(_, _, _, b), false) => {
                let body = b.apply(metas, Rc::new(Val::var(Lvl(str.cod))));
                go(metas, rest, &str.skip(), &body)
            }
            (Val::PiTel(x, dom, b), true) => {
                let dom_tm = strengthen(metas, str, dom)?;
                let body = b.apply(metas, Rc::new(Val::var(Lvl(str.cod))));
                Ok(Tm::PiTel(
                    x.clone(),
                    Box::new(dom_tm),
                    Box::new(go(metas, rest, &str.lift(), &body)?),
                ))
            }
            (Val::PiTel(_, _, b), false) => {
                let body = b.apply(metas, Rc::new(Val::var(Lvl(str.cod))));
                go(metas, rest, &str.skip(), &body)
            }
            _ => unreachable!("metavariable type has fewer layers than its spine"),
        }
    }
    go(metas, keep, &Str::new(0, 0, Renaming::default(), None), a)
}

/// Wrap `body` in `n` lambdas matching the Π/telescope-Π layers of `ty`.
/// Binder names are taken from `names` where available, falling back to the
/// names recorded in the type.
pub(crate) fn closing_tm(
    metas: &MetaCxt,
    ty: &Rc<Val>,
    n: usize,
    names: &[Name],
    body: Tm,
) -> Tm {
    fn go(
        metas: &MetaCxt,
        ty: Rc<Val>,
        remaining: usize,
        d: usize,
        names: &[Name],
        body: Tm,
    ) -> Tm {
        if remaining == 0 {
            return body;
        }
        let forced = force(metas, &ty);
        match &*forced {
            Val::Pi(x, i, dom, b) => {
                let x = names.get(d).cloned().unwrap_or_else(|| x.clone());
                let dom_tm = quote(metas, Lvl(d), dom);
                let rest = b.apply(metas, Rc::new(Val::var(Lvl(d))));
                Tm::Lam(
                    x,
                    *i,
                    Box::new(dom_tm),
                    Box::new(go(metas, rest, remaining - 1, d + 1, names, body)),
                )
            }
            Val::PiTel(x, dom, b) => {
                let x = names.get(d).cloned().unwrap_or_else(|| x.clone());
                let dom_tm = quote(metas, Lvl(d), dom);
                let rest = b.apply(metas, Rc::new(Val::var(Lvl(d))));
                Tm::LamTel(
                    x,
                    Box::new(dom_tm),
                    Box::new(go(metas, rest, remaining - 1, d + 1, names, body)),
                )
            }
            _ => unreachable!("metavariable type has fewer layers than its spine"),
        }
    }
    go(metas, ty.clone(), n, 0, names, body)
}

/// Solve `m sp ≡ rhs`. Spine and strengthening failures are rethrown as
/// unify errors carrying both sides quoted in the context's names.
pub(crate) fn solve_meta(
    metas: &mut MetaCxt,
    cxt: &Cxt,
    m: MId,
    sp: &Spine,
    rhs: &Rc<Val>,
) -> Result<(), UnifyError> {
    // normalize the spine first: telescope applications may have collapsed
    let lhs_val = force_sp(metas, Head::Meta(m), sp);
    let (m, sp) = match &*lhs_val {
        Val::Ne(Head::Meta(m2), sp2) => (*m2, sp2.clone()),
        _ => unreachable!("meta head disappeared while normalizing the spine"),
    };

    trace!("solving {} ≟ {}", cxt.show_val(metas, &lhs_val), cxt.show_val(metas, rhs));

    let (ren, n, vars) = match check_sp(metas, &sp) {
        Ok(res) => res,
        Err(source) => {
            return Err(UnifyError::Spine {
                names: cxt.names.clone(),
                lhs: quote(metas, cxt.len(), &lhs_val),
                rhs: quote(metas, cxt.len(), rhs),
                source,
            });
        }
    };
    let rhs_tm = match strengthen(metas, &Str::new(n, cxt.len().0, ren, Some(m)), rhs) {
        Ok(t) => t,
        Err(source) => {
            return Err(UnifyError::Strengthening {
                names: cxt.names.clone(),
                lhs: quote(metas, cxt.len(), &lhs_val),
                rhs: quote(metas, cxt.len(), rhs),
                source,
            });
        }
    };

    let (blockers, mty) = match metas.lookup(m) {
        MetaEntry::Unsolved { blockers, ty } => (blockers.clone(), ty.clone()),
        _ => unreachable!("solving an already solved metavariable"),
    };
    let names: Vec<Name> = vars.iter().map(|l| cxt.lvl_name(*l)).collect();
    let closed = closing_tm(metas, &mty, n, &names, rhs_tm);
    metas.write(m, MetaEntry::Solved(closed.eval(metas, &Env::new())));
    trace!("solved {m}");

    for b in blockers {
        try_constancy(metas, b)?;
    }
    Ok(())
}
