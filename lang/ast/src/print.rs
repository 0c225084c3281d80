//! Prettyprinting of core terms.
//!
//! Terms are printed relative to a context of binder names. Binders
//! occurring in the term extend the context; shadowed names are freshened
//! with a prime. Metavariables print as `?n`, variables without a printable
//! binder as `@n`.

use pretty::DocAllocator;

use tela_printer::tokens::*;
use tela_printer::{Alloc, Builder, BuilderExt, PrintCfg, render_to_string};

use crate::exp::{Icit, Name, Tm};
use crate::idx::Ix;

/// The names of the binders enclosing the term being printed, outermost
/// first.
#[derive(Debug, Clone, Default)]
pub struct NameCtx {
    names: Vec<Name>,
}

impl NameCtx {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_names(names: &[Name]) -> Self {
        NameCtx { names: names.to_vec() }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Pick a name for a binder that does not collide with any name already
    /// in scope.
    pub fn fresh(&self, x: &Name) -> Name {
        if &**x == "_" {
            return x.clone();
        }
        let mut candidate: String = x.to_string();
        while self.names.iter().any(|n| **n == *candidate) {
            candidate.push('\'');
        }
        candidate.into()
    }

    pub fn bind(&mut self, x: Name) {
        self.names.push(x);
    }

    pub fn pop(&mut self) {
        self.names.pop();
    }

    fn pop_n(&mut self, n: usize) {
        for _ in 0..n {
            self.names.pop();
        }
    }

    pub fn lookup(&self, ix: Ix) -> Option<Name> {
        let pos = self.names.len().checked_sub(ix.0 + 1)?;
        self.names.get(pos).cloned()
    }
}

// Precedence levels: a term only needs parentheses when it is printed at a
// position requiring higher binding strength than its own.
const PREC_LOW: u32 = 0;
const PREC_PI: u32 = 1;
const PREC_APP: u32 = 2;
const PREC_ATOM: u32 = 3;

impl Tm {
    pub fn print<'a>(
        &'a self,
        cfg: &PrintCfg,
        names: &mut NameCtx,
        alloc: &'a Alloc<'a>,
    ) -> Builder<'a> {
        self.prec(PREC_LOW, cfg, names, alloc)
    }

    pub fn print_to_string(&self, names: &mut NameCtx, cfg: Option<&PrintCfg>) -> String {
        let alloc = Alloc::new();
        let default_cfg = PrintCfg::default();
        let cfg = cfg.unwrap_or(&default_cfg);
        let doc = self.print(cfg, names, &alloc);
        render_to_string(cfg.width, doc)
    }

    fn prec<'a>(
        &'a self,
        prec: u32,
        cfg: &PrintCfg,
        names: &mut NameCtx,
        alloc: &'a Alloc<'a>,
    ) -> Builder<'a> {
        match self {
            Tm::Var(ix) => match names.lookup(*ix) {
                Some(x) => alloc.text(x.to_string()),
                None => alloc.text(format!("{AT}{ix}")),
            },
            Tm::Meta(m) => {
                if cfg.print_metavar_ids {
                    alloc.text(format!("{m}"))
                } else {
                    alloc.text(QUESTIONMARK)
                }
            }
            Tm::U => alloc.text(TYPE),
            Tm::Tel => alloc.text(TEL),
            Tm::TEmpty => alloc.text(TNIL),
            Tm::Tempty => alloc.text(TEMPTY),
            Tm::Rec(a) => alloc
                .text(REC)
                .append(alloc.space())
                .append(a.prec(PREC_ATOM, cfg, names, alloc))
                .parens_if(prec > PREC_APP),
            Tm::Lam(..) | Tm::LamTel(..) => {
                let mut binders = alloc.nil();
                let mut body = self;
                let mut bound = 0;
                loop {
                    let (binder, next) = match body {
                        Tm::Lam(x, i, _, t) => {
                            let x = names.fresh(x);
                            let doc = alloc.text(x.to_string());
                            let doc = match i {
                                Icit::Impl => doc.braces(),
                                Icit::Expl => doc,
                            };
                            names.bind(x);
                            (doc, &**t)
                        }
                        Tm::LamTel(x, _, t) => {
                            let x = names.fresh(x);
                            let doc = alloc.text(x.to_string()).braces();
                            names.bind(x);
                            (doc, &**t)
                        }
                        _ => break,
                    };
                    binders = binders.append(alloc.space()).append(binder);
                    bound += 1;
                    body = next;
                }
                let doc = alloc
                    .text(LAMBDA)
                    .append(binders)
                    .append(alloc.text(DOT))
                    .append(alloc.space())
                    .append(body.prec(PREC_LOW, cfg, names, alloc));
                names.pop_n(bound);
                doc.parens_if(prec > PREC_LOW)
            }
            Tm::Pi(x, i, a, b) => {
                let doc = if &**x == "_" && *i == Icit::Expl {
                    let dom = a.prec(PREC_APP, cfg, names, alloc);
                    names.bind(x.clone());
                    let cod = b.prec(PREC_PI, cfg, names, alloc);
                    names.pop();
                    dom.append(alloc.space())
                        .append(alloc.text(ARROW))
                        .append(alloc.space())
                        .append(cod)
                } else {
                    let x = names.fresh(x);
                    let binder = alloc
                        .text(x.to_string())
                        .append(alloc.space())
                        .append(alloc.text(COLON))
                        .append(alloc.space())
                        .append(a.prec(PREC_LOW, cfg, names, alloc));
                    let binder = match i {
                        Icit::Impl => binder.braces(),
                        Icit::Expl => binder.parens(),
                    };
                    names.bind(x);
                    let cod = b.prec(PREC_PI, cfg, names, alloc);
                    names.pop();
                    binder
                        .append(alloc.space())
                        .append(alloc.text(ARROW))
                        .append(alloc.space())
                        .append(cod)
                };
                doc.parens_if(prec > PREC_PI)
            }
            Tm::PiTel(x, a, b) => {
                let x = names.fresh(x);
                let binder = alloc
                    .text(x.to_string())
                    .append(alloc.space())
                    .append(alloc.text(COLON))
                    .append(alloc.space())
                    .append(alloc.text(REC))
                    .append(alloc.space())
                    .append(a.prec(PREC_ATOM, cfg, names, alloc))
                    .braces();
                names.bind(x);
                let cod = b.prec(PREC_PI, cfg, names, alloc);
                names.pop();
                binder
                    .append(alloc.space())
                    .append(alloc.text(ARROW))
                    .append(alloc.space())
                    .append(cod)
                    .parens_if(prec > PREC_PI)
            }
            Tm::TCons(x, a, b) => {
                let x = names.fresh(x);
                let head = alloc
                    .text(x.to_string())
                    .append(alloc.space())
                    .append(alloc.text(COLON))
                    .append(alloc.space())
                    .append(a.prec(PREC_LOW, cfg, names, alloc))
                    .parens();
                names.bind(x);
                let tail = b.prec(PREC_PI, cfg, names, alloc);
                names.pop();
                head.append(alloc.space())
                    .append(alloc.text(TRIANGLE))
                    .append(alloc.space())
                    .append(tail)
                    .parens_if(prec > PREC_PI)
            }
            Tm::Tcons(t, u) => t
                .prec(PREC_APP, cfg, names, alloc)
                .append(alloc.space())
                .append(alloc.text(CONS))
                .append(alloc.space())
                .append(u.prec(PREC_PI, cfg, names, alloc))
                .parens_if(prec > PREC_PI),
            Tm::Proj1(t) => t.prec(PREC_ATOM, cfg, names, alloc).append(alloc.text(PROJ1)),
            Tm::Proj2(t) => t.prec(PREC_ATOM, cfg, names, alloc).append(alloc.text(PROJ2)),
            Tm::App(t, u, i) => {
                let arg = match i {
                    Icit::Expl => u.prec(PREC_ATOM, cfg, names, alloc),
                    Icit::Impl => u.prec(PREC_LOW, cfg, names, alloc).braces(),
                };
                t.prec(PREC_APP, cfg, names, alloc)
                    .append(alloc.space())
                    .append(arg)
                    .parens_if(prec > PREC_APP)
            }
            Tm::AppTel(_, t, u) => t
                .prec(PREC_APP, cfg, names, alloc)
                .append(alloc.space())
                .append(u.prec(PREC_LOW, cfg, names, alloc).braces())
                .parens_if(prec > PREC_APP),
            Tm::Let(x, a, t, u) => {
                let x = names.fresh(x);
                let doc = alloc
                    .text(LET)
                    .append(alloc.space())
                    .append(alloc.text(x.to_string()))
                    .append(alloc.space())
                    .append(alloc.text(COLON))
                    .append(alloc.space())
                    .append(a.prec(PREC_LOW, cfg, names, alloc))
                    .append(alloc.space())
                    .append(alloc.text(EQ))
                    .append(alloc.space())
                    .append(t.prec(PREC_LOW, cfg, names, alloc))
                    .append(alloc.space())
                    .append(alloc.text(IN))
                    .append(alloc.line());
                names.bind(x);
                let body = u.prec(PREC_LOW, cfg, names, alloc);
                names.pop();
                doc.append(body).group().parens_if(prec > PREC_LOW)
            }
            Tm::Skip(t) => {
                names.bind("_".into());
                let doc = t.prec(prec, cfg, names, alloc);
                names.pop();
                doc
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idx::MId;

    fn var(ix: usize) -> Box<Tm> {
        Box::new(Tm::Var(Ix(ix)))
    }

    #[test]
    fn prints_identity() {
        let tm = Tm::Lam(
            "A".into(),
            Icit::Impl,
            Box::new(Tm::U),
            Box::new(Tm::Lam("x".into(), Icit::Expl, var(0), var(0))),
        );
        assert_eq!(tm.print_to_string(&mut NameCtx::empty(), None), "λ {A} x. x");
    }

    #[test]
    fn prints_pi_chain() {
        let tm = Tm::Pi(
            "A".into(),
            Icit::Impl,
            Box::new(Tm::U),
            Box::new(Tm::Pi("_".into(), Icit::Expl, var(0), var(1))),
        );
        assert_eq!(tm.print_to_string(&mut NameCtx::empty(), None), "{A : U} → A → A");
    }

    #[test]
    fn prints_shadowed_binder_freshened() {
        let tm = Tm::Lam(
            "x".into(),
            Icit::Expl,
            Box::new(Tm::U),
            Box::new(Tm::Lam("x".into(), Icit::Expl, Box::new(Tm::U), var(1))),
        );
        assert_eq!(tm.print_to_string(&mut NameCtx::empty(), None), "λ x x'. x");
    }

    #[test]
    fn prints_metas_and_application() {
        let tm = Tm::App(Box::new(Tm::Meta(MId(3))), Box::new(Tm::U), Icit::Expl);
        assert_eq!(tm.print_to_string(&mut NameCtx::empty(), None), "?3 U");
    }
}
