use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use tela_ast::{Icit, Lvl, Name, NameCtx, Span, Tm};
use tela_miette_util::ToMiette;

/// Failure of the pattern condition on a metavariable spine. Raised by the
/// spine check; recoverable in the flex-flex case.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpineError {
    #[error("the metavariable is applied to a non-variable argument")]
    SpineNonVar,
    #[error("the metavariable spine contains a projection")]
    SpineProjection,
    #[error("the variable @{0} occurs more than once in the metavariable spine")]
    NonLinearSpine(Lvl),
}

/// Failure while re-quoting a candidate solution under a partial renaming.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrengtheningError {
    #[error("the variable @{0} would escape its scope")]
    ScopeError(Lvl),
    #[error("the metavariable occurs in its own solution")]
    OccursCheck,
}

/// A failed unification. The sides are stored as quoted terms together with
/// the names of the context they live in.
#[derive(Error, Debug)]
pub enum UnifyError {
    #[error("{}", render_sides(.names, .lhs, .rhs))]
    Mismatch { names: Vec<Name>, lhs: Tm, rhs: Tm },
    #[error("{}", render_sides(.names, .lhs, .rhs))]
    Spine {
        names: Vec<Name>,
        lhs: Tm,
        rhs: Tm,
        #[source]
        source: SpineError,
    },
    #[error("{}", render_sides(.names, .lhs, .rhs))]
    Strengthening {
        names: Vec<Name>,
        lhs: Tm,
        rhs: Tm,
        #[source]
        source: StrengtheningError,
    },
}

fn render_sides(names: &[Name], lhs: &Tm, rhs: &Tm) -> String {
    let lhs = lhs.print_to_string(&mut NameCtx::from_names(names), None);
    let rhs = rhs.print_to_string(&mut NameCtx::from_names(names), None);
    format!("cannot unify\n  1: {lhs}\n  2: {rhs}")
}

#[derive(Error, Diagnostic, Debug)]
pub enum ElabError {
    #[error("Name not in scope: {name}")]
    #[diagnostic(code("E-001"))]
    NameNotInScope {
        name: Name,
        #[label]
        span: Option<SourceSpan>,
    },
    /// Decoration added around a unification failure to preserve the
    /// caller's original sides.
    #[error("While unifying the following terms:\n  1: {}\n  2: {}\n{}",
        .lhs.print_to_string(&mut NameCtx::from_names(.names), None),
        .rhs.print_to_string(&mut NameCtx::from_names(.names), None),
        .source)]
    #[diagnostic(code("E-002"))]
    UnifyErrorWhile {
        names: Vec<Name>,
        lhs: Tm,
        rhs: Tm,
        #[source]
        source: UnifyError,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("{source}")]
    #[diagnostic(code("E-003"))]
    UnifyError {
        #[source]
        source: UnifyError,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Expected an {expected} application, got an {got} application")]
    #[diagnostic(code("E-004"))]
    IcitMismatch {
        expected: Icit,
        got: Icit,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Expected a function type, got {got}")]
    #[diagnostic(code("E-005"))]
    ExpectedFunction {
        got: String,
        #[label]
        span: Option<SourceSpan>,
    },
}

impl From<UnifyError> for ElabError {
    fn from(source: UnifyError) -> Self {
        ElabError::UnifyError { source, span: None }
    }
}

impl ElabError {
    /// Install a source position unless an inner node already did.
    pub fn with_span(mut self, span: Span) -> Self {
        let slot = match &mut self {
            ElabError::NameNotInScope { span, .. } => span,
            ElabError::UnifyErrorWhile { span, .. } => span,
            ElabError::UnifyError { span, .. } => span,
            ElabError::IcitMismatch { span, .. } => span,
            ElabError::ExpectedFunction { span, .. } => span,
        };
        if slot.is_none() {
            *slot = Some(span.to_miette());
        }
        self
    }
}
