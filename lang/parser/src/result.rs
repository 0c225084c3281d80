use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ParseError {
    #[error("Unexpected {got}, expected {expected}")]
    #[diagnostic(code("P-001"))]
    UnexpectedToken {
        got: String,
        expected: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Unexpected end of input, expected {expected}")]
    #[diagnostic(code("P-002"))]
    UnexpectedEof { expected: String },
    #[error("Unrecognized token")]
    #[diagnostic(code("P-003"))]
    InvalidToken {
        #[label]
        span: Option<SourceSpan>,
    },
}
