// Default indentation size
pub const INDENT: isize = 2;

// Symbols

pub const LAMBDA: &str = "λ";
pub const ARROW: &str = "→";
pub const DOT: &str = ".";
pub const COLON: &str = ":";
pub const EQ: &str = "=";
pub const UNDERSCORE: &str = "_";
pub const QUESTIONMARK: &str = "?";
pub const AT: &str = "@";
pub const TRIANGLE: &str = "▷";
pub const CONS: &str = "∷";
pub const PROJ1: &str = ".1";
pub const PROJ2: &str = ".2";

// Keywords

pub const LET: &str = "let";
pub const IN: &str = "in";
pub const TYPE: &str = "U";
pub const TEL: &str = "Tel";
pub const REC: &str = "Rec";
pub const TEMPTY: &str = "ε";
pub const TNIL: &str = "∙";
