use pretty::DocAllocator;

use super::types::*;

pub trait BuilderExt<'a> {
    fn parens(self) -> Builder<'a>;
    fn braces(self) -> Builder<'a>;
    fn parens_if(self, condition: bool) -> Builder<'a>;
}

impl<'a> BuilderExt<'a> for Builder<'a> {
    fn parens(self) -> Builder<'a> {
        self.enclose("(", ")")
    }

    fn braces(self) -> Builder<'a> {
        self.enclose("{", "}")
    }

    fn parens_if(self, condition: bool) -> Builder<'a> {
        if condition { self.parens() } else { self }
    }
}

/// Render a document to a string at the given page width.
pub fn render_to_string(width: usize, doc: Builder<'_>) -> String {
    let mut buf = Vec::new();
    doc.1.render(width, &mut buf).expect("Failed to render document");
    String::from_utf8(buf).expect("Rendered document is not valid utf8")
}
