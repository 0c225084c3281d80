use std::fmt;

/// A de Bruijn index: the distance to the binder, counted from the use site.
/// Terms use indices because they are stable under weakening.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ix(pub usize);

/// A de Bruijn level: the distance to the binder, counted from the root of
/// the context. Values use levels because they are stable under
/// strengthening.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lvl(pub usize);

impl Lvl {
    /// Convert a level to an index relative to a context of depth `depth`.
    pub fn to_ix(self, depth: Lvl) -> Ix {
        Ix(depth.0 - self.0 - 1)
    }

    pub fn inc(self) -> Lvl {
        Lvl(self.0 + 1)
    }
}

impl fmt::Debug for Ix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Ix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Lvl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Lvl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a metavariable. Ids are allocated by a monotonic counter
/// and are never reused within one elaboration.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MId(pub u32);

impl fmt::Debug for MId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

impl fmt::Display for MId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lvl_to_ix() {
        assert_eq!(Lvl(0).to_ix(Lvl(1)), Ix(0));
        assert_eq!(Lvl(0).to_ix(Lvl(3)), Ix(2));
        assert_eq!(Lvl(2).to_ix(Lvl(3)), Ix(0));
    }
}
