//! The valid / dirty / aborted lattice.
use crate::value::Value;

/// Severity of an in-flight result. Ordered so that `max` is the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ParseStatus {
    #[default]
    Valid,
    Dirty,
    Aborted,
}

impl ParseStatus {
    pub fn merge(self, other: ParseStatus) -> ParseStatus {
        self.max(other)
    }

    /// Move to `Dirty` unless already aborted.
    pub fn dirty(&mut self) {
        *self = self.merge(ParseStatus::Dirty);
    }

    pub fn abort(&mut self) {
        *self = ParseStatus::Aborted;
    }

    pub fn is_aborted(&self) -> bool {
        *self == ParseStatus::Aborted
    }
}

/// Result of validating one node. Dirty results still carry a value.
#[derive(Debug, Clone)]
pub enum Parsed {
    Valid(Value),
    Dirty(Value),
    Aborted,
}

impl Parsed {
    pub fn new(status: ParseStatus, value: Value) -> Parsed {
        match status {
            ParseStatus::Valid => Parsed::Valid(value),
            ParseStatus::Dirty => Parsed::Dirty(value),
            ParseStatus::Aborted => Parsed::Aborted,
        }
    }

    pub fn status(&self) -> ParseStatus {
        match self {
            Parsed::Valid(_) => ParseStatus::Valid,
            Parsed::Dirty(_) => ParseStatus::Dirty,
            Parsed::Aborted => ParseStatus::Aborted,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Parsed::Valid(v) | Parsed::Dirty(v) => Some(v),
            Parsed::Aborted => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Parsed::Valid(v) | Parsed::Dirty(v) => Some(v),
            Parsed::Aborted => None,
        }
    }

    /// Fold this result into a running status and hand back its value.
    pub fn fold_into(self, status: &mut ParseStatus) -> Option<Value> {
        *status = status.merge(self.status());
        self.into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_takes_most_severe() {
        use ParseStatus::*;
        assert_eq!(Valid.merge(Dirty), Dirty);
        assert_eq!(Dirty.merge(Valid), Dirty);
        assert_eq!(Dirty.merge(Aborted), Aborted);
        assert_eq!(Aborted.merge(Valid), Aborted);
    }

    #[test]
    fn dirty_never_recovers_from_abort() {
        let mut s = ParseStatus::Aborted;
        s.dirty();
        assert!(s.is_aborted());
        let mut s = ParseStatus::Valid;
        s.dirty();
        assert_eq!(s, ParseStatus::Dirty);
    }

    #[test]
    fn fold_collects_value_and_status() {
        let mut s = ParseStatus::Valid;
        assert!(Parsed::Dirty(Value::Null).fold_into(&mut s).is_some());
        assert_eq!(s, ParseStatus::Dirty);
        assert!(Parsed::Aborted.fold_into(&mut s).is_none());
        assert!(s.is_aborted());
    }
}
