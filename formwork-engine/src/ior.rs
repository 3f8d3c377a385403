use self::Ior::{Both, Left, Right};

/// Generic representation of an Inclusive-Or.
/// Similar to [std::result::Result], but both values can occur at the same time,
/// e.g. an error message together with the malformed input it refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ior<L, R> {
    Left(L),
    Right(R),
    Both(L, R),
}

impl<L, R> Ior<L, R> {

    #[inline]
    pub fn left(self) -> Option<L> {
        match self {
            Right(_) => None,
            Left(value) | Both(value, _) => Some(value),
        }
    }
}

/// Outcome of validating a single field: the accepted value, an error message,
/// or an error message together with the rejected value.
pub type FieldInput = Ior<String, String>;

#[cfg(test)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    #[test]
    fn should_yield_the_error_of_rejected_inputs() {
        let rejected: FieldInput = Both(String::from("Invalid field value 'tmp'."), String::from("tmp"));
        let missing: FieldInput = Left(String::from("This field is required."));
        let accepted: FieldInput = Right(String::from("/mnt/backups"));

        assert_that!(rejected.left(), some(eq("Invalid field value 'tmp'.")));
        assert_that!(missing.left(), some(eq("This field is required.")));
        assert_that!(accepted.left(), none());
    }
}
