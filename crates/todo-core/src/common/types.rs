//! Request rules shared by the server and its clients.

use crate::{Error, Result};

/// Resolves the row limit a `ListTodo` request asks the store for.
///
/// `0` means no limit (`None`). Positive limits pass through unchanged.
/// Negative limits are rejected as `InvalidArgument`.
pub fn list_limit(requested: i32) -> Result<Option<u32>> {
    match u32::try_from(requested) {
        Ok(0) => Ok(None),
        Ok(n) => Ok(Some(n)),
        Err(_) => Err(Error::invalid_argument(format!(
            "limit must not be negative, got {requested}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_means_unlimited() {
        assert_eq!(list_limit(0), Ok(None));
    }

    #[test]
    fn positive_limits_pass_through() {
        assert_eq!(list_limit(10), Ok(Some(10)));
        assert_eq!(list_limit(1500), Ok(Some(1500)));
        assert_eq!(list_limit(i32::MAX), Ok(Some(i32::MAX as u32)));
    }

    #[test]
    fn negative_is_rejected() {
        assert!(matches!(list_limit(-1), Err(Error::InvalidArgument { .. })));
    }
}
