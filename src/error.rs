use strum_macros::{AsRefStr, EnumString};

/// Outcome of every metadata operation that did not succeed.
///
/// Success is the `Ok` side of [`Result`]; the variants here cover the rest of
/// the taxonomy and never carry backend-native error values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error, AsRefStr, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    #[error("object not found")]
    NotFound,

    #[error("object id not found")]
    IdNotFound,

    #[error("object name not found")]
    NameNotFound,

    #[error("object already exists")]
    AlreadyExists,

    #[error("table name already exists")]
    TableNameAlreadyExists,

    #[error("invalid parameter")]
    InvalidParameter,

    #[error("operation not supported by this backend")]
    NotSupported,

    #[error("database access failure")]
    DatabaseAccessFailure,

    #[error("session not initialized")]
    NotInitialized,

    #[error("internal error")]
    InternalError,

    #[error("unknown error")]
    Unknown,
}

impl ErrorCode {
    /// Whether this is one of the not-found family of codes.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ErrorCode::NotFound | ErrorCode::IdNotFound | ErrorCode::NameNotFound
        )
    }
}

pub type Result<T, E = ErrorCode> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::ErrorCode;

    #[rstest]
    #[case(ErrorCode::IdNotFound, "ID_NOT_FOUND")]
    #[case(ErrorCode::TableNameAlreadyExists, "TABLE_NAME_ALREADY_EXISTS")]
    #[case(ErrorCode::NotSupported, "NOT_SUPPORTED")]
    #[case(ErrorCode::DatabaseAccessFailure, "DATABASE_ACCESS_FAILURE")]
    fn test_error_code_wire_names(#[case] code: ErrorCode, #[case] name: &str) {
        assert_eq!(code.as_ref(), name);
        assert_eq!(ErrorCode::from_str(name).unwrap(), code);
    }

    #[test]
    fn test_not_found_family() {
        assert!(ErrorCode::NotFound.is_not_found());
        assert!(ErrorCode::NameNotFound.is_not_found());
        assert!(!ErrorCode::AlreadyExists.is_not_found());
    }
}
