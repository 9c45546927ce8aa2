use std::fmt;

use serde::Serialize;

/// One slot of a dispatch: the parsed value, or the message of the error
/// that stopped that identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome<T> {
    Value(T),
    Error(String),
}

impl<T> Outcome<T> {
    pub fn from_result<E: fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Value(value),
            Err(e) => Outcome::Error(e.to_string()),
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Outcome::Value(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Value(v) => Some(v),
            Outcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Value(_) => None,
            Outcome::Error(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            Outcome::Value(v) => Ok(v),
            Outcome::Error(e) => Err(e),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Value(v) => write!(f, "{v}"),
            Outcome::Error(e) => write!(f, "{e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_result_keeps_error_message() {
        let ok: Outcome<u32> = Outcome::from_result(Ok::<_, String>(7));
        assert_eq!(ok.value(), Some(&7));
        assert!(ok.error().is_none());

        let err: Outcome<u32> = Outcome::from_result(Err("boom"));
        assert!(err.is_error());
        assert_eq!(err.error(), Some("boom"));
        assert_eq!(err.into_result(), Err("boom".to_string()));
    }

    #[test]
    fn test_display_is_inner_value() {
        assert_eq!(Outcome::Value("A").to_string(), "A");
        assert_eq!(Outcome::<&str>::Error("boom".into()).to_string(), "boom");
    }

    #[test]
    fn test_serializes_tagged() {
        let json = serde_json::to_string(&Outcome::<u8>::Error("x".into())).unwrap();
        assert_eq!(json, r#"{"error":"x"}"#);
    }
}
