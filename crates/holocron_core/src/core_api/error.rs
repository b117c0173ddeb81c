use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorCode {
    Io,
    Config,
    MalformedSource,
    UnknownRecordKind,
    MissingReference,
    StructuralInconsistency,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code:?}: {message}")]
pub struct CoreError {
    pub code: CoreErrorCode,
    pub message: String,
}

impl CoreError {
    pub fn new(code: CoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_and_message() {
        let err = CoreError::new(CoreErrorCode::MalformedSource, "bad xml in Weapons.xml");
        assert_eq!(err.to_string(), "MalformedSource: bad xml in Weapons.xml");
    }
}
