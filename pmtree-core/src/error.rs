use thiserror::Error;

/// Parameter sets the generator refuses to work with.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    #[error("expected {expected} parameters, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("{field} must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
}

/// Failures while parsing a persisted `[params],[stats]` line.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("missing bracketed list")]
    MissingList,

    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    #[error("trailing input after statistics list: {0:?}")]
    TrailingInput(String),

    #[error(transparent)]
    Params(#[from] ParamError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SampleError {
    #[error("no plausible tree after {attempts} attempts")]
    AttemptsExhausted { attempts: u32 },
}
