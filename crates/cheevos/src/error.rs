use serde::{Deserialize, Serialize};
use strum::{Display, FromRepr};
use thiserror::Error;

/// Numeric error codes shared with the achievement service runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRepr, Display)]
#[repr(i32)]
pub enum ErrorCode {
    InvalidLuaOperand = -1,
    InvalidMemoryOperand = -2,
    InvalidConstOperand = -3,
    InvalidFpOperand = -4,
    InvalidConditionType = -5,
    InvalidOperator = -6,
    InvalidRequiredHits = -7,
    DuplicatedStart = -8,
    DuplicatedCancel = -9,
    DuplicatedSubmit = -10,
    DuplicatedValue = -11,
    DuplicatedProgress = -12,
    MissingStart = -13,
    MissingCancel = -14,
    MissingSubmit = -15,
    MissingValue = -16,
    InvalidLeaderboardField = -17,
    MissingDisplayString = -18,
    OutOfMemory = -19,
    InvalidValueFlag = -20,
    MissingValueMeasured = -21,
    MultipleMeasured = -22,
    InvalidMeasuredTarget = -23,
    InvalidComparison = -24,
    InvalidState = -25,
    InvalidJson = -26,
    ApiFailure = -27,
    LoginRequired = -28,
    NoGameLoaded = -29,
    HardcoreDisabled = -30,
    Aborted = -31,
    NoResponse = -32,
    AccessDenied = -33,
    InvalidCredentials = -34,
    ExpiredToken = -35,
}

impl ErrorCode {
    pub fn from_i32(value: i32) -> Option<Self> {
        Self::from_repr(value)
    }
}

/// Human readable text for an error code.
pub fn describe(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::InvalidLuaOperand => "Invalid Lua operand",
        ErrorCode::InvalidMemoryOperand => "Invalid memory operand",
        ErrorCode::InvalidConstOperand => "Invalid constant operand",
        ErrorCode::InvalidFpOperand => "Invalid floating-point operand",
        ErrorCode::InvalidConditionType => "Invalid condition type",
        ErrorCode::InvalidOperator => "Invalid operator",
        ErrorCode::InvalidRequiredHits => "Invalid required hits",
        ErrorCode::DuplicatedStart => "Duplicated start condition",
        ErrorCode::DuplicatedCancel => "Duplicated cancel condition",
        ErrorCode::DuplicatedSubmit => "Duplicated submit condition",
        ErrorCode::DuplicatedValue => "Duplicated value expression",
        ErrorCode::DuplicatedProgress => "Duplicated progress expression",
        ErrorCode::MissingStart => "Missing start condition",
        ErrorCode::MissingCancel => "Missing cancel condition",
        ErrorCode::MissingSubmit => "Missing submit condition",
        ErrorCode::MissingValue => "Missing value expression",
        ErrorCode::InvalidLeaderboardField => "Invalid field in leaderboard",
        ErrorCode::MissingDisplayString => "Missing display string",
        ErrorCode::OutOfMemory => "Out of memory",
        ErrorCode::InvalidValueFlag => "Invalid flag in value expression",
        ErrorCode::MissingValueMeasured => "Missing measured flag in value expression",
        ErrorCode::MultipleMeasured => "Multiple measured targets",
        ErrorCode::InvalidMeasuredTarget => "Invalid measured target",
        ErrorCode::InvalidComparison => "Invalid comparison",
        ErrorCode::InvalidState => "Invalid state",
        ErrorCode::InvalidJson => "Invalid JSON",
        ErrorCode::ApiFailure => "API call failed",
        ErrorCode::LoginRequired => "Login required",
        ErrorCode::NoGameLoaded => "No game loaded",
        ErrorCode::HardcoreDisabled => "Hardcore disabled",
        ErrorCode::Aborted => "Aborted",
        ErrorCode::NoResponse => "No response from server",
        ErrorCode::AccessDenied => "Access denied",
        ErrorCode::InvalidCredentials => "Invalid credentials",
        ErrorCode::ExpiredToken => "Expired token",
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Server rejected request ({code}): {message}")]
    ServerRejected { code: String, message: String },

    #[error("Another operation is already in progress")]
    Busy,

    #[error("Hardcore disabled: {0}")]
    HardcoreDisabled(String),

    #[error("Login required")]
    NotLoggedIn,

    #[error("No game loaded")]
    NoGameLoaded,

    #[error("Unknown game: {hash}")]
    UnknownGame { hash: String },

    #[error("Unsupported console: {0}")]
    UnsupportedConsole(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Expired token: {0}")]
    ExpiredToken(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Operation aborted")]
    Aborted,

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The runtime error code for this error, if it has one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Error::ServerRejected { .. } => Some(ErrorCode::ApiFailure),
            Error::NetworkFailure(_) => Some(ErrorCode::NoResponse),
            Error::Busy | Error::Config(_) | Error::Io(_) => None,
            Error::HardcoreDisabled(_) => Some(ErrorCode::HardcoreDisabled),
            Error::NotLoggedIn => Some(ErrorCode::LoginRequired),
            Error::NoGameLoaded | Error::UnknownGame { .. } | Error::UnsupportedConsole(_) => {
                Some(ErrorCode::NoGameLoaded)
            }
            Error::InvalidState(_) | Error::InvalidSource(_) => Some(ErrorCode::InvalidState),
            Error::InvalidCredentials(_) => Some(ErrorCode::InvalidCredentials),
            Error::ExpiredToken(_) => Some(ErrorCode::ExpiredToken),
            Error::AccessDenied(_) => Some(ErrorCode::AccessDenied),
            Error::Aborted => Some(ErrorCode::Aborted),
            Error::Json(_) => Some(ErrorCode::InvalidJson),
        }
    }

    /// Transient failures the caller may retry without changing input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::NetworkFailure(_) | Error::Busy)
    }

    /// Build an error from a failed server payload.
    ///
    /// `code` is the machine readable code the service attaches to error
    /// payloads (e.g. `invalid_credentials`), when present.
    pub(crate) fn from_server(code: Option<&str>, message: String) -> Self {
        match code {
            Some("invalid_credentials") => Error::InvalidCredentials(message),
            Some("expired_token") => Error::ExpiredToken(message),
            Some("access_denied") => Error::AccessDenied(message),
            Some(code) => Error::ServerRejected {
                code: code.to_string(),
                message,
            },
            None => Error::ServerRejected {
                code: "api_failure".to_string(),
                message,
            },
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
