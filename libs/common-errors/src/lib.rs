use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Code carried by errors that never reached a server.
pub const NETWORK_ERROR_CODE: u16 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Unauthorized,
    Forbidden,
    Server,
    Network,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiErrorInfo {
    pub kind: ErrorKind,
    pub code: u16,
    pub message: String,
    pub details: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    Validation {
        code: u16,
        message: String,
        details: Option<Value>,
    },
    NotFound {
        code: u16,
        message: String,
        details: Option<Value>,
    },
    Unauthorized {
        code: u16,
        message: String,
        details: Option<Value>,
    },
    Forbidden {
        code: u16,
        message: String,
        details: Option<Value>,
    },
    Server {
        code: u16,
        message: String,
        details: Option<Value>,
    },
    Network {
        code: u16,
        message: String,
        details: Option<Value>,
    },
    Unknown {
        code: u16,
        message: String,
        details: Option<Value>,
    },
}

impl AppError {
    pub fn validation(message: &str) -> Self {
        Self::Validation {
            code: 400,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn validation_with_details(message: &str, details: Value) -> Self {
        Self::Validation {
            code: 400,
            message: message.to_string(),
            details: Some(details),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::NotFound {
            code: 404,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::Unauthorized {
            code: 401,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn forbidden(message: &str) -> Self {
        Self::Forbidden {
            code: 403,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn server(code: u16, message: &str) -> Self {
        Self::Server {
            code,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn network(message: &str) -> Self {
        Self::Network {
            code: NETWORK_ERROR_CODE,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn unknown(message: &str) -> Self {
        Self::Unknown {
            code: 500,
            message: message.to_string(),
            details: None,
        }
    }

    /// Maps a non-2xx HTTP status onto the taxonomy.
    pub fn from_status(
        status: u16, message: &str, details: Option<Value>,
    ) -> Self {
        let message = message.to_string();
        match status {
            400 | 422 => {
                Self::Validation {
                    code: status,
                    message,
                    details,
                }
            }
            401 => {
                Self::Unauthorized {
                    code: status,
                    message,
                    details,
                }
            }
            403 => {
                Self::Forbidden {
                    code: status,
                    message,
                    details,
                }
            }
            404 => {
                Self::NotFound {
                    code: status,
                    message,
                    details,
                }
            }
            500..=599 => {
                Self::Server {
                    code: status,
                    message,
                    details,
                }
            }
            _ => {
                Self::Unknown {
                    code: status,
                    message,
                    details,
                }
            }
        }
    }

    pub fn with_details(mut self, value: Value) -> Self {
        match &mut self {
            Self::Validation { details, .. }
            | Self::NotFound { details, .. }
            | Self::Unauthorized { details, .. }
            | Self::Forbidden { details, .. }
            | Self::Server { details, .. }
            | Self::Network { details, .. }
            | Self::Unknown { details, .. } => *details = Some(value),
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::Server { .. } => ErrorKind::Server,
            Self::Network { .. } => ErrorKind::Network,
            Self::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    pub fn code(&self) -> u16 { self.parts().0 }

    pub fn message(&self) -> &str { self.parts().1 }

    pub fn details(&self) -> Option<&Value> { self.parts().2.as_ref() }

    /// Server and network failures may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Server | ErrorKind::Network)
    }

    pub fn to_info(&self) -> ApiErrorInfo {
        let (code, message, details) = self.parts();
        ApiErrorInfo {
            kind: self.kind(),
            code,
            message: message.clone(),
            details: details.clone(),
        }
    }

    fn parts(&self) -> (u16, &String, &Option<Value>) {
        match self {
            Self::Validation {
                code,
                message,
                details,
            }
            | Self::NotFound {
                code,
                message,
                details,
            }
            | Self::Unauthorized {
                code,
                message,
                details,
            }
            | Self::Forbidden {
                code,
                message,
                details,
            }
            | Self::Server {
                code,
                message,
                details,
            }
            | Self::Network {
                code,
                message,
                details,
            }
            | Self::Unknown {
                code,
                message,
                details,
            } => (*code, message, details),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::unknown(&format!("Malformed payload: {err}"))
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Errors that can be placed in the [`ErrorKind`] taxonomy.
pub trait Classified {
    fn kind(&self) -> ErrorKind;

    /// Only server and network failures are worth another attempt.
    fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Server | ErrorKind::Network)
    }
}

impl Classified for AppError {
    fn kind(&self) -> ErrorKind { AppError::kind(self) }
}
