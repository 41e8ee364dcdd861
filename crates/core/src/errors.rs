use thiserror::Error;

/// Transport-level failure of a signed or lookup request. Never retried here.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("request to `{path}` failed with status {status}")]
    Status { path: String, status: u16 },
    #[error("request to `{path}` returned a malformed body: {message}")]
    MalformedBody { path: String, message: String },
    #[error("request to `{path}` could not be sent: {message}")]
    Transport { path: String, message: String },
}

impl RequestError {
    pub fn path(&self) -> &str {
        match self {
            Self::Status { path, .. }
            | Self::MalformedBody { path, .. }
            | Self::Transport { path, .. } => path,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    RequestFailed(#[from] RequestError),
    #[error("invalid input for tool `{tool}`: {message}")]
    InvalidToolInput { tool: String, message: String },
    #[error("model failure: {0}")]
    Model(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
    #[error("could not encode tool output: {0}")]
    Encoding(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "I could not understand that search. Try rephrasing the criteria."
            }
            Self::ServiceUnavailable { .. } => {
                "The listing service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::InvalidToolInput { tool, message } => Self::BadRequest {
                message: format!("{tool}: {message}"),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::RequestFailed(error) => Self::ServiceUnavailable {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Model(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Configuration(message) | ApplicationError::Encoding(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
