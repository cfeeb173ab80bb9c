use std::fmt;

// Failure of a remote call, independent of the HTTP library in use.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    Network(String),
    NotFound,
    Upstream { status: u16, message: Option<String> },
    Decode(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(err) => write!(f, "network error: {err}"),
            ApiError::NotFound => write!(f, "not found"),
            ApiError::Upstream { status, message } => {
                if let Some(message) = message {
                    write!(f, "upstream error {status}: {message}")
                } else {
                    write!(f, "upstream error {status}")
                }
            }
            ApiError::Decode(err) => write!(f, "response decode error: {err}"),
        }
    }
}

impl std::error::Error for ApiError {}

// Form input rejected before any request is sent.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingField(&'static str),
    AttendanceUndecided,
    TooManyPlusOnes { max: u32 },
    AmountTooLow { min: f64 },
    NoSubEvents,
    SubEventUndecided(String),
    InvalidAttendees(String),
    UploadsDisabled,
    EmptyFile,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField(field) => write!(f, "{field} is required"),
            ValidationError::AttendanceUndecided => {
                write!(f, "please say whether you will attend")
            }
            ValidationError::TooManyPlusOnes { max } => {
                write!(f, "at most {max} additional guests allowed")
            }
            ValidationError::AmountTooLow { min } => write!(f, "amount must be at least {min}"),
            ValidationError::NoSubEvents => write!(f, "no sub-event answers to submit"),
            ValidationError::SubEventUndecided(slug) => {
                write!(f, "no answer given for sub-event {slug}")
            }
            ValidationError::InvalidAttendees(slug) => {
                write!(f, "attendee count for {slug} must be at least 1")
            }
            ValidationError::UploadsDisabled => write!(f, "photo uploads are disabled"),
            ValidationError::EmptyFile => write!(f, "photo file is empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

// Errors from guest session operations.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    EmptyQuery,
    // Another identification is still in flight.
    Busy,
    Api(ApiError),
    Storage(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::EmptyQuery => write!(f, "enter a name, email, phone or personal code"),
            SessionError::Busy => write!(f, "identification already in progress"),
            SessionError::Api(err) => write!(f, "identification failed: {err}"),
            SessionError::Storage(err) => write!(f, "session storage error: {err}"),
        }
    }
}

impl std::error::Error for SessionError {}

// Errors from form submissions.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitError {
    Invalid(ValidationError),
    NotIdentified,
    // A submission of the same kind is still in flight.
    Busy,
    Api(ApiError),
}

impl From<ValidationError> for SubmitError {
    fn from(err: ValidationError) -> Self {
        SubmitError::Invalid(err)
    }
}

impl From<ApiError> for SubmitError {
    fn from(err: ApiError) -> Self {
        SubmitError::Api(err)
    }
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Invalid(err) => write!(f, "{err}"),
            SubmitError::NotIdentified => write!(f, "identify yourself first"),
            SubmitError::Busy => write!(f, "a submission is already in progress"),
            SubmitError::Api(err) => write!(f, "submission failed: {err}"),
        }
    }
}

impl std::error::Error for SubmitError {}
