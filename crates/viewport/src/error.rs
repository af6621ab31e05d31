#[derive(Debug, Clone, PartialEq)]
pub enum ViewportError {
    /// Non-finite numbers or a coordinate of the wrong length.
    InvalidArgument(String),
    /// A matrix that had to be inverted has no inverse.
    SingularMatrix(&'static str),
    /// Configuration text could not be parsed into `ViewportProps`.
    InvalidConfig(String),
}

impl ViewportError {
    pub(crate) fn non_finite(name: &str, value: f64) -> Self {
        ViewportError::InvalidArgument(format!("{name} must be finite, got {value}"))
    }
}

impl std::fmt::Display for ViewportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewportError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            ViewportError::SingularMatrix(which) => write!(f, "{which} is not invertible"),
            ViewportError::InvalidConfig(msg) => write!(f, "invalid viewport config: {msg}"),
        }
    }
}

impl std::error::Error for ViewportError {}
