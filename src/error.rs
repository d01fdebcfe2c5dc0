/// Broad failure category; decides the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input dataset file does not exist.
    DataNotFound,
    /// A required column is absent from the input table.
    MissingColumn,
    /// The input table could not be parsed into observations.
    InvalidData,
    /// Invalid run configuration (paths, bounds, CLI values).
    Config,
    /// Filesystem failure while reading or writing outputs.
    Io,
    /// Plot rendering failure.
    Render,
    /// Terminal setup or event handling failure.
    Terminal,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::DataNotFound | ErrorKind::MissingColumn | ErrorKind::InvalidData | ErrorKind::Config => 2,
            ErrorKind::Io | ErrorKind::Render | ErrorKind::Terminal => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
