use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    FlowsEmpty(String),
    DuplicateOutput(String),
    DuplicateEndpoint(String),
    InvalidFlow(String),
    BadUrl(String),
    NotInRange(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::FlowsEmpty(e) => write!(f, "Flows configuration error: {}", e),
            ConfigError::DuplicateOutput(e) => {
                write!(f, "Output filename used by more than one flow: {}", e)
            }
            ConfigError::DuplicateEndpoint(e) => write!(f, "Endpoint declared twice: {}", e),
            ConfigError::InvalidFlow(e) => write!(f, "Invalid flow: {}", e),
            ConfigError::BadUrl(e) => write!(f, "URL formatting error: {}", e),
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::TomlError(err.to_string())
    }
}

/// Failures reported by a page driver.
#[derive(Debug)]
pub enum DriverError {
    Navigation(String),
    Timeout(String),
    Capture(String),
    NoPage,
    BrowserUnavailable(String),
    IoError(std::io::Error),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Navigation(e) => write!(f, "Navigation failed: {}", e),
            DriverError::Timeout(e) => write!(f, "Timed out: {}", e),
            DriverError::Capture(e) => write!(f, "Capture failed: {}", e),
            DriverError::NoPage => write!(f, "No page loaded"),
            DriverError::BrowserUnavailable(e) => write!(f, "Browser not available: {}", e),
            DriverError::IoError(e) => write!(f, "Driver IO error: {}", e),
        }
    }
}

impl std::error::Error for DriverError {}

impl From<std::io::Error> for DriverError {
    fn from(err: std::io::Error) -> Self {
        DriverError::IoError(err)
    }
}

#[derive(Debug)]
pub enum StorageError {
    WriteFailed(String),
    ReadFailed(String),
    Corrupted(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::WriteFailed(e) => write!(f, "Storage write failed: {}", e),
            StorageError::ReadFailed(e) => write!(f, "Storage read failed: {}", e),
            StorageError::Corrupted(e) => write!(f, "Stored document is corrupted: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

#[derive(Debug)]
pub enum CaptureError {
    ConfigurationError(ConfigError),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::ConfigurationError(e) => write!(f, "Capture configuration error: {}", e),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<ConfigError> for CaptureError {
    fn from(err: ConfigError) -> Self {
        CaptureError::ConfigurationError(err)
    }
}

/// Failures of the external batch script or version-control commands.
#[derive(Debug)]
pub enum ExecutorError {
    SpawnFailed(String, std::io::Error),
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorError::SpawnFailed(cmd, e) => write!(f, "Unable to run `{}`: {}", cmd, e),
            ExecutorError::CommandFailed {
                command,
                code,
                stderr,
            } => match code {
                Some(code) => write!(f, "`{}` exited with {}: {}", command, code, stderr.trim()),
                None => write!(f, "`{}` terminated by signal: {}", command, stderr.trim()),
            },
        }
    }
}

impl std::error::Error for ExecutorError {}

#[derive(Debug)]
pub enum HealthError {
    ClientBuild(String),
    Request(String),
    UnexpectedStatus(u16),
}

impl fmt::Display for HealthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthError::ClientBuild(e) => write!(f, "Unable to build HTTP client: {}", e),
            HealthError::Request(e) => write!(f, "Health request failed: {}", e),
            HealthError::UnexpectedStatus(code) => write!(f, "Unexpected status code {}", code),
        }
    }
}

impl std::error::Error for HealthError {}

#[derive(Debug)]
pub enum ControllerError {
    ConfigurationError(ConfigError),
    StorageError(StorageError),
    DriverError(DriverError),
    HealthError(HealthError),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            ControllerError::StorageError(e) => write!(f, "Storage error: {}", e),
            ControllerError::DriverError(e) => write!(f, "Driver error: {}", e),
            ControllerError::HealthError(e) => write!(f, "Health probe error: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        ControllerError::ConfigurationError(err)
    }
}

impl From<StorageError> for ControllerError {
    fn from(err: StorageError) -> Self {
        ControllerError::StorageError(err)
    }
}

impl From<HealthError> for ControllerError {
    fn from(err: HealthError) -> Self {
        ControllerError::HealthError(err)
    }
}

impl From<DriverError> for ControllerError {
    fn from(err: DriverError) -> Self {
        ControllerError::DriverError(err)
    }
}
