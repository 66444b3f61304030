use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("Window error: {0}")]
    Window(String),

    #[error("Vibration unavailable: {0}")]
    Vibration(String),

    #[error("Overlay permission not granted")]
    PermissionDenied,
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::Io(io_err);
        assert!(err.to_string().contains("IO error"));
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn test_error_display_json() {
        let json_err = serde_json::from_str::<String>("not valid json").unwrap_err();
        let err = Error::Json(json_err);
        assert!(err.to_string().contains("JSON error"));
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("entry height must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Config error: entry height must be positive"
        );
    }

    #[test]
    fn test_error_display_data_source() {
        let err = Error::DataSource("transaction aborted".to_string());
        assert_eq!(err.to_string(), "Data source error: transaction aborted");
    }

    #[test]
    fn test_error_display_window() {
        let err = Error::Window("window 3 not attached".to_string());
        assert_eq!(err.to_string(), "Window error: window 3 not attached");
    }

    #[test]
    fn test_error_display_permission_denied() {
        assert_eq!(
            Error::PermissionDenied.to_string(),
            "Overlay permission not granted"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<i32>("\"not a number\"").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
