/// Shared error type used across all Diana crates.
///
/// One variant per external collaborator, plus `Http` for client
/// construction failures that precede any request.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("HTTP: {0}")]
    Http(String),

    #[error("intent service: {0}")]
    Intent(String),

    #[error("medical service: {0}")]
    Medical(String),

    #[error("geocoding: {0}")]
    Geocoding(String),

    #[error("directory: {0}")]
    Directory(String),

    #[error("encyclopedia: {0}")]
    Encyclopedia(String),

    #[error("messaging: {0}")]
    Messaging(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failing_collaborator() {
        assert_eq!(
            Error::Medical("parse returned 500".into()).to_string(),
            "medical service: parse returned 500"
        );
        assert_eq!(
            Error::Messaging("unknown person p-1".into()).to_string(),
            "messaging: unknown person p-1"
        );
        assert_eq!(Error::Http("builder".into()).to_string(), "HTTP: builder");
    }
}
