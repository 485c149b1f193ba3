// Import error types
//
// Only I/O-level failures are fatal to a file's parse. Content-level
// problems (short lines, bad values, unknown record types) are reported
// through FileReport diagnostics and never abort the run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    /// The file could not be read at all (missing, permissions, etc.)
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A directory import requires its index/config file to exist
    #[error("required config file not found: {}", .0.display())]
    MissingConfig(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ImportError::MissingConfig(PathBuf::from("/tmp/hpdb.cfg"));
        assert_eq!(
            err.to_string(),
            "required config file not found: /tmp/hpdb.cfg"
        );
    }
}
