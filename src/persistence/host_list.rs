//! Host-list source.
//!
//! One host per line. The order of the file is the initial rank of the pool.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostListError {
    #[error("failed to read host list {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Parse host-list text. Blank lines are skipped, repeated hosts keep their first line.
pub fn parse_host_list(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut hosts = Vec::new();

    for line in content.lines() {
        let host = line.trim();
        if host.is_empty() {
            continue;
        }
        if !seen.insert(host) {
            tracing::warn!(host = %host, "Duplicate host in host list ignored");
            continue;
        }
        hosts.push(host.to_string());
    }
    hosts
}

/// Read the host list from disk.
pub fn load_host_list(path: &Path) -> Result<Vec<String>, HostListError> {
    let content = fs::read_to_string(path).map_err(|source| HostListError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_host_list(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let hosts = parse_host_list("10.0.0.1\r\n10.0.0.2\n\n  10.0.0.3  \n10.0.0.1\n");
        assert_eq!(hosts, vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
    }

    #[test]
    fn test_empty() {
        assert!(parse_host_list("").is_empty());
        assert!(parse_host_list("\n\n").is_empty());
    }

    #[test]
    fn test_missing_file() {
        let err = load_host_list(Path::new("/no/such/hosts.txt")).unwrap_err();
        assert!(err.to_string().contains("hosts.txt"));
    }
}
