// src/wordlist.rs
//! Wordlist of subdomain labels for brute-force

use crate::error::ConfigError;
use crate::normalize::is_valid_hostname;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

/// Handle on a wordlist file. Opening checks it exists; reading is lazy and
/// can be restarted any number of times.
#[derive(Debug, Clone)]
pub struct Wordlist {
    path: PathBuf,
}

impl Wordlist {
    pub fn open(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::WordlistNotFound(path.to_path_buf()));
        }

        // fail now rather than mid-scan on permission problems
        File::open(path).map_err(|source| ConfigError::WordlistUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fresh iterator over labels: trimmed and lowercased. Blank lines, `#`
    /// comments and entries that are not valid DNS labels are skipped.
    pub fn labels(&self) -> Result<Labels, ConfigError> {
        let file = File::open(&self.path).map_err(|source| ConfigError::WordlistUnreadable {
            path: self.path.clone(),
            source,
        })?;

        Ok(Labels {
            lines: BufReader::new(file).lines(),
        })
    }

    /// Number of usable labels, by one full pass over the file
    pub fn count(&self) -> Result<usize, ConfigError> {
        Ok(self.labels()?.count())
    }
}

/// Lazy label iterator. Lines that are not valid UTF-8 are skipped.
pub struct Labels {
    lines: Lines<BufReader<File>>,
}

impl Iterator for Labels {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => continue,
                Err(_) => return None,
            };

            let label = line.trim();
            if label.is_empty() || label.starts_with('#') {
                continue;
            }

            let label = label.to_ascii_lowercase();
            if !is_valid_hostname(&label) {
                continue;
            }
            return Some(label);
        }
    }
}
