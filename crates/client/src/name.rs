//! TFS file names.
//!
//! A name is the durable identifier returned when a written file is
//! closed. It is 18 ASCII characters: a type tag (`T` for small files,
//! `L` for large files) followed by 17 characters of URL-safe base64.

use std::fmt;
use std::str::FromStr;

use crate::ClientError;

/// Length of a TFS file name in bytes.
pub const FILE_NAME_LEN: usize = 18;

/// A validated TFS file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileName(String);

impl FileName {
    /// Validates `raw` as a TFS file name.
    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        if raw.len() != FILE_NAME_LEN {
            return Err(ClientError::InvalidName(format!(
                "expected {FILE_NAME_LEN} characters, got {}",
                raw.len()
            )));
        }

        let mut bytes = raw.bytes();
        match bytes.next() {
            Some(b'T') | Some(b'L') => {}
            _ => {
                return Err(ClientError::InvalidName(format!(
                    "{raw}: must start with 'T' or 'L'"
                )));
            }
        }

        if let Some(bad) = bytes.find(|b| !is_name_char(*b)) {
            return Err(ClientError::InvalidName(format!(
                "{raw}: unexpected character {:?}",
                bad as char
            )));
        }

        Ok(Self(raw.to_owned()))
    }

    /// Returns `true` for large-file names (`L` prefix).
    pub fn is_large(&self) -> bool {
        self.0.starts_with('L')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

impl FromStr for FileName {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FileName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
