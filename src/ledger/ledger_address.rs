use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use super::ledger_errors::LedgerError;

lazy_static! {
    static ref ADDRESS_RE: Regex = Regex::new(r"^0x[0-9a-fA-F]{40}$").unwrap();
}

/// A validated external-ledger address in canonical (lowercase) form.
///
/// The canonical form is applied once at parse time and used at every
/// storage and gateway boundary, so address equality is plain string
/// equality everywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LedgerAddress(String);

impl LedgerAddress {
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        let trimmed = raw.trim();
        if !ADDRESS_RE.is_match(trimmed) {
            return Err(LedgerError::InvalidAddress(trimmed.to_string()));
        }
        Ok(LedgerAddress(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for LedgerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for LedgerAddress {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LedgerAddress::parse(&value)
    }
}
