//! Address kind enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use datarepo_core::types::Value;

/// What an address is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    /// Where the person lives.
    #[default]
    Home,
    /// Where the person works.
    Work,
    /// Where post should be sent.
    Postal,
}

impl AddressKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Work => "work",
            Self::Postal => "postal",
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AddressKind {
    type Err = datarepo_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "home" => Ok(Self::Home),
            "work" => Ok(Self::Work),
            "postal" => Ok(Self::Postal),
            _ => Err(datarepo_core::AppError::validation(format!(
                "Invalid address kind: '{s}'"
            ))),
        }
    }
}

impl From<AddressKind> for Value {
    fn from(kind: AddressKind) -> Self {
        Value::Text(kind.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!("WORK".parse::<AddressKind>().unwrap(), AddressKind::Work);
        assert_eq!(AddressKind::Postal.to_string(), "postal");
        assert!("moon".parse::<AddressKind>().is_err());
        assert_eq!(Value::from(AddressKind::Home), Value::Text("home".into()));
    }
}
