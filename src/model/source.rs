use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Adapter identifier used to dispatch a crawl
///
/// The set is closed: unknown identifiers are rejected when parsed, so every
/// dispatch site can `match` exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Static listing site phongtro123.com
    Phongtro123,
    /// Static listing site batdongsan.com.vn
    Batdongsan,
    /// JS-rendered marketplace chotot.com (headless browser)
    Chotot,
    /// Social group feed through the Graph API
    FacebookGroup,
    /// Social group page through an authenticated headless browser
    FacebookGroupPw,
}

impl Source {
    /// All adapters, in declaration order
    pub const ALL: [Source; 5] = [
        Source::Phongtro123,
        Source::Batdongsan,
        Source::Chotot,
        Source::FacebookGroup,
        Source::FacebookGroupPw,
    ];

    /// Returns the identifier used in job files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Phongtro123 => "phongtro123",
            Source::Batdongsan => "batdongsan",
            Source::Chotot => "chotot",
            Source::FacebookGroup => "facebook_group",
            Source::FacebookGroupPw => "facebook_group_pw",
        }
    }

    /// Returns the origin persisted on listings produced by this adapter
    pub fn origin(&self) -> Origin {
        match self {
            Source::Phongtro123 => Origin::Phongtro123,
            Source::Batdongsan => Origin::Batdongsan,
            Source::Chotot => Origin::Chotot,
            Source::FacebookGroup | Source::FacebookGroupPw => Origin::Facebook,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Source::ALL
            .into_iter()
            .find(|source| source.as_str() == wanted)
            .ok_or_else(|| ConfigError::UnknownSource(s.to_string()))
    }
}

/// Origin of a stored listing
///
/// Both social adapters persist as `facebook`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Phongtro123,
    Batdongsan,
    Chotot,
    Facebook,
}

impl Origin {
    /// Converts the origin to its database string
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Origin::Phongtro123 => "phongtro123",
            Origin::Batdongsan => "batdongsan",
            Origin::Chotot => "chotot",
            Origin::Facebook => "facebook",
        }
    }

    /// Parses an origin from its database string
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "phongtro123" => Some(Origin::Phongtro123),
            "batdongsan" => Some(Origin::Batdongsan),
            "chotot" => Some(Origin::Chotot),
            "facebook" => Some(Origin::Facebook),
            _ => None,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parse_round_trip() {
        for source in Source::ALL {
            assert_eq!(source.as_str().parse::<Source>().unwrap(), source);
        }
    }

    #[test]
    fn test_source_parse_is_case_insensitive() {
        assert_eq!("Phongtro123".parse::<Source>().unwrap(), Source::Phongtro123);
        assert_eq!(" chotot ".parse::<Source>().unwrap(), Source::Chotot);
    }

    #[test]
    fn test_unknown_source_rejected() {
        let err = "craigslist".parse::<Source>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSource(ref s) if s == "craigslist"));
    }

    #[test]
    fn test_social_adapters_share_origin() {
        assert_eq!(Source::FacebookGroup.origin(), Origin::Facebook);
        assert_eq!(Source::FacebookGroupPw.origin(), Origin::Facebook);
        assert_eq!(Source::Batdongsan.origin(), Origin::Batdongsan);
    }

    #[test]
    fn test_origin_db_strings() {
        for origin in [
            Origin::Phongtro123,
            Origin::Batdongsan,
            Origin::Chotot,
            Origin::Facebook,
        ] {
            assert_eq!(Origin::from_db_string(origin.to_db_string()), Some(origin));
        }
        assert_eq!(Origin::from_db_string("unknown"), None);
    }
}
