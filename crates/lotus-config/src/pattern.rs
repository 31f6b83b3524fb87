use regex::Regex;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A schema or table name pattern, compiled once at config load time.
///
/// Config authors write either a bare string (`"public"`), a regex object
/// (`{regex: "^tmp_"}`), or the literal `"*"` for "matches anything". This
/// mirrors the teacher's untagged-enum config types (`TenantConfig`,
/// `SoftDeleteValue`) but adds up-front regex compilation, which the
/// teacher's own `TypesDefinition` stores as raw strings and never compiles.
#[derive(Debug, Clone)]
pub enum Pattern {
    Exact(String),
    Regex(Regex),
    All,
}

impl Pattern {
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Pattern::Exact(s) => s == candidate,
            Pattern::Regex(re) => re.is_match(candidate),
            Pattern::All => true,
        }
    }

    pub fn exact(s: impl Into<String>) -> Self {
        Pattern::Exact(s.into())
    }

    pub fn regex(source: &str) -> Result<Self, regex::Error> {
        Ok(Pattern::Regex(Regex::new(source)?))
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Pattern::Exact(a), Pattern::Exact(b)) => a == b,
            (Pattern::Regex(a), Pattern::Regex(b)) => a.as_str() == b.as_str(),
            (Pattern::All, Pattern::All) => true,
            _ => false,
        }
    }
}

/// Raw, not-yet-compiled form as it appears in YAML/TOML.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
enum RawPattern {
    Regex { regex: String },
    Bare(String),
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Output, S::Error>
    where
        S: Serializer,
    {
        match self {
            Pattern::Exact(s) => serializer.serialize_str(s),
            Pattern::All => serializer.serialize_str("*"),
            Pattern::Regex(re) => {
                RawPattern::Regex { regex: re.as_str().to_string() }.serialize(serializer)
            }
        }
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawPattern::deserialize(deserializer)?;
        match raw {
            RawPattern::Bare(s) if s == "*" => Ok(Pattern::All),
            RawPattern::Bare(s) => Ok(Pattern::Exact(s)),
            RawPattern::Regex { regex } => {
                Regex::new(&regex).map(Pattern::Regex).map_err(de::Error::custom)
            }
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Exact(s) => write!(f, "{s}"),
            Pattern::Regex(re) => write!(f, "/{}/", re.as_str()),
            Pattern::All => write!(f, "*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_matches_only_itself() {
        let p = Pattern::exact("public");
        assert!(p.matches("public"));
        assert!(!p.matches("public2"));
    }

    #[test]
    fn all_matches_anything() {
        assert!(Pattern::All.matches("anything_at_all"));
    }

    #[test]
    fn regex_matches_by_compiled_pattern() {
        let p = Pattern::regex("^pg_temp").unwrap();
        assert!(p.matches("pg_temp_1"));
        assert!(!p.matches("public"));
    }

    #[test]
    fn deserializes_bare_string_as_exact() {
        let p: Pattern = serde_yaml::from_str("public").unwrap();
        assert_eq!(p, Pattern::Exact("public".into()));
    }

    #[test]
    fn deserializes_star_as_all() {
        let p: Pattern = serde_yaml::from_str("\"*\"").unwrap();
        assert_eq!(p, Pattern::All);
    }

    #[test]
    fn deserializes_regex_object() {
        let p: Pattern = serde_yaml::from_str("regex: \"^pg_\"").unwrap();
        assert!(matches!(p, Pattern::Regex(_)));
        assert!(p.matches("pg_catalog"));
    }

    #[test]
    fn rejects_invalid_regex_at_load_time() {
        let result: Result<Pattern, _> = serde_yaml::from_str("regex: \"(unterminated\"");
        assert!(result.is_err());
    }
}
