//! Topology descriptor parsing.
//!
//! A descriptor is a comma-separated list of `endpointKey:weightSpec`
//! entries, e.g. `db0:r10w10,db1:r5,db2`. The weight spec grammar:
//!
//! - absent or empty: read 10, write 10
//! - a bare number `N`: read N, write N
//! - `r`/`w` tokens with an optional weight, e.g. `r10w5`, `w`, `r20`;
//!   a bare letter means weight 10, an unmentioned role means weight 0

use std::str::FromStr;

use crate::errors::ConfigurationError;

/// Weight applied when a role letter carries no explicit number.
pub const DEFAULT_LETTER_WEIGHT: u32 = 10;

/// One parsed descriptor entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorEntry {
    pub key: String,
    pub read_weight: u32,
    pub write_weight: u32,
}

/// A parsed topology descriptor, entries in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologyDescriptor {
    pub entries: Vec<DescriptorEntry>,
}

impl TopologyDescriptor {
    /// Parse a comma-separated descriptor string. Blank segments are
    /// skipped; a descriptor with no entries at all is an error.
    pub fn parse(s: &str) -> Result<Self, ConfigurationError> {
        let mut entries = Vec::new();
        for raw in s.split(',') {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            entries.push(parse_entry(raw)?);
        }
        if entries.is_empty() {
            return Err(ConfigurationError::EmptyDescriptor);
        }
        Ok(Self { entries })
    }
}

impl FromStr for TopologyDescriptor {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_entry(raw: &str) -> Result<DescriptorEntry, ConfigurationError> {
    let invalid = |reason: &str| ConfigurationError::InvalidDescriptor {
        entry: raw.to_string(),
        reason: reason.to_string(),
    };

    let (key, spec) = match raw.split_once(':') {
        Some((key, spec)) => (key.trim(), Some(spec.trim())),
        None => (raw, None),
    };
    if key.is_empty() {
        return Err(invalid("empty endpoint key"));
    }

    let (read_weight, write_weight) = match spec {
        None | Some("") => (DEFAULT_LETTER_WEIGHT, DEFAULT_LETTER_WEIGHT),
        Some(spec) if spec.bytes().all(|b| b.is_ascii_digit()) => {
            let weight: u32 = spec.parse().map_err(|_| invalid("weight out of range"))?;
            (weight, weight)
        }
        Some(spec) => parse_weight_spec(spec).map_err(|reason| invalid(&reason))?,
    };

    Ok(DescriptorEntry {
        key: key.to_string(),
        read_weight,
        write_weight,
    })
}

fn parse_weight_spec(spec: &str) -> Result<(u32, u32), String> {
    let mut read_weight = 0;
    let mut write_weight = 0;
    let mut chars = spec.chars().peekable();

    while let Some(c) = chars.next() {
        let mut digits = String::new();
        while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
            digits.push(d);
            chars.next();
        }
        let weight = if digits.is_empty() {
            DEFAULT_LETTER_WEIGHT
        } else {
            digits.parse().map_err(|_| "weight out of range".to_string())?
        };
        match c.to_ascii_lowercase() {
            'r' => read_weight = weight,
            'w' => write_weight = weight,
            other => return Err(format!("unexpected character '{other}' in weight spec")),
        }
    }

    Ok((read_weight, write_weight))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(descriptor: &str) -> DescriptorEntry {
        TopologyDescriptor::parse(descriptor)
            .unwrap()
            .entries
            .remove(0)
    }

    #[test]
    fn test_bare_key_defaults_to_both_roles() {
        assert_eq!(
            entry("db0"),
            DescriptorEntry {
                key: "db0".into(),
                read_weight: 10,
                write_weight: 10,
            }
        );
    }

    #[test]
    fn test_numeric_weight_applies_to_both_roles() {
        let e = entry("db0:7");
        assert_eq!((e.read_weight, e.write_weight), (7, 7));
    }

    #[test]
    fn test_role_scoped_weights() {
        let e = entry("db0:r10w5");
        assert_eq!((e.read_weight, e.write_weight), (10, 5));

        let e = entry("db1:r20");
        assert_eq!((e.read_weight, e.write_weight), (20, 0));

        let e = entry("db2:w");
        assert_eq!((e.read_weight, e.write_weight), (0, 10));

        let e = entry("db3:rw");
        assert_eq!((e.read_weight, e.write_weight), (10, 10));
    }

    #[test]
    fn test_entries_keep_declaration_order_and_trim() {
        let parsed = TopologyDescriptor::parse(" db0:10 , db1:5 ,, db2 ").unwrap();
        let keys: Vec<_> = parsed.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["db0", "db1", "db2"]);
    }

    #[test]
    fn test_rejects_empty_descriptor() {
        assert!(matches!(
            TopologyDescriptor::parse("  , ,"),
            Err(ConfigurationError::EmptyDescriptor)
        ));
    }

    #[test]
    fn test_rejects_empty_key_and_bad_spec() {
        assert!(TopologyDescriptor::parse(":10").is_err());
        assert!(TopologyDescriptor::parse("db0:x5").is_err());
        assert!(TopologyDescriptor::parse("db0:99999999999").is_err());
    }

    #[test]
    fn test_zero_weight_is_parseable() {
        let e = entry("db0:r0w10");
        assert_eq!((e.read_weight, e.write_weight), (0, 10));
    }
}
