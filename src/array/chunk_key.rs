//! Chunk key formatting.
//!
//! A chunk is keyed by its grid indices rendered as shortest decimal strings
//! and joined with a [`ChunkKeySeparator`]: `.` produces *flat* keys
//! (`1.2.3`) and `/` produces *nested* keys (`1/2/3`), where the store
//! places each dimension in its own directory level.

use derive_more::Display;

/// A chunk key separator.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
pub enum ChunkKeySeparator {
    /// The slash `/` character. Produces nested chunk keys.
    #[display("/")]
    Slash,
    /// The dot `.` character. Produces flat chunk keys.
    #[display(".")]
    Dot,
}

impl TryFrom<char> for ChunkKeySeparator {
    type Error = char;

    fn try_from(separator: char) -> Result<Self, Self::Error> {
        match separator {
            '/' => Ok(Self::Slash),
            '.' => Ok(Self::Dot),
            _ => Err(separator),
        }
    }
}

impl serde::Serialize for ChunkKeySeparator {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Slash => s.serialize_char('/'),
            Self::Dot => s.serialize_char('.'),
        }
    }
}

impl<'de> serde::Deserialize<'de> for ChunkKeySeparator {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(d)?;
        if let serde_json::Value::String(separator) = value {
            if separator == "/" {
                return Ok(Self::Slash);
            } else if separator == "." {
                return Ok(Self::Dot);
            }
        }
        Err(serde::de::Error::custom(
            "chunk key separator must be a `.` or `/`.",
        ))
    }
}

/// Encode chunk grid indices into a chunk key with `separator`.
#[must_use]
pub fn format_chunk_key(chunk_grid_indices: &[u64], separator: ChunkKeySeparator) -> String {
    chunk_grid_indices
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<String>>()
        .join(&separator.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_key_formatting() {
        assert_eq!(format_chunk_key(&[1, 2, 3], ChunkKeySeparator::Dot), "1.2.3");
        assert_eq!(
            format_chunk_key(&[1, 2, 3], ChunkKeySeparator::Slash),
            "1/2/3"
        );
        assert_eq!(format_chunk_key(&[10], ChunkKeySeparator::Dot), "10");
    }

    #[test]
    fn chunk_key_separator_serde() {
        assert_eq!(
            serde_json::to_string(&ChunkKeySeparator::Slash).unwrap(),
            "\"/\""
        );
        assert_eq!(
            serde_json::from_str::<ChunkKeySeparator>("\".\"").unwrap(),
            ChunkKeySeparator::Dot
        );
        assert!(serde_json::from_str::<ChunkKeySeparator>("\"-\"").is_err());
        assert_eq!(ChunkKeySeparator::try_from('/'), Ok(ChunkKeySeparator::Slash));
        assert_eq!(ChunkKeySeparator::try_from('-'), Err('-'));
    }
}
