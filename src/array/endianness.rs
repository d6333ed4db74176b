use derive_more::Display;

/// The endianness of each element in an array, either `big` or `little`.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
pub enum Endianness {
    /// Little endian.
    #[display("little")]
    Little,

    /// Big endian.
    #[display("big")]
    Big,
}

impl Endianness {
    /// Return true if the endianness matches the endianness of the CPU.
    #[must_use]
    pub fn is_native(self) -> bool {
        self == NATIVE_ENDIAN
    }

    /// The data type code prefix character for elements of `element_size` bytes.
    ///
    /// Single byte elements have no byte order and use `|`.
    #[must_use]
    pub fn prefix(self, element_size: usize) -> char {
        if element_size == 1 {
            '|'
        } else {
            match self {
                Self::Little => '<',
                Self::Big => '>',
            }
        }
    }

    /// Parse an endianness from a data type code prefix character.
    ///
    /// Returns [`None`] for an unrecognised prefix.
    /// `|` (no byte order) parses to the native endianness, under which
    /// elements need no conversion.
    #[must_use]
    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            '<' => Some(Self::Little),
            '>' => Some(Self::Big),
            '|' => Some(NATIVE_ENDIAN),
            _ => None,
        }
    }
}

/// The endianness of the CPU.
pub const NATIVE_ENDIAN: Endianness = if cfg!(target_endian = "big") {
    Endianness::Big
} else {
    Endianness::Little
};

/// Reverse the bytes of each `element_size` sized element of `bytes`.
///
/// Converts elements between little and big endian representations in place.
///
/// # Panics
/// Panics if the length of `bytes` is not a multiple of `element_size`.
pub fn reverse_element_bytes(bytes: &mut [u8], element_size: usize) {
    assert!(bytes.len() % element_size == 0);
    if element_size > 1 {
        for element in bytes.chunks_exact_mut(element_size) {
            element.reverse();
        }
    }
}
