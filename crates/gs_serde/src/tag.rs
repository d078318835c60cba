use core::fmt;

/// Discriminator written after the type name of a reference type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ObjectTag {
    /// A new object; its members follow later in the stream.
    ObjectReference = 1,
    /// A new collection; a count follows here, the elements and members
    /// follow later in the stream.
    ObjectList = 2,
    /// An object seen before; its index follows, nothing else.
    ObjectIndex = 3,
    /// A new object built by its annotated constructor; the constructor
    /// arguments follow immediately, there is no member list.
    ConstructedObject = 4,
}

impl ObjectTag {
    pub const ALL: [Self; 4] = [
        Self::ObjectReference,
        Self::ObjectList,
        Self::ObjectIndex,
        Self::ConstructedObject,
    ];

    /// The binary encoding.
    #[inline]
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::ObjectReference),
            2 => Some(Self::ObjectList),
            3 => Some(Self::ObjectIndex),
            4 => Some(Self::ConstructedObject),
            _ => None,
        }
    }

    /// The text sigil following a space, `None` for a plain reference,
    /// which is written as a bare line break.
    pub const fn sigil(self) -> Option<u8> {
        match self {
            Self::ObjectReference => None,
            Self::ObjectList => Some(b'*'),
            Self::ObjectIndex => Some(b'#'),
            Self::ConstructedObject => Some(b'!'),
        }
    }

    pub const fn from_sigil(sigil: u8) -> Option<Self> {
        match sigil {
            b'*' => Some(Self::ObjectList),
            b'#' => Some(Self::ObjectIndex),
            b'!' => Some(Self::ConstructedObject),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::ObjectTag;

    #[test]
    fn codes_are_stable() {
        let bytes: Vec<u8> = ObjectTag::ALL.iter().map(|t| t.to_byte()).collect();
        assert_eq!(bytes, [1, 2, 3, 4]);
        assert_eq!(ObjectTag::from_byte(0), None);
        assert_eq!(ObjectTag::from_byte(5), None);
        for tag in ObjectTag::ALL {
            assert_eq!(ObjectTag::from_byte(tag.to_byte()), Some(tag));
            if let Some(sigil) = tag.sigil() {
                assert_eq!(ObjectTag::from_sigil(sigil), Some(tag));
            }
        }
    }
}
