use core::fmt;

use gs_reflect::registry::MemberOrder;
use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// Mode

/// How the members of an occurrence are laid out.
///
/// The mode is written at the start of every stream and the reader always
/// follows the stream's mode, whatever its own options say.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Members sorted by name, values only.
    #[default]
    Default,
    /// Members in declaration order, each occurrence prefixed with the
    /// names of the members it contains.
    ByName,
    /// Members in declaration order, values only.
    Declared,
}

impl Mode {
    pub const ALL: [Self; 3] = [Self::Default, Self::ByName, Self::Declared];

    /// Name used by the text encoding.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::ByName => "ByName",
            Self::Declared => "Declared",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.name() == name)
    }

    /// Value used by the binary encoding.
    #[inline]
    pub const fn to_u32(self) -> u32 {
        self as u32
    }

    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Default),
            1 => Some(Self::ByName),
            2 => Some(Self::Declared),
            _ => None,
        }
    }

    /// Order in which members are written.
    pub const fn member_order(self) -> MemberOrder {
        match self {
            Self::Default => MemberOrder::Lexicographic,
            Self::ByName | Self::Declared => MemberOrder::Declared,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// -----------------------------------------------------------------------------
// Format

/// Byte representation of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Encoding {
    Binary,
    Text,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Binary => "binary",
            Self::Text => "text",
        })
    }
}

/// Which encodings are written and accepted.
///
/// The `*Preferred` formats write their encoding and read either one,
/// detected from the first byte of the stream. The `*Only` formats reject
/// the other encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Format {
    #[default]
    BinaryPreferred,
    TextPreferred,
    BinaryOnly,
    TextOnly,
}

impl Format {
    /// Encoding used when writing.
    pub const fn encoding(self) -> Encoding {
        match self {
            Self::BinaryPreferred | Self::BinaryOnly => Encoding::Binary,
            Self::TextPreferred | Self::TextOnly => Encoding::Text,
        }
    }

    /// Returns `true` if a stream in `encoding` may be read.
    pub const fn accepts(self, encoding: Encoding) -> bool {
        match self {
            Self::BinaryPreferred | Self::TextPreferred => true,
            Self::BinaryOnly => matches!(encoding, Encoding::Binary),
            Self::TextOnly => matches!(encoding, Encoding::Text),
        }
    }
}

// -----------------------------------------------------------------------------
// SerializerOptions

/// Configuration of a [`GraphSerializer`](crate::GraphSerializer).
///
/// Every field has a default, so partial configurations deserialize:
///
/// ```
/// use gs_serde::{Format, Mode, SerializerOptions};
///
/// let options: SerializerOptions = ron::from_str("(mode: ByName, format: TextOnly)").unwrap();
/// assert_eq!(options.mode, Mode::ByName);
/// assert_eq!(options.format, Format::TextOnly);
/// assert_eq!(options.buffer_size, 4096);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerOptions {
    /// Member layout used when writing.
    pub mode: Mode,
    pub format: Format,
    /// Full name of the type the root must be or derive from.
    pub root_type: Option<String>,
    /// Size of the stream buffer in bytes.
    pub buffer_size: usize,
    /// Longest string or type name accepted, in UTF-16 code units.
    pub max_string_len: usize,
    /// Largest member name list accepted.
    pub max_member_names: usize,
    /// Deepest nesting of structs and constructor arguments.
    pub max_depth: usize,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Default,
            format: Format::BinaryPreferred,
            root_type: None,
            buffer_size: 4096,
            max_string_len: 1 << 24,
            max_member_names: 1 << 16,
            max_depth: 512,
        }
    }
}

impl SerializerOptions {
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_root_type(mut self, name: impl Into<String>) -> Self {
        self.root_type = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    #[must_use]
    pub fn with_max_string_len(mut self, len: usize) -> Self {
        self.max_string_len = len;
        self
    }

    #[must_use]
    pub fn with_max_member_names(mut self, count: usize) -> Self {
        self.max_member_names = count;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

// -----------------------------------------------------------------------------
// Tests
