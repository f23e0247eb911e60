//! Typed argument values and the parser that builds them from operator text.

use core::{fmt, str::FromStr};

use log::{debug, warn};

/// Size of the inline string buffer carried by every [`TypedValue`], including the NUL terminator.
///
/// Strings longer than `INLINE_TEXT_CAPACITY - 1` bytes are truncated without an error. The value
/// remembers that it was truncated, see [`TypedValue::is_truncated`].
pub const INLINE_TEXT_CAPACITY: usize = 250;

/// Which register file an argument travels in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterClass {
    /// General purpose registers (integers, characters, pointers).
    Integer,
    /// Vector registers. Always carried at double precision.
    FloatingPoint,
}

/// A printf-style format qualifier describing how to read an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `%c`: the first character of the value text.
    Char,
    /// `%d`: signed 32-bit integer.
    Int32,
    /// `%ld` / `%lld`: signed 64-bit integer.
    Int64,
    /// `%u`: unsigned 32-bit integer.
    UInt32,
    /// `%lu` / `%llu`: unsigned 64-bit integer.
    UInt64,
    /// `%s`: a NUL terminated string passed by pointer.
    Str,
    /// `%f`: single precision float, widened to double.
    Float32,
    /// `%lf`: double precision float.
    Float64,
    /// Anything else. Accepted, but the argument payload is zero.
    Unknown,
}

impl Format {
    /// Parses a qualifier token. The leading `%` is optional.
    ///
    /// This never fails: unrecognised qualifiers map to [`Format::Unknown`].
    pub fn parse(token: &str) -> Format {
        let token = token.strip_prefix('%').unwrap_or(token);
        match token {
            "c" => Format::Char,
            "d" => Format::Int32,
            "ld" | "lld" => Format::Int64,
            "u" => Format::UInt32,
            "lu" | "llu" => Format::UInt64,
            "s" => Format::Str,
            "f" => Format::Float32,
            "lf" => Format::Float64,
            _ => Format::Unknown,
        }
    }

    /// The register class values of this format are passed in.
    pub fn class(self) -> RegisterClass {
        match self {
            Format::Float32 | Format::Float64 => RegisterClass::FloatingPoint,
            _ => RegisterClass::Integer,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Format::Char => "%c",
            Format::Int32 => "%d",
            Format::Int64 => "%ld",
            Format::UInt32 => "%u",
            Format::UInt64 => "%lu",
            Format::Str => "%s",
            Format::Float32 => "%f",
            Format::Float64 => "%lf",
            Format::Unknown => "%?",
        };
        f.write_str(s)
    }
}

/// Errors produced while converting operator text into a [`TypedValue`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// The text is not a number in any accepted form.
    #[error("'{0}' is not a valid number")]
    InvalidNumber(alloc::string::String),
    /// The number is valid but too large for the qualifier's width.
    #[error("{value} does not fit in {format}")]
    OutOfRange {
        /// The text as typed.
        value: alloc::string::String,
        /// The qualifier it was read with.
        format: Format,
    },
    /// `%c` with nothing to take a character from.
    #[error("expected a character, got an empty value")]
    EmptyChar,
}

/// A fixed-capacity, always NUL terminated byte string.
#[derive(Clone, Copy, PartialEq, Eq)]
struct InlineText {
    data: [u8; INLINE_TEXT_CAPACITY],
    len: u8,
}

impl InlineText {
    fn new(s: &str) -> (Self, bool) {
        let mut data = [0u8; INLINE_TEXT_CAPACITY];
        let len = s.len().min(INLINE_TEXT_CAPACITY - 1);
        data[..len].copy_from_slice(&s.as_bytes()[..len]);
        (
            Self {
                data,
                len: len as u8,
            },
            len < s.len(),
        )
    }

    fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }
}

impl fmt::Debug for InlineText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", core::str::from_utf8(self.as_bytes()).unwrap_or("<binary>"))
    }
}

/// A single call argument: 64 raw bits plus the register class they travel in.
///
/// String values own their bytes inline. Their payload is the address of that inline buffer, so
/// it is only meaningful while the value stays where it is; [`crate::MarshalledCall`] borrows the
/// argument list for exactly that reason.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    bits: u64,
    class: RegisterClass,
    text: Option<InlineText>,
    truncated: bool,
}

impl TypedValue {
    /// An integer-class value.
    pub const fn integer(bits: u64) -> Self {
        Self {
            bits,
            class: RegisterClass::Integer,
            text: None,
            truncated: false,
        }
    }

    /// A floating-point value, carried at double precision.
    pub fn double(value: f64) -> Self {
        Self {
            bits: value.to_bits(),
            class: RegisterClass::FloatingPoint,
            text: None,
            truncated: false,
        }
    }

    /// A single precision value. It is widened to double before it is stored.
    pub fn single(value: f32) -> Self {
        Self::double(f64::from(value))
    }

    /// A string value, copied into the inline buffer and truncated to
    /// `INLINE_TEXT_CAPACITY - 1` bytes if needed.
    pub fn text(s: &str) -> Self {
        let (text, truncated) = InlineText::new(s);
        if truncated {
            debug!(
                "string argument truncated from {} to {} bytes",
                s.len(),
                INLINE_TEXT_CAPACITY - 1
            );
        }
        Self {
            bits: 0,
            class: RegisterClass::Integer,
            text: Some(text),
            truncated,
        }
    }

    /// Converts `text` according to `format`.
    ///
    /// [`Format::Unknown`] yields an integer-class zero rather than an error.
    pub fn parse(format: Format, text: &str) -> Result<Self, ValueError> {
        let text_trimmed = text.trim();
        let value = match format {
            Format::Char => {
                let byte = *text.as_bytes().first().ok_or(ValueError::EmptyChar)?;
                TypedValue::integer(u64::from(byte))
            }
            Format::Int32 => {
                let v = parse_signed(text_trimmed)?;
                let v = i32::try_from(v).map_err(|_| out_of_range(text_trimmed, format))?;
                TypedValue::integer(i64::from(v) as u64)
            }
            Format::Int64 => TypedValue::integer(parse_signed(text_trimmed)? as u64),
            Format::UInt32 => {
                let v = parse_unsigned(text_trimmed)?;
                let v = u32::try_from(v).map_err(|_| out_of_range(text_trimmed, format))?;
                TypedValue::integer(u64::from(v))
            }
            Format::UInt64 => TypedValue::integer(parse_unsigned(text_trimmed)?),
            Format::Str => TypedValue::text(text),
            Format::Float32 => TypedValue::single(parse_float(text_trimmed)?),
            Format::Float64 => TypedValue::double(parse_float(text_trimmed)?),
            Format::Unknown => {
                warn!("unknown format qualifier, passing zero for '{}'", text_trimmed);
                TypedValue::integer(0)
            }
        };
        Ok(value)
    }

    /// The register class this value is passed in.
    pub fn class(&self) -> RegisterClass {
        self.class
    }

    /// The raw 64 bits handed to the callee.
    ///
    /// For strings this is the address of the inline NUL terminated buffer.
    pub fn payload(&self) -> u64 {
        match &self.text {
            Some(text) => text.data.as_ptr() as u64,
            None => self.bits,
        }
    }

    /// The string contents, if this is a string value.
    pub fn as_text(&self) -> Option<&[u8]> {
        self.text.as_ref().map(InlineText::as_bytes)
    }

    /// Returns true if the string passed to [`TypedValue::text`] did not fit.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

fn out_of_range(text: &str, format: Format) -> ValueError {
    ValueError::OutOfRange {
        value: text.into(),
        format,
    }
}

fn invalid(text: &str) -> ValueError {
    ValueError::InvalidNumber(text.into())
}

/// Parses a decimal or `0x` prefixed hexadecimal unsigned number.
pub fn parse_unsigned(s: &str) -> Result<u64, ValueError> {
    let digits = s.strip_prefix('+').unwrap_or(s);
    let parsed = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => digits.parse::<u64>(),
    };
    parsed.map_err(|_| invalid(s))
}

/// Parses a signed number. Accepts the same forms as [`parse_unsigned`] with an optional `-`.
pub fn parse_signed(s: &str) -> Result<i64, ValueError> {
    match s.strip_prefix('-') {
        Some(rest) => {
            let magnitude = parse_unsigned(rest).map_err(|_| invalid(s))?;
            // i64::MIN has no positive counterpart, so negate in i128.
            i64::try_from(-i128::from(magnitude)).map_err(|_| invalid(s))
        }
        None => {
            let v = parse_unsigned(s)?;
            i64::try_from(v).map_err(|_| invalid(s))
        }
    }
}

fn parse_float<T: FromStr>(s: &str) -> Result<T, ValueError> {
    s.parse::<T>().map_err(|_| invalid(s))
}
