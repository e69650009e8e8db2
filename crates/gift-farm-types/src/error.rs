/// Address parsing error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    Empty,
    InvalidWorkchain(String),
    InvalidHex(String),
    InvalidLength(usize),
    InvalidBase64(String),
    InvalidFlags(u8),
    ChecksumMismatch,
}

impl std::fmt::Display for AddressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty address"),
            Self::InvalidWorkchain(wc) => write!(f, "invalid workchain: {wc}"),
            Self::InvalidHex(msg) => write!(f, "invalid address hash: {msg}"),
            Self::InvalidLength(len) => write!(f, "invalid address length: {len}"),
            Self::InvalidBase64(msg) => write!(f, "invalid base64 address: {msg}"),
            Self::InvalidFlags(tag) => write!(f, "invalid address tag: 0x{tag:02x}"),
            Self::ChecksumMismatch => write!(f, "address checksum mismatch"),
        }
    }
}

impl std::error::Error for AddressError {}
