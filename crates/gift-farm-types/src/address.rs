//! TON address parsing and canonicalization.
//!
//! Wallets, indexers and config files hand out the same account in raw
//! (`0:ab..`) and user-friendly (`EQ..`, `UQ..`, `kQ..`) encodings. Compare
//! addresses only after [`normalize_address`].

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};

use crate::AddressError;

const TAG_BOUNCEABLE: u8 = 0x11;
const TAG_NON_BOUNCEABLE: u8 = 0x51;
const TAG_TEST_ONLY: u8 = 0x80;
/// Base64 characters in a user-friendly address.
const FRIENDLY_LEN: usize = 48;
/// `tag | workchain | hash(32) | crc16(2)`.
const FRIENDLY_BYTES: usize = 36;
const HASH_HEX_LEN: usize = 64;

/// Account address: workchain plus 256-bit account hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TonAddress {
    pub workchain: i8,
    pub hash: [u8; 32],
}

/// Rendering options for the user-friendly form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FriendlyFormat {
    pub bounceable: bool,
    pub url_safe: bool,
    pub testnet: bool,
}

impl Default for FriendlyFormat {
    /// Bounceable, url-safe, mainnet (`EQ...`).
    fn default() -> Self {
        Self {
            bounceable: true,
            url_safe: true,
            testnet: false,
        }
    }
}

/// Result of [`TonAddress::parse_detailed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedAddress {
    pub address: TonAddress,
    /// `None` when the input was in raw form.
    pub format: Option<FriendlyFormat>,
}

impl TonAddress {
    pub fn new(workchain: i8, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }

    pub fn parse(input: &str) -> Result<Self, AddressError> {
        Self::parse_detailed(input).map(|parsed| parsed.address)
    }

    /// Parse either encoding, keeping the flags of a user-friendly input.
    pub fn parse_detailed(input: &str) -> Result<ParsedAddress, AddressError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AddressError::Empty);
        }
        if let Some((workchain, hash_hex)) = input.split_once(':') {
            let address = parse_raw(workchain, hash_hex)?;
            return Ok(ParsedAddress {
                address,
                format: None,
            });
        }
        parse_friendly(input)
    }

    /// Canonical form: `"<workchain>:<lowercase hex>"`.
    pub fn to_raw(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash))
    }

    pub fn to_friendly(&self, format: FriendlyFormat) -> String {
        let mut tag = if format.bounceable {
            TAG_BOUNCEABLE
        } else {
            TAG_NON_BOUNCEABLE
        };
        if format.testnet {
            tag |= TAG_TEST_ONLY;
        }

        let mut bytes = [0u8; FRIENDLY_BYTES];
        bytes[0] = tag;
        bytes[1] = self.workchain as u8;
        bytes[2..34].copy_from_slice(&self.hash);
        let crc = crc16(&bytes[..34]);
        bytes[34..].copy_from_slice(&crc.to_be_bytes());

        if format.url_safe {
            URL_SAFE.encode(bytes)
        } else {
            STANDARD.encode(bytes)
        }
    }
}

impl fmt::Display for TonAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_raw())
    }
}

impl FromStr for TonAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse any supported encoding and return the canonical raw form.
pub fn normalize_address(input: &str) -> Result<String, AddressError> {
    TonAddress::parse(input).map(|address| address.to_raw())
}

fn parse_raw(workchain: &str, hash_hex: &str) -> Result<TonAddress, AddressError> {
    let workchain: i8 = workchain
        .parse()
        .map_err(|_| AddressError::InvalidWorkchain(workchain.to_string()))?;
    if hash_hex.len() != HASH_HEX_LEN {
        return Err(AddressError::InvalidLength(hash_hex.len()));
    }
    let mut hash = [0u8; 32];
    hex::decode_to_slice(hash_hex, &mut hash)
        .map_err(|e| AddressError::InvalidHex(e.to_string()))?;
    Ok(TonAddress { workchain, hash })
}

fn parse_friendly(input: &str) -> Result<ParsedAddress, AddressError> {
    if input.len() != FRIENDLY_LEN {
        return Err(AddressError::InvalidLength(input.len()));
    }

    let url_safe = !input.contains(|c: char| c == '+' || c == '/');
    // Accept either alphabet by folding url-safe characters onto the standard one.
    let folded: String = input
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let bytes = STANDARD
        .decode(folded)
        .map_err(|e| AddressError::InvalidBase64(e.to_string()))?;
    if bytes.len() != FRIENDLY_BYTES {
        return Err(AddressError::InvalidLength(bytes.len()));
    }

    let tag = bytes[0];
    let testnet = tag & TAG_TEST_ONLY != 0;
    let bounceable = match tag & !TAG_TEST_ONLY {
        TAG_BOUNCEABLE => true,
        TAG_NON_BOUNCEABLE => false,
        _ => return Err(AddressError::InvalidFlags(tag)),
    };

    let expected = u16::from_be_bytes([bytes[34], bytes[35]]);
    if crc16(&bytes[..34]) != expected {
        return Err(AddressError::ChecksumMismatch);
    }

    let mut hash = [0u8; 32];
    hash.copy_from_slice(&bytes[2..34]);

    Ok(ParsedAddress {
        address: TonAddress {
            workchain: bytes[1] as i8,
            hash,
        },
        format: Some(FriendlyFormat {
            bounceable,
            url_safe,
            testnet,
        }),
    })
}

/// CRC16/XMODEM (poly 0x1021, init 0).
fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}
