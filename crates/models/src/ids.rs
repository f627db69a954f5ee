use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceIdError {
    #[error("trace ID is empty")]
    Empty,

    #[error("trace ID '{0}' is longer than 32 hex characters")]
    TooLong(String),

    #[error("trace ID '{0}' is not valid hex")]
    InvalidHex(String),
}

/// 128-bit trace identifier.
///
/// Rendered as 16 hex characters when the high half is zero, 32 otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TraceId {
    pub high: u64,
    pub low: u64,
}

impl TraceId {
    pub fn new(high: u64, low: u64) -> Self {
        Self { high, low }
    }
}

impl FromStr for TraceId {
    type Err = TraceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_padded::<16>(s)?;
        let mut high = [0u8; 8];
        let mut low = [0u8; 8];
        high.copy_from_slice(&bytes[..8]);
        low.copy_from_slice(&bytes[8..]);
        Ok(Self {
            high: u64::from_be_bytes(high),
            low: u64::from_be_bytes(low),
        })
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.high == 0 {
            write!(f, "{:016x}", self.low)
        } else {
            write!(f, "{:016x}{:016x}", self.high, self.low)
        }
    }
}

/// 64-bit span identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpanId(pub u64);

impl FromStr for SpanId {
    type Err = TraceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_padded::<8>(s)?;
        Ok(Self(u64::from_be_bytes(bytes)))
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

// Both ids travel as hex strings in JSON.
macro_rules! hex_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

hex_serde!(TraceId);
hex_serde!(SpanId);

/// Left-pad `s` with zeros to `N` bytes worth of hex and decode it.
fn decode_padded<const N: usize>(s: &str) -> Result<[u8; N], TraceIdError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(TraceIdError::Empty);
    }
    if s.len() > N * 2 {
        return Err(TraceIdError::TooLong(s.to_string()));
    }

    let padded = format!("{:0>width$}", s, width = N * 2);
    let mut out = [0u8; N];
    hex::decode_to_slice(&padded, &mut out).map_err(|_| TraceIdError::InvalidHex(s.to_string()))?;
    Ok(out)
}
