//! AXI4-Lite signal records exchanged once per clock cycle.
//!
//! One [`M2s`] record drives the slave for one cycle and one [`S2m`] record
//! captures what the slave drove back. Fields the master does not care about
//! (`arprot`, `awprot`, `wstrb`) are `None` rather than a concrete bit
//! pattern, so an idle record never claims a protection or strobe value.

use std::fmt;

/// Width of the AXI4-Lite data bus in bits.
pub const DATA_WIDTH_BITS: u32 = 32;

/// Width of the write-strobe field in bits (one per data byte).
pub const STROBE_WIDTH_BITS: u32 = DATA_WIDTH_BITS / 8;

/// Width of the `arprot`/`awprot` protection fields in bits.
pub const PROT_WIDTH_BITS: u32 = 3;

/// Highest addressable word index; addresses use 31 bits.
pub const MAX_ADDRESS: u32 = (1 << 31) - 1;

/// Two-bit status accompanying every write and read response.
///
/// Serialises as the protocol name; deserialises from the name or from the
/// 2-bit wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
#[repr(u8)]
pub enum ResponseCode {
    /// Normal access success.
    #[default]
    Okay = 0,
    /// Exclusive access success.
    ExOkay = 1,
    /// Slave reached but reported an error.
    SlvErr = 2,
    /// No slave decoded the address.
    DecErr = 3,
}

impl ResponseCode {
    /// Converts a code to its 2-bit wire value.
    #[must_use]
    pub const fn as_bits(self) -> u8 {
        self as u8
    }

    /// Converts a 2-bit wire value back into a response code.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Okay),
            1 => Some(Self::ExOkay),
            2 => Some(Self::SlvErr),
            3 => Some(Self::DecErr),
            _ => None,
        }
    }

    /// Only `OKAY` counts as success; `EXOKAY` is not expected on AXI4-Lite.
    #[must_use]
    pub const fn is_okay(self) -> bool {
        matches!(self, Self::Okay)
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Okay => "OKAY",
            Self::ExOkay => "EXOKAY",
            Self::SlvErr => "SLVERR",
            Self::DecErr => "DECERR",
        };
        f.write_str(name)
    }
}

/// Master-to-slave signals for one clock cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[allow(clippy::struct_excessive_bools)]
pub struct M2s {
    /// Read address.
    pub araddr: u32,
    /// Read protection bits; `None` when unspecified.
    pub arprot: Option<u8>,
    /// Read address valid.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "wire::flag"))]
    pub arvalid: bool,
    /// Write address.
    pub awaddr: u32,
    /// Write protection bits; `None` when unspecified.
    pub awprot: Option<u8>,
    /// Write address valid.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "wire::flag"))]
    pub awvalid: bool,
    /// Master ready to accept a write response.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "wire::flag"))]
    pub bready: bool,
    /// Master ready to accept read data.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "wire::flag"))]
    pub rready: bool,
    /// Write data.
    pub wdata: u32,
    /// Write strobes; `None` when unspecified.
    pub wstrb: Option<u8>,
    /// Write data valid.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "wire::flag"))]
    pub wvalid: bool,
}

impl M2s {
    /// Idle cycle: no handshake asserted, addresses and data zeroed.
    pub const IDLE: Self = Self {
        araddr: 0,
        arprot: None,
        arvalid: false,
        awaddr: 0,
        awprot: None,
        awvalid: false,
        bready: false,
        rready: false,
        wdata: 0,
        wstrb: None,
        wvalid: false,
    };

    /// Builds the record for one read beat at `address`.
    #[must_use]
    pub const fn read_beat(address: u32) -> Self {
        Self {
            araddr: address,
            arvalid: true,
            ..Self::IDLE
        }
    }

    /// Builds the record for one write beat carrying `data` to `address`.
    #[must_use]
    pub const fn write_beat(address: u32, data: u32) -> Self {
        Self {
            awaddr: address,
            awvalid: true,
            wvalid: true,
            wdata: data,
            ..Self::IDLE
        }
    }

    /// Returns `true` when neither a read nor a write is being requested.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        !(self.arvalid || self.awvalid || self.wvalid)
    }
}

impl Default for M2s {
    fn default() -> Self {
        Self::IDLE
    }
}

/// Slave-to-master signals for one clock cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[allow(clippy::struct_excessive_bools)]
pub struct S2m {
    /// Slave ready to accept a read address.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "wire::flag"))]
    pub arready: bool,
    /// Slave ready to accept a write address.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "wire::flag"))]
    pub awready: bool,
    /// Write response status.
    pub bresp: ResponseCode,
    /// Write response valid.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "wire::flag"))]
    pub bvalid: bool,
    /// Read data.
    pub rdata: u32,
    /// Read response status.
    pub rresp: ResponseCode,
    /// Read data valid.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "wire::flag"))]
    pub rvalid: bool,
    /// Slave ready to accept write data.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "wire::flag"))]
    pub wready: bool,
}

impl S2m {
    /// Idle response: ready for everything, nothing valid, `OKAY` status.
    pub const IDLE: Self = Self {
        arready: true,
        awready: true,
        bresp: ResponseCode::Okay,
        bvalid: false,
        rdata: 0,
        rresp: ResponseCode::Okay,
        rvalid: false,
        wready: true,
    };

    /// Builds a cycle carrying a write response.
    #[must_use]
    pub const fn write_response(code: ResponseCode) -> Self {
        Self {
            bresp: code,
            bvalid: true,
            ..Self::IDLE
        }
    }

    /// Builds a cycle carrying a read response.
    #[must_use]
    pub const fn read_response(code: ResponseCode, data: u32) -> Self {
        Self {
            rresp: code,
            rvalid: true,
            rdata: data,
            ..Self::IDLE
        }
    }
}

impl Default for S2m {
    fn default() -> Self {
        Self::IDLE
    }
}

/// Lenient decoding for recorded traces, which often carry raw bit values.
#[cfg(feature = "serde")]
mod wire {
    use std::fmt;

    use serde::de::{Deserialize, Deserializer, Error, Unexpected, Visitor};

    use super::ResponseCode;

    /// Accepts `true`/`false` or the bits `0`/`1`.
    pub(super) fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        deserializer.deserialize_any(FlagVisitor)
    }

    struct FlagVisitor;

    impl Visitor<'_> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a boolean or the bit 0 or 1")
        }

        fn visit_bool<E: Error>(self, value: bool) -> Result<bool, E> {
            Ok(value)
        }

        fn visit_u64<E: Error>(self, value: u64) -> Result<bool, E> {
            match value {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(Unexpected::Unsigned(value), &self)),
            }
        }

        fn visit_i64<E: Error>(self, value: i64) -> Result<bool, E> {
            match u64::try_from(value) {
                Ok(bits) => self.visit_u64(bits),
                Err(_) => Err(E::invalid_value(Unexpected::Signed(value), &self)),
            }
        }
    }

    struct CodeVisitor;

    impl Visitor<'_> for CodeVisitor {
        type Value = ResponseCode;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("OKAY, EXOKAY, SLVERR, DECERR or a 2-bit value")
        }

        fn visit_str<E: Error>(self, name: &str) -> Result<ResponseCode, E> {
            [
                ResponseCode::Okay,
                ResponseCode::ExOkay,
                ResponseCode::SlvErr,
                ResponseCode::DecErr,
            ]
            .into_iter()
            .find(|code| code.to_string().eq_ignore_ascii_case(name))
            .ok_or_else(|| E::invalid_value(Unexpected::Str(name), &self))
        }

        fn visit_u64<E: Error>(self, value: u64) -> Result<ResponseCode, E> {
            u8::try_from(value)
                .ok()
                .and_then(ResponseCode::from_bits)
                .ok_or_else(|| E::invalid_value(Unexpected::Unsigned(value), &self))
        }

        fn visit_i64<E: Error>(self, value: i64) -> Result<ResponseCode, E> {
            match u64::try_from(value) {
                Ok(bits) => self.visit_u64(bits),
                Err(_) => Err(E::invalid_value(Unexpected::Signed(value), &self)),
            }
        }
    }

    impl<'de> Deserialize<'de> for ResponseCode {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_any(CodeVisitor)
        }
    }

    #[cfg(test)]
    mod tests {
        use serde::de::value::Error;
        use serde::de::{Deserialize, IntoDeserializer};

        use super::flag;
        use crate::ResponseCode;

        fn code_from_bits(bits: u64) -> Result<ResponseCode, Error> {
            ResponseCode::deserialize(IntoDeserializer::<'_, Error>::into_deserializer(bits))
        }

        fn code_from_name(name: &str) -> Result<ResponseCode, Error> {
            ResponseCode::deserialize(IntoDeserializer::<'_, Error>::into_deserializer(name))
        }

        #[test]
        fn response_codes_accept_names_and_wire_values() {
            assert_eq!(code_from_name("DECERR"), Ok(ResponseCode::DecErr));
            assert_eq!(code_from_name("slverr"), Ok(ResponseCode::SlvErr));
            assert_eq!(code_from_bits(1), Ok(ResponseCode::ExOkay));
            assert_eq!(code_from_bits(3), Ok(ResponseCode::DecErr));
            assert!(code_from_bits(4).is_err());
            assert!(code_from_name("BUSY").is_err());
        }

        #[test]
        fn flags_accept_booleans_and_single_bits() {
            assert_eq!(flag(IntoDeserializer::<'_, Error>::into_deserializer(true)), Ok(true));
            assert_eq!(flag(IntoDeserializer::<'_, Error>::into_deserializer(1_u64)), Ok(true));
            assert_eq!(flag(IntoDeserializer::<'_, Error>::into_deserializer(0_i64)), Ok(false));
            assert!(flag(IntoDeserializer::<'_, Error>::into_deserializer(2_u64)).is_err());
        }
    }
}
