//! IPv4 CIDR arithmetic for deriving subnet addresses.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use thiserror::Error;

/// Offset of the subnet gateway from the network address.
pub const GATEWAY_OFFSET: u32 = 1;
/// Offset of the subnet DNS resolver from the network address.
pub const DNS_OFFSET: u32 = 2;
/// Offset of the director's static address from the network address.
pub const DIRECTOR_OFFSET: u32 = 6;

const IPV4_BITS: u8 = 32;

/// Errors raised by CIDR parsing and offset arithmetic.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CidrError {
    /// Raised when the text is not `a.b.c.d/prefix`.
    #[error("invalid CIDR block {input:?}: {reason}")]
    Invalid {
        /// Text that failed to parse.
        input: String,
        /// Why it was rejected.
        reason: String,
    },
    /// Raised when an offset falls outside the block.
    #[error("offset {offset} is outside {cidr}")]
    OffsetOutOfRange {
        /// Block the offset was applied to.
        cidr: String,
        /// Offset requested.
        offset: u32,
    },
}

/// An IPv4 network block normalised to its network address.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Cidr {
    /// Parses `a.b.c.d/prefix`, masking away any host bits.
    ///
    /// # Errors
    ///
    /// Returns [`CidrError::Invalid`] for malformed addresses or prefixes
    /// longer than 32 bits.
    pub fn parse(input: &str) -> Result<Self, CidrError> {
        let invalid = |reason: &str| CidrError::Invalid {
            input: input.to_owned(),
            reason: reason.to_owned(),
        };
        let (address_text, prefix_text) = input
            .trim()
            .split_once('/')
            .ok_or_else(|| invalid("missing prefix length"))?;
        let address: Ipv4Addr = address_text
            .parse()
            .map_err(|_| invalid("address is not IPv4"))?;
        let prefix: u8 = prefix_text
            .parse()
            .map_err(|_| invalid("prefix length is not a number"))?;
        if prefix > IPV4_BITS {
            return Err(invalid("prefix length exceeds 32"));
        }

        let network = Ipv4Addr::from(u32::from(address) & Self::mask(prefix));
        Ok(Self { network, prefix })
    }

    fn mask(prefix: u8) -> u32 {
        u32::MAX
            .checked_shl(u32::from(IPV4_BITS - prefix))
            .unwrap_or(0)
    }

    /// Network address of the block.
    #[must_use]
    pub const fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// Prefix length of the block.
    #[must_use]
    pub const fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Number of addresses in the block.
    #[must_use]
    pub fn size(&self) -> u64 {
        1_u64 << (IPV4_BITS - self.prefix)
    }

    /// Returns the address `offset` places after the network address.
    ///
    /// # Errors
    ///
    /// Returns [`CidrError::OffsetOutOfRange`] when the result would leave
    /// the block.
    pub fn nth(&self, offset: u32) -> Result<Ipv4Addr, CidrError> {
        if u64::from(offset) >= self.size() {
            return Err(CidrError::OffsetOutOfRange {
                cidr: self.to_string(),
                offset,
            });
        }
        u32::from(self.network)
            .checked_add(offset)
            .map(Ipv4Addr::from)
            .ok_or_else(|| CidrError::OffsetOutOfRange {
                cidr: self.to_string(),
                offset,
            })
    }
}

impl FromStr for Ipv4Cidr {
    type Err = CidrError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

/// Addresses derived from a subnet block for a manual network.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubnetAddressing {
    /// Normalised block, for example `10.0.0.0/24`.
    pub range: String,
    /// Gateway address (network + 1).
    pub gateway: Ipv4Addr,
    /// DNS resolver address (network + 2).
    pub dns: Ipv4Addr,
    /// Director static address (network + 6).
    pub director_ip: Ipv4Addr,
}

impl SubnetAddressing {
    /// Derives the gateway, DNS, and director addresses from `cidr`.
    ///
    /// # Errors
    ///
    /// Returns [`CidrError`] when the block is malformed or too small to
    /// hold the director address.
    pub fn from_cidr(cidr: &str) -> Result<Self, CidrError> {
        let block = Ipv4Cidr::parse(cidr)?;
        Ok(Self {
            range: block.to_string(),
            gateway: block.nth(GATEWAY_OFFSET)?,
            dns: block.nth(DNS_OFFSET)?,
            director_ip: block.nth(DIRECTOR_OFFSET)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("10.2.1.0/24", "10.2.1.1", "10.2.1.2", "10.2.1.6")]
    #[case("10.0.0.128/25", "10.0.0.129", "10.0.0.130", "10.0.0.134")]
    #[case("10.0.16.0/20", "10.0.16.1", "10.0.16.2", "10.0.16.6")]
    #[case("172.31.255.248/29", "172.31.255.249", "172.31.255.250", "172.31.255.254")]
    fn derives_offsets(
        #[case] cidr: &str,
        #[case] gateway: &str,
        #[case] dns: &str,
        #[case] director: &str,
    ) {
        let addressing =
            SubnetAddressing::from_cidr(cidr).unwrap_or_else(|err| panic!("{cidr}: {err}"));
        assert_eq!(addressing.gateway.to_string(), gateway);
        assert_eq!(addressing.dns.to_string(), dns);
        assert_eq!(addressing.director_ip.to_string(), director);
        assert_eq!(addressing.range, cidr);
    }

    #[test]
    fn masks_host_bits() {
        let block = Ipv4Cidr::parse("10.0.0.200/25").unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(block.to_string(), "10.0.0.128/25");
        assert_eq!(
            block.nth(DIRECTOR_OFFSET).unwrap_or_else(|err| panic!("{err}")),
            Ipv4Addr::new(10, 0, 0, 134)
        );
    }

    #[test]
    fn rejects_blocks_too_small_for_director() {
        let err = SubnetAddressing::from_cidr("10.0.0.0/30").err();
        assert_eq!(
            err,
            Some(CidrError::OffsetOutOfRange {
                cidr: String::from("10.0.0.0/30"),
                offset: DIRECTOR_OFFSET,
            })
        );
    }

    #[test]
    fn handles_full_and_host_prefixes() {
        let everything = Ipv4Cidr::parse("0.0.0.0/0").unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(everything.size(), 1_u64 << 32);
        let host = Ipv4Cidr::parse("192.0.2.7/32").unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(host.nth(0).ok(), Some(Ipv4Addr::new(192, 0, 2, 7)));
        assert!(host.nth(1).is_err());
    }

    #[rstest]
    #[case("10.0.0.0")]
    #[case("10.0.0/24")]
    #[case("10.0.0.0/33")]
    #[case("10.0.0.0/abc")]
    #[case("fe80::/64")]
    fn rejects_malformed_blocks(#[case] input: &str) {
        assert!(matches!(
            Ipv4Cidr::parse(input),
            Err(CidrError::Invalid { .. })
        ));
    }
}
