//! Amazon Resource Name parsing.

use std::str::FromStr;

use thiserror::Error;

const ARN_SEGMENTS: usize = 6;

/// Raised when an identifier does not have six colon-separated segments.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("malformed ARN \"{input}\"")]
pub struct ArnParseError {
    /// Identifier that failed to parse.
    pub input: String,
}

/// Components of an Amazon Resource Name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Arn {
    /// Partition, for example `aws`.
    pub partition: String,
    /// Service namespace, for example `cloudformation`.
    pub service: String,
    /// Region; empty for global services.
    pub region: String,
    /// Owning account identifier.
    pub account_id: String,
    /// Everything after the fifth colon, verbatim.
    pub resource: String,
}

impl Arn {
    /// Splits `input` into its six segments. The resource segment keeps any
    /// further `:` or `/` characters.
    ///
    /// # Errors
    ///
    /// Returns [`ArnParseError`] when fewer than six segments are present.
    pub fn parse(input: &str) -> Result<Self, ArnParseError> {
        let malformed = || ArnParseError {
            input: input.to_owned(),
        };
        let mut parts = input.splitn(ARN_SEGMENTS, ':');
        let _prefix = parts.next().ok_or_else(malformed)?;
        let partition = parts.next().ok_or_else(malformed)?;
        let service = parts.next().ok_or_else(malformed)?;
        let region = parts.next().ok_or_else(malformed)?;
        let account_id = parts.next().ok_or_else(malformed)?;
        let resource = parts.next().ok_or_else(malformed)?;

        Ok(Self {
            partition: partition.to_owned(),
            service: service.to_owned(),
            region: region.to_owned(),
            account_id: account_id.to_owned(),
            resource: resource.to_owned(),
        })
    }
}

impl FromStr for Arn {
    type Err = ArnParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}
