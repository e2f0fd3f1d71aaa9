//! Codec configuration metadata.
//!
//! A [`CodecConfiguration`] is serialised with the codec `name` and its `configuration`:
//! ```rust
//! # let JSON = r#"
//! {
//!     "name": "zstd",
//!     "configuration": {
//!         "level": 5,
//!         "checksum": false
//!     }
//! }
//! # "#;
//! # use blockorder_codec::CodecConfiguration;
//! # serde_json::from_str::<CodecConfiguration>(JSON).unwrap();
//! ```

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The configuration of a block codec.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug)]
#[serde(tag = "name", content = "configuration", rename_all = "lowercase")]
pub enum CodecConfiguration {
    /// Blocks are stored uncompressed.
    Identity,
    /// Blocks are compressed with gzip.
    Gzip(GzipCodecConfiguration),
    /// Blocks are compressed with zstd.
    Zstd(ZstdCodecConfiguration),
}

impl CodecConfiguration {
    /// The codec name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Gzip(_) => "gzip",
            Self::Zstd(_) => "zstd",
        }
    }
}

impl std::fmt::Display for CodecConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", serde_json::to_string(self).unwrap_or_default())
    }
}

impl From<GzipCodecConfiguration> for CodecConfiguration {
    fn from(configuration: GzipCodecConfiguration) -> Self {
        Self::Gzip(configuration)
    }
}

impl From<ZstdCodecConfiguration> for CodecConfiguration {
    fn from(configuration: ZstdCodecConfiguration) -> Self {
        Self::Zstd(configuration)
    }
}

/// Configuration parameters for the `gzip` codec.
#[derive(Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
pub struct GzipCodecConfiguration {
    /// The compression level.
    pub level: GzipCompressionLevel,
}

/// A `gzip` compression level. An integer from 0 to 9.
#[derive(Serialize, Clone, Copy, Eq, PartialEq, Debug, Display)]
pub struct GzipCompressionLevel(u32);

/// An invalid `gzip` compression level.
#[derive(Copy, Clone, Debug, Error)]
#[error("invalid gzip compression level {0}, must be 0-9")]
pub struct GzipCompressionLevelError(u32);

impl TryFrom<u32> for GzipCompressionLevel {
    type Error = GzipCompressionLevelError;

    fn try_from(level: u32) -> Result<Self, Self::Error> {
        if level < 10 {
            Ok(Self(level))
        } else {
            Err(GzipCompressionLevelError(level))
        }
    }
}

impl<'de> Deserialize<'de> for GzipCompressionLevel {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let number = serde_json::Number::deserialize(d)?;
        number
            .as_u64()
            .and_then(|level| u32::try_from(level).ok())
            .and_then(|level| Self::try_from(level).ok())
            .ok_or_else(|| {
                serde::de::Error::custom("gzip compression level must be an integer between 0 and 9")
            })
    }
}

impl GzipCompressionLevel {
    /// Return the compression level as a [`u32`].
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Configuration parameters for the `zstd` codec.
#[derive(Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
pub struct ZstdCodecConfiguration {
    /// The compression level.
    pub level: ZstdCompressionLevel,
    /// Whether to store a checksum when writing that will be verified when reading.
    pub checksum: bool,
}

/// A `zstd` compression level. An integer from -131072 to 22.
///
/// A value of 0 indicates to use the default compression level.
/// Otherwise, a higher level is expected to achieve a higher compression ratio at the cost of lower speed.
#[derive(Serialize, Clone, Copy, Eq, PartialEq, Debug, Display)]
pub struct ZstdCompressionLevel(i32);

/// An invalid `zstd` compression level.
#[derive(Copy, Clone, Debug, Error)]
#[error("invalid zstd compression level {0}, must be -131072 to 22")]
pub struct ZstdCompressionLevelError(i32);

impl TryFrom<i32> for ZstdCompressionLevel {
    type Error = ZstdCompressionLevelError;

    fn try_from(level: i32) -> Result<Self, Self::Error> {
        if (-131_072..=22).contains(&level) {
            Ok(Self(level))
        } else {
            Err(ZstdCompressionLevelError(level))
        }
    }
}

impl<'de> Deserialize<'de> for ZstdCompressionLevel {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let number = serde_json::Number::deserialize(d)?;
        number
            .as_i64()
            .and_then(|level| i32::try_from(level).ok())
            .and_then(|level| Self::try_from(level).ok())
            .ok_or_else(|| {
                serde::de::Error::custom(
                    "zstd compression level must be an integer between -131072 and 22",
                )
            })
    }
}

impl ZstdCompressionLevel {
    /// Return the compression level as an [`i32`].
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_configuration_identity() {
        let configuration: CodecConfiguration =
            serde_json::from_str(r#"{"name": "identity"}"#).unwrap();
        assert_eq!(configuration, CodecConfiguration::Identity);
        assert_eq!(configuration.name(), "identity");
        assert_eq!(configuration.to_string(), r#"{"name":"identity"}"#);
    }

    #[test]
    fn codec_configuration_gzip() {
        const JSON_VALID: &str = r#"{
            "name": "gzip",
            "configuration": {
                "level": 1
            }
        }"#;
        let configuration: CodecConfiguration = serde_json::from_str(JSON_VALID).unwrap();
        assert_eq!(
            configuration,
            CodecConfiguration::Gzip(GzipCodecConfiguration {
                level: GzipCompressionLevel::try_from(1u32).unwrap()
            })
        );
        assert_eq!(
            configuration.to_string(),
            r#"{"name":"gzip","configuration":{"level":1}}"#
        );
    }

    #[test]
    fn codec_configuration_gzip_invalid() {
        const JSON_INVALID1: &str = r#"{"name": "gzip", "configuration": {"level": -1}}"#;
        const JSON_INVALID2: &str = r#"{"name": "gzip", "configuration": {"level": 10}}"#;
        const JSON_INVALID3: &str = r#"{"name": "gzip", "configuration": {"level": 1, "x": 0}}"#;
        assert!(serde_json::from_str::<CodecConfiguration>(JSON_INVALID1).is_err());
        assert!(serde_json::from_str::<CodecConfiguration>(JSON_INVALID2).is_err());
        assert!(serde_json::from_str::<CodecConfiguration>(JSON_INVALID3).is_err());
        assert!(GzipCompressionLevel::try_from(10u32).is_err());
    }

    #[test]
    fn codec_configuration_zstd() {
        const JSON_VALID: &str = r#"{
            "name": "zstd",
            "configuration": {
                "level": -3,
                "checksum": true
            }
        }"#;
        let configuration: CodecConfiguration = serde_json::from_str(JSON_VALID).unwrap();
        let CodecConfiguration::Zstd(zstd) = configuration else {
            panic!("expected a zstd configuration");
        };
        assert_eq!(zstd.level.as_i32(), -3);
        assert!(zstd.checksum);
        assert!(serde_json::from_str::<CodecConfiguration>(
            r#"{"name": "zstd", "configuration": {"level": 23, "checksum": false}}"#
        )
        .is_err());
        assert!(ZstdCompressionLevel::try_from(-131_073i32).is_err());
    }

    #[test]
    fn codec_configuration_unknown() {
        assert!(serde_json::from_str::<CodecConfiguration>(r#"{"name": "blosc"}"#).is_err());
    }
}
