use std::borrow::Cow;
use std::io::{Cursor, Read};

use flate2::bufread::{GzDecoder, GzEncoder};

use super::{
    validate_decoded_size, BlockCodecTraits, CodecConfiguration, CodecError, CodecOptions,
    GzipCodecConfiguration, GzipCompressionLevel, GzipCompressionLevelError, RawBytes,
};

/// A `gzip` codec implementation.
#[derive(Clone, Debug)]
pub struct GzipCodec {
    compression_level: GzipCompressionLevel,
}

impl GzipCodec {
    /// Create a new `gzip` codec.
    ///
    /// # Errors
    /// Returns [`GzipCompressionLevelError`] if `compression_level` is not valid.
    pub fn new(compression_level: u32) -> Result<Self, GzipCompressionLevelError> {
        let compression_level: GzipCompressionLevel = compression_level.try_into()?;
        Ok(Self { compression_level })
    }

    /// Create a new `gzip` codec from configuration.
    #[must_use]
    pub const fn new_with_configuration(configuration: &GzipCodecConfiguration) -> Self {
        Self {
            compression_level: configuration.level,
        }
    }
}

impl BlockCodecTraits for GzipCodec {
    fn configuration(&self) -> CodecConfiguration {
        GzipCodecConfiguration {
            level: self.compression_level,
        }
        .into()
    }

    fn encode<'a>(
        &self,
        decoded_value: RawBytes<'a>,
        _options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        let mut encoder = GzEncoder::new(
            Cursor::new(decoded_value),
            flate2::Compression::new(self.compression_level.as_u32()),
        );
        let mut out: Vec<u8> = Vec::new();
        encoder.read_to_end(&mut out)?;
        Ok(Cow::Owned(out))
    }

    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        decoded_size: u64,
        options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        let mut decoder = GzDecoder::new(Cursor::new(encoded_value));
        let mut out: Vec<u8> = Vec::with_capacity(usize::try_from(decoded_size).unwrap_or(0));
        decoder.read_to_end(&mut out)?;
        validate_decoded_size(&out, decoded_size, options)?;
        Ok(Cow::Owned(out))
    }
}
