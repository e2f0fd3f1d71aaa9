use std::borrow::Cow;

use super::{
    validate_decoded_size, BlockCodecTraits, CodecConfiguration, CodecError, CodecOptions,
    RawBytes, ZstdCodecConfiguration, ZstdCompressionLevel,
};

/// A `zstd` codec implementation.
#[derive(Clone, Debug)]
pub struct ZstdCodec {
    compression: ZstdCompressionLevel,
    checksum: bool,
}

impl ZstdCodec {
    /// Create a new `zstd` codec.
    #[must_use]
    pub const fn new(compression: ZstdCompressionLevel, checksum: bool) -> Self {
        Self {
            compression,
            checksum,
        }
    }

    /// Create a new `zstd` codec from configuration.
    #[must_use]
    pub const fn new_with_configuration(configuration: &ZstdCodecConfiguration) -> Self {
        Self::new(configuration.level, configuration.checksum)
    }
}

impl BlockCodecTraits for ZstdCodec {
    fn configuration(&self) -> CodecConfiguration {
        ZstdCodecConfiguration {
            level: self.compression,
            checksum: self.checksum,
        }
        .into()
    }

    fn encode<'a>(
        &self,
        decoded_value: RawBytes<'a>,
        _options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        let mut compressor = zstd::bulk::Compressor::new(self.compression.as_i32())?;
        compressor.include_checksum(self.checksum)?;
        let result = compressor.compress(&decoded_value)?;
        Ok(Cow::Owned(result))
    }

    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        decoded_size: u64,
        options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        let decoded_value = zstd::decode_all(std::io::Cursor::new(&encoded_value))?;
        validate_decoded_size(&decoded_value, decoded_size, options)?;
        Ok(Cow::Owned(decoded_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_zstd_configuration() {
        let level = ZstdCompressionLevel::try_from(3i32).unwrap();
        let codec = ZstdCodec::new(level, true);
        assert_eq!(
            codec.configuration().to_string(),
            r#"{"name":"zstd","configuration":{"level":3,"checksum":true}}"#
        );
    }

    #[test]
    fn codec_zstd_checksum_detects_corruption() {
        let codec = ZstdCodec::new(ZstdCompressionLevel::try_from(1i32).unwrap(), true);
        let options = CodecOptions::default();
        let bytes: Vec<u8> = (0..255u8).collect();
        let mut encoded = codec
            .encode(Cow::Borrowed(bytes.as_slice()), &options)
            .unwrap()
            .into_owned();
        let last = encoded.len() - 1;
        encoded[last] ^= 0xff;
        assert!(codec
            .decode(Cow::Owned(encoded), bytes.len() as u64, &options)
            .is_err());
    }
}
