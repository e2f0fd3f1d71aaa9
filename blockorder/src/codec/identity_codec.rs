use super::{
    validate_decoded_size, BlockCodecTraits, CodecConfiguration, CodecError, CodecOptions,
    RawBytes,
};

/// An `identity` codec. Blocks are stored as their raw bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityCodec;

impl IdentityCodec {
    /// Create a new `identity` codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl BlockCodecTraits for IdentityCodec {
    fn configuration(&self) -> CodecConfiguration {
        CodecConfiguration::Identity
    }

    fn encode<'a>(
        &self,
        decoded_value: RawBytes<'a>,
        _options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        Ok(decoded_value)
    }

    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        decoded_size: u64,
        options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        validate_decoded_size(&encoded_value, decoded_size, options)?;
        Ok(encoded_value)
    }
}
