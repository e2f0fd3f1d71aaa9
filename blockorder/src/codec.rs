//! Block codecs.
//!
//! A block codec compresses the raw bytes of one complete block into an independently decodable chunk.
//! The codec API is defined in the [`blockorder_codec`] crate and re-exported here.
//!
//! | Codec | Configuration | Feature |
//! |---|---|---|
//! | [`IdentityCodec`] | `{"name": "identity"}` | |
//! | [`GzipCodec`] | `{"name": "gzip", "configuration": {"level": 5}}` | `gzip` |
//! | [`ZstdCodec`] | `{"name": "zstd", "configuration": {"level": 5, "checksum": false}}` | `zstd` |

mod identity_codec;
pub use identity_codec::IdentityCodec;

#[cfg(feature = "gzip")]
mod gzip_codec;
#[cfg(feature = "gzip")]
pub use gzip_codec::GzipCodec;

#[cfg(feature = "zstd")]
mod zstd_codec;
#[cfg(feature = "zstd")]
pub use zstd_codec::ZstdCodec;

use std::sync::Arc;

pub use blockorder_codec::*;

/// Create a codec from its configuration.
///
/// # Errors
/// Returns [`CodecError::InvalidConfiguration`] if the codec is not enabled.
pub fn codec_from_configuration(
    configuration: &CodecConfiguration,
) -> Result<Arc<dyn BlockCodecTraits>, CodecError> {
    match configuration {
        CodecConfiguration::Identity => Ok(Arc::new(IdentityCodec::new())),
        #[cfg(feature = "gzip")]
        CodecConfiguration::Gzip(configuration) => {
            Ok(Arc::new(GzipCodec::new_with_configuration(configuration)))
        }
        #[cfg(feature = "zstd")]
        CodecConfiguration::Zstd(configuration) => {
            Ok(Arc::new(ZstdCodec::new_with_configuration(configuration)))
        }
        #[allow(unreachable_patterns)]
        _ => Err(CodecError::InvalidConfiguration(format!(
            "the {} codec is not enabled",
            configuration.name()
        ))),
    }
}

/// Check the size of a decoded block if enabled in `options`.
pub(crate) fn validate_decoded_size(
    decoded_value: &[u8],
    decoded_size: u64,
    options: &CodecOptions,
) -> Result<(), CodecError> {
    let size = decoded_value.len() as u64;
    if options.validate_block_size() && size != decoded_size {
        Err(UnexpectedBlockDecodedSizeError::new(size, decoded_size).into())
    } else {
        Ok(())
    }
}
