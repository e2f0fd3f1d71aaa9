//! Codec options for encoding, decoding and fetching blocks.

/// Codec options for encoding/decoding.
///
/// Options are passed explicitly to every codec and reader call, there is no global configuration.
///
/// The default values are:
/// - `validate_block_size`: `true`
/// - `concurrent_target`: number of threads available to Rayon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    validate_block_size: bool,
    concurrent_target: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            validate_block_size: true,
            concurrent_target: rayon::current_num_threads(),
        }
    }
}

impl CodecOptions {
    /// Return the validate block size setting.
    ///
    /// If enabled, the decoded size of every fetched block is checked against the block shape.
    #[must_use]
    pub fn validate_block_size(&self) -> bool {
        self.validate_block_size
    }

    /// Set whether or not to validate decoded block sizes.
    pub fn set_validate_block_size(&mut self, validate_block_size: bool) -> &mut Self {
        self.validate_block_size = validate_block_size;
        self
    }

    /// Set whether or not to validate decoded block sizes.
    #[must_use]
    pub fn with_validate_block_size(mut self, validate_block_size: bool) -> Self {
        self.validate_block_size = validate_block_size;
        self
    }

    /// Return the concurrent target.
    ///
    /// This is the maximum number of blocks fetched concurrently by a region read.
    /// A value of 0 or 1 fetches blocks serially.
    #[must_use]
    pub fn concurrent_target(&self) -> usize {
        self.concurrent_target
    }

    /// Set the concurrent target.
    pub fn set_concurrent_target(&mut self, concurrent_target: usize) -> &mut Self {
        self.concurrent_target = concurrent_target;
        self
    }

    /// Set the concurrent target.
    #[must_use]
    pub fn with_concurrent_target(mut self, concurrent_target: usize) -> Self {
        self.concurrent_target = concurrent_target;
        self
    }
}
