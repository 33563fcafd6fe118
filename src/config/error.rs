use thiserror::Error;

/// Fatal build-configuration failure.
///
/// The only way capability resolution can fail: the platform reports no
/// native signed-size type and none of the candidate integer kinds has the
/// width recorded for `size_t`. Configuration must halt rather than proceed
/// with an unsound substitute type.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no suitable type for ssize_t found (size_t width is {width} bytes)")]
    NoSignedSizeType { width: u8 },
}
