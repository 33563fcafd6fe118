use std::fmt::Write as _;

use super::error::ConfigError;
use super::platform::Platform;

/// Product name reported by the configuration, verbatim from upstream.
pub const PACKAGE: &str = "libzip";

/// Upstream version the capability vocabulary was generated from.
pub const VERSION: &str = "1.6.1a";

/// What a single capability entry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    /// Presence flag: defined or undefined, no value attached.
    Present,
    /// Sized constant: byte width of a primitive type.
    Size(u8),
}

/// Candidate underlying kinds for a synthesized signed-size type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedSizeRepr {
    Int,
    Long,
    LongLong,
}

impl SignedSizeRepr {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignedSizeRepr::Int => "int",
            SignedSizeRepr::Long => "long",
            SignedSizeRepr::LongLong => "long long",
        }
    }
}

// Presence flags before the sized-constant block, Apple branch.
const APPLE_LEADING_FLAGS: &[&str] = &[
    "HAVE_ARC4RANDOM",
    "HAVE_CLONEFILE",
    "HAVE_COMMONCRYPTO",
    "HAVE_CRYPTO",
    "HAVE_FILENO",
    "HAVE_FSEEKO",
    "HAVE_FTELLO",
    "HAVE_GETPROGNAME",
    "HAVE_LIBBZ2",
    "HAVE_LOCALTIME_R",
    "HAVE_NULLABLE",
    "HAVE_OPEN",
    "HAVE_SETMODE",
    "HAVE_SNPRINTF",
    "HAVE_SSIZE_T_LIBZIP",
    "HAVE_STRCASECMP",
    "HAVE_STRDUP",
    "HAVE_STRTOLL",
    "HAVE_STRTOULL",
    "HAVE_STDBOOL_H",
    "HAVE_STRINGS_H",
    "HAVE_UNISTD_H",
];

// Presence flags before the sized-constant block, non-Apple branch. This is
// an independent list, not the Apple list with edits: the branches may
// legitimately diverge (OpenSSL vs CommonCrypto, ficlonerange vs clonefile).
const POSIX_LEADING_FLAGS: &[&str] = &[
    "HAVE_CRYPTO",
    "HAVE_FICLONERANGE",
    "HAVE_FILENO",
    "HAVE_FSEEKO",
    "HAVE_FTELLO",
    "HAVE_LOCALTIME_R",
    "HAVE_NULLABLE",
    "HAVE_OPEN",
    "HAVE_OPENSSL",
    "HAVE_SNPRINTF",
    "HAVE_SSIZE_T_LIBZIP",
    "HAVE_STRCASECMP",
    "HAVE_STRDUP",
    "HAVE_STRTOLL",
    "HAVE_STRTOULL",
    "HAVE_STDBOOL_H",
    "HAVE_STRINGS_H",
    "HAVE_UNISTD_H",
];

// Primitive type widths in bytes. Identical in both branches today, but
// recorded per branch all the same.
const SIZED_CONSTANTS: &[(&str, u8)] = &[
    ("INT8_T_LIBZIP", 1),
    ("UINT8_T_LIBZIP", 1),
    ("INT16_T_LIBZIP", 2),
    ("UINT16_T_LIBZIP", 2),
    ("INT32_T_LIBZIP", 4),
    ("UINT32_T_LIBZIP", 4),
    ("INT64_T_LIBZIP", 8),
    ("UINT64_T_LIBZIP", 8),
    ("SHORT_LIBZIP", 2),
    ("INT_LIBZIP", 4),
    ("LONG_LIBZIP", 8),
    ("LONG_LONG_LIBZIP", 8),
    ("SIZEOF_OFF_T", 8),
    ("SIZE_T_LIBZIP", 8),
    ("SSIZE_T_LIBZIP", 8),
];

// Presence flags after the sized-constant block, shared tail of both
// branches in the generated header.
const TRAILING_FLAGS: &[&str] = &["HAVE_FTS_H", "HAVE_SHARED"];

/// Immutable capability table for one platform branch.
///
/// Resolved once from a [`Platform`] discriminant and fixed from then on.
/// Entries keep the order of the generated header so that rendering the
/// same branch twice is byte-identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySet {
    platform: Platform,
    entries: Vec<(&'static str, CapabilityKind)>,
}

impl CapabilitySet {
    /// Resolve the capability table for one platform branch.
    ///
    /// Pure and total over the two discriminants: every capability name
    /// relevant to the chosen branch is always defined, and resolving the
    /// same branch twice yields equal sets.
    pub fn resolve(platform: Platform) -> Self {
        let leading = match platform {
            Platform::Apple => APPLE_LEADING_FLAGS,
            Platform::Posix => POSIX_LEADING_FLAGS,
        };

        let mut entries =
            Vec::with_capacity(leading.len() + SIZED_CONSTANTS.len() + TRAILING_FLAGS.len());
        for name in leading {
            entries.push((*name, CapabilityKind::Present));
        }
        for (name, width) in SIZED_CONSTANTS {
            entries.push((*name, CapabilityKind::Size(*width)));
        }
        for name in TRAILING_FLAGS {
            entries.push((*name, CapabilityKind::Present));
        }

        Self { platform, entries }
    }

    /// The branch this set was resolved for.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Whether the named capability is defined in this branch.
    pub fn has(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| *n == name)
    }

    /// Byte width recorded for a sized constant, if the name is defined
    /// and carries a value.
    pub fn size_of(&self, name: &str) -> Option<u8> {
        self.entries.iter().find_map(|(n, kind)| match kind {
            CapabilityKind::Size(width) if *n == name => Some(*width),
            _ => None,
        })
    }

    /// All entries in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, CapabilityKind)> + '_ {
        self.entries.iter().copied()
    }

    /// The signed-size type to use, if one has to be synthesized.
    ///
    /// Returns `None` when the platform provides a native `ssize_t`
    /// (`HAVE_SSIZE_T_LIBZIP` is defined). Otherwise derives a substitute
    /// from the recorded `size_t` width via [`signed_size_fallback`].
    ///
    /// [`signed_size_fallback`]: CapabilitySet::signed_size_fallback
    pub fn signed_size_type(&self) -> Result<Option<SignedSizeRepr>, ConfigError> {
        if self.has("HAVE_SSIZE_T_LIBZIP") {
            return Ok(None);
        }
        let width = self.size_of("SIZE_T_LIBZIP").unwrap_or(0);
        self.signed_size_fallback(width).map(Some)
    }

    /// Pick a substitute signed-size representation for the given width.
    ///
    /// Matches against the recorded `int`, `long` and `long long` widths in
    /// that order, mirroring the `#elif` chain of the generated header. A
    /// marker matching none of the three candidates halts configuration.
    pub fn signed_size_fallback(&self, size_marker: u8) -> Result<SignedSizeRepr, ConfigError> {
        if self.size_of("INT_LIBZIP") == Some(size_marker) {
            Ok(SignedSizeRepr::Int)
        } else if self.size_of("LONG_LIBZIP") == Some(size_marker) {
            Ok(SignedSizeRepr::Long)
        } else if self.size_of("LONG_LONG_LIBZIP") == Some(size_marker) {
            Ok(SignedSizeRepr::LongLong)
        } else {
            Err(ConfigError::NoSignedSizeType { width: size_marker })
        }
    }

    /// Render the set in the shape of the generated header.
    ///
    /// Presence flags render bare, sized constants with their value, and
    /// the package/version literals close the block unconditionally. The
    /// output is a deterministic function of the platform branch.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, kind) in &self.entries {
            match kind {
                CapabilityKind::Present => {
                    let _ = writeln!(out, "#define {name}");
                }
                CapabilityKind::Size(width) => {
                    let _ = writeln!(out, "#define {name} {width}");
                }
            }
        }
        let _ = writeln!(out, "#define PACKAGE \"{PACKAGE}\"");
        let _ = writeln!(out, "#define VERSION \"{VERSION}\"");
        out
    }
}
