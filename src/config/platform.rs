use std::fmt;

/// Build-time discriminant selecting which capability branch is active.
///
/// libzip's generated configuration knows exactly two branches: the Apple
/// platform family and all other POSIX-like targets. Windows targets are
/// out of scope for this crate, as they were for the original package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// macOS, iOS and friends (`__APPLE__`).
    Apple,
    /// Every other supported POSIX-like target.
    Posix,
}

impl Platform {
    /// Discriminant for the target this crate was compiled for.
    pub fn current() -> Self {
        if cfg!(target_vendor = "apple") {
            Platform::Apple
        } else {
            Platform::Posix
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Apple => "apple",
            Platform::Posix => "posix",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
