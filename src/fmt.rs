//! Logging shim so the engine builds with `log`, `defmt`, both or neither.
//!
//! Call sites use explicit argument lists (`"... {}", x`) so the same
//! invocation expands under every backend.

#![allow(unused_macros)]

macro_rules! trace {
    ($($arg:expr),+) => {{
        #[cfg(feature = "log")]
        ::log::trace!($($arg),+);
        #[cfg(feature = "defmt")]
        ::defmt::trace!($($arg),+);
        #[cfg(not(any(feature = "log", feature = "defmt")))]
        let _ = ($(&$arg),+);
    }};
}

macro_rules! debug {
    ($($arg:expr),+) => {{
        #[cfg(feature = "log")]
        ::log::debug!($($arg),+);
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg),+);
        #[cfg(not(any(feature = "log", feature = "defmt")))]
        let _ = ($(&$arg),+);
    }};
}

macro_rules! warn {
    ($($arg:expr),+) => {{
        #[cfg(feature = "log")]
        ::log::warn!($($arg),+);
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg),+);
        #[cfg(not(any(feature = "log", feature = "defmt")))]
        let _ = ($(&$arg),+);
    }};
}
