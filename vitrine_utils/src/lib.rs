#[doc(hidden)]
pub use log as __log;

/// Panics in debug builds and logs an error in release builds.
///
/// Meant for invariants that a well-formed scene document can never break, but that
/// shouldn't bring down a release build when they do.
#[macro_export]
macro_rules! debug_panic {
    ($($arg:tt)*) => {{
        if cfg!(debug_assertions) {
            panic!($($arg)*);
        } else {
            $crate::__log::error!($($arg)*);
        }
    }};
}

