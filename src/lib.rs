pub mod error;
pub mod config;
pub mod i18n;
pub mod transport;
pub mod notify;
pub mod identity;
pub mod guard;
pub mod resource;
pub mod models;
pub mod domain;
pub mod context;

pub use context::ServiceContext;
pub use error::{ApiError, ApiResult};

// Debug-only trace printing: goes to stderr in tests and debug builds, compiled out otherwise.
// Usage: tprintln!("auth.identity user={}", name);
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

// Release builds keep the format arguments type-checked but emit nothing.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        if false { let _ = format!($($arg)*); }
    });
}
