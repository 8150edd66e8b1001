//! Diagnostic output shims
//!
//! Routes diagnostics to `log` on hosted builds and to `defmt` on embedded
//! builds. With neither backend compiled in the macros expand to nothing, so
//! call sites never need their own `cfg` guards. Arguments must be plain
//! integers or `&str` so both backends can format them.

#[cfg(feature = "log")]
macro_rules! diag_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(all(feature = "defmt", not(feature = "log")))]
macro_rules! diag_warn {
    ($($arg:tt)*) => { defmt::warn!($($arg)*) };
}

#[cfg(not(any(feature = "log", feature = "defmt")))]
macro_rules! diag_warn {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! diag_info {
    ($($arg:tt)*) => { log::info!($($arg)*) };
}

#[cfg(all(feature = "defmt", not(feature = "log")))]
macro_rules! diag_info {
    ($($arg:tt)*) => { defmt::info!($($arg)*) };
}

#[cfg(not(any(feature = "log", feature = "defmt")))]
macro_rules! diag_info {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! diag_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(all(feature = "defmt", not(feature = "log")))]
macro_rules! diag_debug {
    ($($arg:tt)*) => { defmt::debug!($($arg)*) };
}

#[cfg(not(any(feature = "log", feature = "defmt")))]
macro_rules! diag_debug {
    ($($arg:tt)*) => {};
}
