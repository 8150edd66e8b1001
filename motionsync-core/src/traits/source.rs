//! Classifier Boundary Traits
//!
//! The sensor's machine learning core runs its decision tree without the
//! host CPU and exposes the result as one 8-bit register. These traits are the
//! only way the pipeline talks to it.

use core::fmt::Debug;

/// Read side of the classifier: its motion-state output register
///
/// Implementations check the classifier status first and answer
/// `nb::Error::WouldBlock` when no inference has completed since power-up.
/// Bus failures are reported as `nb::Error::Other`. The pipeline maps both to
/// the "no classification" sentinel, so neither can produce a transition.
///
/// ## Example Implementation
///
/// ```rust
/// use motionsync_core::traits::ClassifierSource;
///
/// struct Lsm6dsox { /* I2C handle */ }
///
/// impl ClassifierSource for Lsm6dsox {
///     type Error = ();
///
///     fn read_code(&mut self) -> nb::Result<u8, Self::Error> {
///         // Read MLC_STATUS; if the tree bit is clear there is nothing yet
///         // return Err(nb::Error::WouldBlock);
///         // Otherwise read MLC0_SRC
///         Ok(0)
///     }
/// }
/// ```
pub trait ClassifierSource {
    /// Transport error (I2C/SPI)
    type Error: Debug;

    /// Read the current motion-state code
    fn read_code(&mut self) -> nb::Result<u8, Self::Error>;
}

/// Write side of the sensor register map, used only during bring-up
pub trait RegisterWriter {
    /// Transport error (I2C/SPI)
    type Error: Debug;

    /// Write one configuration register
    fn write_register(&mut self, address: u8, data: u8) -> Result<(), Self::Error>;
}
