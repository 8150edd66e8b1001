//! Classifier Bring-Up and Reads
//!
//! The machine learning core is configured once at startup by replaying a
//! register program (a UCF file exported by the vendor tooling: a flat list of
//! address/data pairs). After that, the only interaction is reading the
//! output register.
//!
//! ```text
//! bring-up:  [UcfLine; n] ──write_register──► sensor      (fatal on error)
//! runtime:   sensor ──read_code──► RawStateCode            (never fails)
//! ```

use crate::errors::{ClassifierLoadError, SensorReadError};
use crate::events::RawStateCode;
use crate::traits::{ClassifierSource, RegisterWriter};

/// One line of a classifier register program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UcfLine {
    /// Register address
    pub address: u8,
    /// Value to write
    pub data: u8,
}

impl UcfLine {
    /// Create a program line
    pub const fn new(address: u8, data: u8) -> Self {
        Self { address, data }
    }
}

/// Write a register program line by line
///
/// Stops at the first failing write and reports its index and address. A
/// partially loaded program leaves the classifier in an undefined state, so
/// callers must not start the pipeline after an error.
pub fn load_program<W>(writer: &mut W, program: &[UcfLine]) -> Result<(), ClassifierLoadError>
where
    W: RegisterWriter + ?Sized,
{
    diag_info!("loading classifier program ({} lines)", program.len());

    for (line, entry) in program.iter().enumerate() {
        if writer.write_register(entry.address, entry.data).is_err() {
            diag_warn!("classifier program write failed at line {}", line);
            return Err(ClassifierLoadError {
                line,
                address: entry.address,
            });
        }
    }

    diag_info!("classifier program loaded");
    Ok(())
}

/// Read the output register once
///
/// Returns the failure cause alongside the sentinel-mapped result so callers
/// can count bus errors separately from "nothing yet".
pub fn try_read<S>(source: &mut S) -> Result<RawStateCode, SensorReadError>
where
    S: ClassifierSource + ?Sized,
{
    match source.read_code() {
        Ok(byte) => match RawStateCode::from_register(byte) {
            RawStateCode::NoClassification => Err(SensorReadError::NoClassification),
            code => Ok(code),
        },
        Err(nb::Error::WouldBlock) => Err(SensorReadError::NoClassification),
        Err(nb::Error::Other(_)) => Err(SensorReadError::Bus),
    }
}

/// Read the output register, substituting the sentinel on any failure
pub fn read_raw<S>(source: &mut S) -> RawStateCode
where
    S: ClassifierSource + ?Sized,
{
    match try_read(source) {
        Ok(code) => code,
        Err(SensorReadError::Bus) => {
            diag_debug!("classifier read failed, using sentinel");
            RawStateCode::NoClassification
        }
        Err(SensorReadError::NoClassification) => RawStateCode::NoClassification,
    }
}
