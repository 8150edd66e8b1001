//! Classifier Register Conventions
//!
//! Codes and limits at the boundary with the sensor's machine learning core.

/// Output code meaning "no valid classification".
///
/// A failed I2C read returns all ones, and the classifier never emits 0xFF as
/// a decision-tree class, so the two collapse onto one sentinel.
///
/// Source: LSM6DSOX register read failure convention
pub const NO_CLASSIFICATION_CODE: u8 = 0xFF;
