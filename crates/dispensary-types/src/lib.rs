//! Validated primitive types shared across the dispensary crates.
//!
//! These newtypes move input validation to construction time: once a value
//! exists, downstream code can rely on its invariant without re-checking.
//! Both types validate during deserialization as well, so malformed wire
//! payloads are rejected with a field-level error.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("text cannot be blank")]
    Blank,
}

/// Errors that can occur when creating validated quantity values.
#[derive(Debug, thiserror::Error)]
pub enum QuantityError {
    /// The input was NaN, infinite, or negative
    #[error("quantity value must be a finite, non-negative number, got {0}")]
    OutOfRange(f64),
}

/// A string type that guarantees non-blank content.
///
/// Wraps a `String` and ensures it contains at least one non-whitespace
/// character. The input is trimmed of leading and trailing whitespace during
/// construction. Used for human-facing display text (medication names,
/// practitioner names) where a blank value would render an empty control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonBlankText(String);

impl NonBlankText {
    /// Creates a new `NonBlankText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the
    /// trimmed result is empty, an error is returned.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Blank`] if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Blank);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonBlankText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonBlankText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonBlankText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonBlankText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonBlankText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A numeric quantity guaranteed to be finite and non-negative.
///
/// FHIR `Quantity.value` is a decimal; a NaN or negative value slipping into
/// quantity arithmetic would poison every sum derived from it. This type
/// rejects such values at the boundary and offers saturating arithmetic so
/// that totals stay within the invariant.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct QuantityValue(f64);

impl QuantityValue {
    /// The zero quantity.
    pub const ZERO: QuantityValue = QuantityValue(0.0);

    /// Creates a new `QuantityValue`.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::OutOfRange`] if `value` is NaN, infinite,
    /// or negative.
    pub fn new(value: f64) -> Result<Self, QuantityError> {
        if !value.is_finite() || value < 0.0 {
            return Err(QuantityError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Returns the inner value.
    pub fn get(&self) -> f64 {
        self.0
    }

    /// Adds two quantities, clamping an overflowing result to `f64::MAX`.
    pub fn saturating_add(&self, other: QuantityValue) -> QuantityValue {
        let sum = self.0 + other.0;
        if sum.is_finite() {
            QuantityValue(sum)
        } else {
            QuantityValue(f64::MAX)
        }
    }

    /// Subtracts `other` from this quantity, flooring the result at zero.
    pub fn saturating_sub(&self, other: QuantityValue) -> QuantityValue {
        QuantityValue((self.0 - other.0).max(0.0))
    }

    /// Multiplies by an integer factor, clamping an overflowing result to
    /// `f64::MAX`.
    pub fn saturating_mul(&self, factor: u32) -> QuantityValue {
        let product = self.0 * f64::from(factor);
        if product.is_finite() {
            QuantityValue(product)
        } else {
            QuantityValue(f64::MAX)
        }
    }
}

impl std::fmt::Display for QuantityValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for QuantityValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for QuantityValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        QuantityValue::new(value).map_err(serde::de::Error::custom)
    }
}
