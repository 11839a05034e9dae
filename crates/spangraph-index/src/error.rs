//! Error types for the indexed collections

/// Errors surfaced by positional operations on indexed collections
///
/// Reverse-index desynchronisation is never reported here: that is a
/// programming error and is caught by debug assertions instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// Position outside the valid range of the collection
    #[error("position {index} out of bounds for length {len}")]
    OutOfBounds {
        /// Offending position
        index: usize,
        /// Length of the collection at the time of the call
        len: usize,
    },

    /// Value is already present in a collection requiring unique values
    #[error("value already present at position {existing} (attempted at {attempted})")]
    DuplicateValue {
        /// Position currently holding the value
        existing: usize,
        /// Position at which the value was offered
        attempted: usize,
    },
}

impl IndexError {
    /// Create out-of-bounds error
    #[inline]
    #[must_use]
    pub fn out_of_bounds(index: usize, len: usize) -> Self {
        Self::OutOfBounds { index, len }
    }

    /// Create duplicate value error
    #[inline]
    #[must_use]
    pub fn duplicate(existing: usize, attempted: usize) -> Self {
        Self::DuplicateValue {
            existing,
            attempted,
        }
    }

    /// Check if error is a bounds violation
    #[inline]
    #[must_use]
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. })
    }
}

/// Bounds check for positions that must address an existing element
#[inline]
pub(crate) fn check_element(index: usize, len: usize) -> Result<(), IndexError> {
    if index < len {
        Ok(())
    } else {
        Err(IndexError::out_of_bounds(index, len))
    }
}

/// Bounds check for insertion points (`len` itself is valid)
#[inline]
pub(crate) fn check_insertion(index: usize, len: usize) -> Result<(), IndexError> {
    if index <= len {
        Ok(())
    } else {
        Err(IndexError::out_of_bounds(index, len))
    }
}
