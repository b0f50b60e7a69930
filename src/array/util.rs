use arrow_buffer::{OffsetBuffer, ScalarBuffer};

use crate::error::{GeoUnionError, Result};

/// Offsets utils that arrow-buffer itself doesn't provide.
pub(crate) trait OffsetBufferUtils {
    /// Returns the length an array with these offsets would be.
    fn len_proxy(&self) -> usize;

    /// Returns a range (start, end) corresponding to the position `index`
    ///
    /// # Panic
    ///
    /// Panics iff `index >= self.len_proxy()`
    fn start_end(&self, index: usize) -> (usize, usize);

    /// Returns the last offset.
    fn last(&self) -> i32;
}

impl OffsetBufferUtils for OffsetBuffer<i32> {
    #[inline]
    fn len_proxy(&self) -> usize {
        self.len() - 1
    }

    #[inline]
    fn start_end(&self, index: usize) -> (usize, usize) {
        assert!(index < self.len_proxy());
        let slice: &[i32] = self.as_ref();
        (slice[index] as usize, slice[index + 1] as usize)
    }

    #[inline]
    fn last(&self) -> i32 {
        *self.as_ref().last().unwrap()
    }
}

/// Validate a raw offset vector against the element count of the level below
/// and wrap it into an [`OffsetBuffer`].
///
/// The checks mirror the construction contract: offsets are non-decreasing,
/// start at 0, and the last entry equals `child_len`.
pub(crate) fn validated_offsets(
    offsets: Vec<i32>,
    child_len: usize,
    what: &str,
) -> Result<OffsetBuffer<i32>> {
    if offsets.is_empty() {
        return Err(GeoUnionError::MalformedOffsets(format!(
            "{what} offsets must contain at least one entry"
        )));
    }
    if offsets[0] != 0 {
        return Err(GeoUnionError::MalformedOffsets(format!(
            "{what} offsets must start at 0, got {}",
            offsets[0]
        )));
    }
    for window in offsets.windows(2) {
        if window[1] < window[0] {
            return Err(GeoUnionError::MalformedOffsets(format!(
                "{what} offsets must be non-decreasing, got {} after {}",
                window[1], window[0]
            )));
        }
    }
    let last = *offsets.last().unwrap();
    if last as usize != child_len {
        return Err(GeoUnionError::MalformedOffsets(format!(
            "largest {what} offset {last} must match the element count {child_len} of the level below"
        )));
    }
    let buffer: ScalarBuffer<i32> = offsets.into();
    // Checked above.
    Ok(unsafe { OffsetBuffer::new_unchecked(buffer) })
}

/// Convert an element count into an i32 offset delta.
pub(crate) fn to_offset(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| GeoUnionError::Overflow)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn offsets_are_validated() {
        assert!(validated_offsets(vec![0, 2, 4], 4, "geometry").is_ok());
        assert!(validated_offsets(vec![], 0, "geometry").is_err());
        assert!(validated_offsets(vec![1, 2], 2, "geometry").is_err());
        assert!(validated_offsets(vec![0, 3, 2], 2, "geometry").is_err());
        assert!(validated_offsets(vec![0, 2, 4], 5, "geometry").is_err());
    }

    #[test]
    fn start_end() {
        let offsets = validated_offsets(vec![0, 2, 2, 5], 5, "geometry").unwrap();
        assert_eq!(offsets.len_proxy(), 3);
        assert_eq!(offsets.start_end(1), (2, 2));
        assert_eq!(offsets.start_end(2), (2, 5));
        assert_eq!(offsets.last(), 5);
    }
}
