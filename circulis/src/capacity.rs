//! Capacity rounding.

/// Returns the smallest power of two greater than or equal to `requested`.
///
/// Returns `None` for zero, or when the result would not fit in `usize`.
///
/// ```
/// use circulis::effective_capacity;
///
/// assert_eq!(effective_capacity(1000), Some(1024));
/// assert_eq!(effective_capacity(1024), Some(1024));
/// assert_eq!(effective_capacity(0), None);
/// ```
pub fn effective_capacity(requested: usize) -> Option<usize> {
    if requested == 0 {
        return None;
    }
    requested.checked_next_power_of_two()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_values() {
        assert_eq!(effective_capacity(1), Some(1));
        assert_eq!(effective_capacity(2), Some(2));
        assert_eq!(effective_capacity(3), Some(4));
        assert_eq!(effective_capacity(8), Some(8));
        assert_eq!(effective_capacity(1000), Some(1024));
        assert_eq!(effective_capacity(1024), Some(1024));
        assert_eq!(effective_capacity(1025), Some(2048));
    }

    #[test]
    fn test_zero_and_overflow() {
        assert_eq!(effective_capacity(0), None);
        assert_eq!(effective_capacity(usize::MAX), None);
        assert_eq!(effective_capacity((usize::MAX >> 1) + 2), None);
        assert_eq!(
            effective_capacity((usize::MAX >> 1) + 1),
            Some((usize::MAX >> 1) + 1)
        );
    }

    proptest! {
        #[test]
        fn rounds_to_smallest_power_of_two(n in 1usize..=(u32::MAX as usize)) {
            let cap = effective_capacity(n).unwrap();
            prop_assert!(cap.is_power_of_two());
            prop_assert!(cap >= n);
            prop_assert!(cap / 2 < n);
        }
    }
}
