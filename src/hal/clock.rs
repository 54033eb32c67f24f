//! Millisecond time source.

/// Monotonic millisecond clock.
///
/// The value may wrap; consumers only ever look at wrapping differences.
pub trait MillisClock {
    /// Milliseconds since an arbitrary epoch.
    fn now_millis(&self) -> u32;
}

impl<C: MillisClock + ?Sized> MillisClock for &C {
    fn now_millis(&self) -> u32 {
        (**self).now_millis()
    }
}

/// Elapsed milliseconds between two clock readings.
#[inline]
pub fn elapsed_millis(since: u32, now: u32) -> u32 {
    now.wrapping_sub(since)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_across_wrap() {
        assert_eq!(elapsed_millis(u32::MAX - 2, 5), 8);
        assert_eq!(elapsed_millis(100, 104), 4);
    }
}
