#[cfg(test)]
mod tests {
    use crate::backoff::{RetryDelay, DEFAULT_CEILING_MS, DEFAULT_FLOOR_MS};

    #[test]
    fn test_bump_doubles_up_to_ceiling() {
        let mut delay = RetryDelay::new(20, 100);

        assert_eq!(delay.current(), 20);
        assert_eq!(delay.bump(), 40);
        assert_eq!(delay.bump(), 80);
        // Clamped
        assert_eq!(delay.bump(), 100);
        assert_eq!(delay.bump(), 100);
    }

    #[test]
    fn test_bump_is_monotonic() {
        let mut delay = RetryDelay::default();
        let mut last = delay.current();
        for _ in 0..30 {
            let next = delay.bump();
            assert!(next >= last);
            assert!(next <= DEFAULT_CEILING_MS);
            last = next;
        }
    }

    #[test]
    fn test_reset_returns_to_floor() {
        let mut delay = RetryDelay::default();
        delay.bump();
        delay.bump();
        delay.reset();
        assert_eq!(delay.current(), DEFAULT_FLOOR_MS);
    }

    #[test]
    fn test_ceiling_never_below_floor() {
        let mut delay = RetryDelay::new(500, 100);
        assert_eq!(delay.bump(), 500);
    }
}
