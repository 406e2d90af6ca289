//! Property tests for the pan law.

use gaudio_audio::PanGains;
use proptest::prelude::*;

proptest! {
    /// Property: left of center, the left channel stays at full scale
    #[test]
    fn left_half_keeps_left_full(pan in 0.0f32..0.5) {
        let gains = PanGains::new(pan);
        prop_assert_eq!(gains.left, 1.0);
        prop_assert!((gains.right - pan / (1.0 - pan)).abs() < 1e-6);
        prop_assert!(gains.right < 1.0);
        prop_assert!(gains.right >= 0.0);
    }

    /// Property: right of center, the right channel stays at full scale
    #[test]
    fn right_half_keeps_right_full(pan in 0.5f32..=1.0) {
        let gains = PanGains::new(pan);
        prop_assert_eq!(gains.right, 1.0);
        prop_assert!((gains.left - (1.0 - pan) / pan).abs() < 1e-6);
        prop_assert!(gains.left <= 1.0);
        prop_assert!(gains.left >= 0.0);
    }

    /// Property: mirrored positions swap channels
    #[test]
    fn mirrored_pans_swap_channels(pan in 0.01f32..0.49) {
        let left = PanGains::new(pan);
        let right = PanGains::new(1.0 - pan);
        prop_assert!((left.right - right.left).abs() < 1e-4);
        prop_assert_eq!(left.left, right.right);
    }

    /// Property: scaling multiplies both channels
    #[test]
    fn scaling_is_linear(pan in 0.0f32..=1.0, volume in 0.0f32..2.0) {
        let gains = PanGains::new(pan);
        let scaled = gains.scaled(volume);
        prop_assert!((scaled.left - gains.left * volume).abs() < 1e-6);
        prop_assert!((scaled.right - gains.right * volume).abs() < 1e-6);
    }
}
