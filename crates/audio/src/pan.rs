//! Stereo pan law.

/// Per-channel gain multipliers for a pan position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanGains {
    /// Multiplier for the left (first) output channel.
    pub left: f32,
    /// Multiplier for the right (second) output channel.
    pub right: f32,
}

impl PanGains {
    /// Compute the gains for `pan`, where `0.0` is hard left and `1.0` hard right.
    ///
    /// One channel always stays at full scale and the other is attenuated, so a
    /// centered sound is as loud as an unpanned one.
    pub fn new(pan: f32) -> Self {
        if pan < 0.5 {
            Self {
                left: 1.0,
                right: pan / (1.0 - pan),
            }
        } else {
            Self {
                left: (1.0 - pan) / pan,
                right: 1.0,
            }
        }
    }

    /// Both gains multiplied by `volume`.
    pub fn scaled(self, volume: f32) -> Self {
        Self {
            left: self.left * volume,
            right: self.right * volume,
        }
    }
}
