//! Strike velocity from input anticipation time.
//!
//! Anticipation is how long a player hovered before striking a key. A quick,
//! decisive strike plays loud and a hesitant one plays soft:
//!
//! ```text
//! velocity = min + (max - min) * e^(-anticipation / decay)
//! ```

use crate::config::VelocityConfig;

/// Velocity for a strike with no anticipation signal
pub const DEFAULT_VELOCITY: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityMapper {
    config: VelocityConfig,
}

impl Default for VelocityMapper {
    fn default() -> Self {
        Self::new(VelocityConfig::default())
    }
}

impl VelocityMapper {
    pub fn new(config: VelocityConfig) -> Self {
        Self { config }
    }

    /// Map anticipation in milliseconds to a velocity within `[min, max]`.
    ///
    /// # Example
    /// ```
    /// use sheetplay::VelocityMapper;
    ///
    /// let mapper = VelocityMapper::default();
    /// assert_eq!(mapper.calculate_velocity(Some(0.0)), 127);
    /// assert_eq!(mapper.calculate_velocity(Some(1e9)), 40);
    /// assert_eq!(mapper.calculate_velocity(None), 90);
    /// ```
    pub fn calculate_velocity(&self, anticipation_ms: Option<f64>) -> u8 {
        let Some(anticipation) = anticipation_ms.filter(|ms| !ms.is_nan()) else {
            return self.config.default;
        };

        // Bounds are public fields; an inverted range is read as its reverse
        let (lo, hi) = (self.config.min, self.config.max);
        let min = lo.min(hi) as f64;
        let max = lo.max(hi) as f64;
        let decay = self.config.decay_ms.max(f64::MIN_POSITIVE);
        let falloff = (-anticipation.max(0.0) / decay).exp();

        (min + (max - min) * falloff).round().clamp(min, max) as u8
    }
}
