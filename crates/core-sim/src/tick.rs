use crate::state::AssetState;

/// Advances the base and leveraged asset by one shared daily return.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickEngine {
    leverage: f64,
    floor_at_zero: bool,
}

impl TickEngine {
    pub fn new(leverage: f64) -> Self {
        Self {
            leverage,
            floor_at_zero: false,
        }
    }

    pub fn with_floor_at_zero(mut self, floor_at_zero: bool) -> Self {
        self.floor_at_zero = floor_at_zero;
        self
    }

    /// `base *= 1 + r` and `leveraged *= 1 + leverage * r`. Values are left
    /// unclamped unless the engine was built with a zero floor.
    pub fn advance(&self, base: &mut AssetState, leveraged: &mut AssetState, daily_return: f64) {
        base.apply_change(daily_return);
        leveraged.apply_change(self.leverage * daily_return);

        if self.floor_at_zero {
            base.floor_at_zero();
            leveraged.floor_at_zero();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::state::AssetState;

    use super::TickEngine;

    fn step(engine: TickEngine, base: f64, leveraged: f64, r: f64) -> (f64, f64) {
        let mut base = AssetState::new(base);
        let mut leveraged = AssetState::new(leveraged);
        engine.advance(&mut base, &mut leveraged, r);
        (base.value, leveraged.value)
    }

    #[test]
    fn leveraged_update_ignores_base_value() {
        let engine = TickEngine::new(3.0);

        let (_, from_small_base) = step(engine, 1.0, 500.0, 0.02);
        let (_, from_large_base) = step(engine, 9_000.0, 500.0, 0.02);

        assert_eq!(from_small_base, 500.0 * (1.0 + 3.0 * 0.02));
        assert_eq!(from_small_base, from_large_base);
    }

    #[test]
    fn two_x_leverage_doubles_the_change() {
        let (base, leveraged) = step(TickEngine::new(2.0), 1000.0, 1000.0, 0.05);

        assert_eq!(base, 1050.0);
        assert_eq!(leveraged, 1100.0);
    }

    #[test]
    fn leveraged_loss_matches_scaled_change() {
        let (_, leveraged) = step(TickEngine::new(2.0), 70.0, 70.0, -0.03);

        assert!((leveraged - 65.8).abs() < 1e-9);
    }

    #[test]
    fn unit_leverage_moves_both_assets_identically() {
        let (base, leveraged) = step(TickEngine::new(1.0), 1000.0, 1000.0, -0.0731);

        assert_eq!(base, leveraged);
    }

    #[test]
    fn extreme_drop_goes_negative_without_floor() {
        let (_, leveraged) = step(TickEngine::new(3.0), 100.0, 100.0, -0.5);

        assert_eq!(leveraged, -50.0);
    }

    #[test]
    fn floor_keeps_values_at_zero() {
        let engine = TickEngine::new(3.0).with_floor_at_zero(true);

        let (base, leveraged) = step(engine, 100.0, 100.0, -0.5);

        assert_eq!(base, 50.0);
        assert_eq!(leveraged, 0.0);
    }
}
