/// Current value of one asset inside a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssetState {
    pub value: f64,
}

impl AssetState {
    pub fn new(value: f64) -> Self {
        Self { value }
    }

    pub fn apply_change(&mut self, change: f64) {
        self.value *= 1.0 + change;
    }

    pub fn floor_at_zero(&mut self) {
        self.value = self.value.max(0.0);
    }
}
