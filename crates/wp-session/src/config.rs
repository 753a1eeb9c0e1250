/// Gas ceiling for a single `wave(string)` transaction.
pub const DEFAULT_GAS_LIMIT: u64 = 300_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Upper bound on gas a single wave transaction may consume.
    pub gas_limit: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            gas_limit: DEFAULT_GAS_LIMIT,
        }
    }
}

impl SessionConfig {
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }
}
