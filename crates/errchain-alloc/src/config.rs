/// Limits enforced by a [`BudgetAllocator`](crate::BudgetAllocator).
///
/// Both limits are optional; the default is unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BudgetConfig {
    /// Maximum number of bytes live at once.
    pub max_bytes: Option<usize>,
    /// Maximum number of blocks live at once.
    pub max_allocations: Option<usize>,
}

impl BudgetConfig {
    /// An unlimited budget.
    pub const fn unlimited() -> Self {
        Self {
            max_bytes: None,
            max_allocations: None,
        }
    }

    /// Cap the number of live bytes.
    pub const fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Cap the number of live blocks.
    pub const fn with_max_allocations(mut self, max_allocations: usize) -> Self {
        self.max_allocations = Some(max_allocations);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unlimited() {
        assert_eq!(BudgetConfig::default(), BudgetConfig::unlimited());
    }

    #[test]
    fn builder_sets_limits() {
        let config = BudgetConfig::unlimited()
            .with_max_bytes(4096)
            .with_max_allocations(16);
        assert_eq!(config.max_bytes, Some(4096));
        assert_eq!(config.max_allocations, Some(16));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_partial_json() {
        let config: BudgetConfig = serde_json::from_str(r#"{"max_bytes":1024}"#).unwrap();
        assert_eq!(config, BudgetConfig::unlimited().with_max_bytes(1024));
    }
}
