use std::collections::HashSet;

use crate::types::{FetchMode, Provider};

/// Used whenever the configured providers resolve to nothing.
pub const DEFAULT_PROVIDER: Provider = Provider::Lrclib;

/// Projects the provider configuration into the ordered candidate lists
/// for the synced and plain passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResolver {
    order: Vec<Provider>,
    enabled: HashSet<Provider>,
}

impl Default for ProviderResolver {
    fn default() -> Self {
        Self::new(
            Provider::ALL.to_vec(),
            Provider::ALL.into_iter().filter(|p| *p != Provider::Genius),
        )
    }
}

impl ProviderResolver {
    pub fn new<I>(order: Vec<Provider>, enabled: I) -> Self
    where
        I: IntoIterator<Item = Provider>,
    {
        let mut seen = HashSet::new();
        let order = order.into_iter().filter(|p| seen.insert(*p)).collect();

        Self {
            order,
            enabled: enabled.into_iter().collect(),
        }
    }

    pub fn order(&self) -> &[Provider] {
        &self.order
    }

    pub fn is_enabled(&self, provider: Provider) -> bool {
        self.enabled.contains(&provider)
    }

    /// Enabled providers in priority order. Never empty.
    pub fn ordered_enabled(&self, mode: FetchMode) -> Vec<Provider> {
        let candidates: Vec<Provider> = self
            .order
            .iter()
            .copied()
            .filter(|p| self.enabled.contains(p))
            .filter(|p| mode == FetchMode::Plain || !p.is_plain_only())
            .collect();

        if candidates.is_empty() {
            vec![DEFAULT_PROVIDER]
        } else {
            candidates
        }
    }

    pub fn synced_order(&self) -> Vec<Provider> {
        self.ordered_enabled(FetchMode::Synced)
    }

    pub fn plain_order(&self) -> Vec<Provider> {
        self.ordered_enabled(FetchMode::Plain)
    }
}
