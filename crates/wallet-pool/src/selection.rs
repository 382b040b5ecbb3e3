use std::sync::atomic::{AtomicUsize, Ordering};

use solana_pubkey::Pubkey;

use crate::{health::HealthMap, wallet::WalletHealth};

/// Round-robins over a fixed wallet order, restricted to wallets the
/// [`HealthMap`] currently classifies as healthy. The order itself never
/// changes after construction — only which members are eligible does.
pub struct RoundRobinSelector {
    wallets: Vec<Pubkey>,
    cursor: AtomicUsize,
}

impl RoundRobinSelector {
    pub fn new(wallets: Vec<Pubkey>) -> Self {
        Self {
            wallets,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn wallets(&self) -> &[Pubkey] {
        &self.wallets
    }

    /// Returns the next healthy wallet after the current cursor position,
    /// wrapping around at most once, and advances the cursor to it.
    /// `None` if no wallet in the pool is healthy.
    pub fn select_healthy(&self, health: &HealthMap) -> Option<Pubkey> {
        if self.wallets.is_empty() {
            return None;
        }
        let start = self.cursor.load(Ordering::SeqCst);
        for offset in 1..=self.wallets.len() {
            let idx = (start + offset) % self.wallets.len();
            let candidate = self.wallets[idx];
            if health.get(&candidate).is_some_and(WalletHealth::is_healthy) {
                self.cursor.store(idx, Ordering::SeqCst);
                return Some(candidate);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::wallet::WalletHealth;

    fn pool_of(n: usize) -> Vec<Pubkey> {
        (0..n).map(|_| Pubkey::new_unique()).collect()
    }

    #[test]
    fn skips_unhealthy_and_advances_cursor() {
        let wallets = pool_of(3);
        let health = HealthMap::new();
        health.set(wallets[0], WalletHealth::Healthy);
        health.set(wallets[1], WalletHealth::Critical);
        health.set(wallets[2], WalletHealth::Healthy);

        let selector = RoundRobinSelector::new(wallets.clone());
        selector.cursor.store(1, Ordering::SeqCst);

        let selected = selector.select_healthy(&health).unwrap();
        assert_eq!(selected, wallets[2], "should skip the critical wallet at index 1 and land on index 2");
    }

    #[test]
    fn returns_none_when_nothing_is_healthy() {
        let wallets = pool_of(2);
        let health = HealthMap::new();
        health.set(wallets[0], WalletHealth::Critical);
        health.set(wallets[1], WalletHealth::Low);

        let selector = RoundRobinSelector::new(wallets);
        assert!(selector.select_healthy(&health).is_none());
    }

    #[test]
    fn wraps_around_to_find_a_healthy_wallet() {
        let wallets = pool_of(3);
        let health = HealthMap::new();
        health.set(wallets[0], WalletHealth::Healthy);
        health.set(wallets[1], WalletHealth::Critical);
        health.set(wallets[2], WalletHealth::Critical);

        let selector = RoundRobinSelector::new(wallets.clone());
        selector.cursor.store(2, Ordering::SeqCst);

        assert_eq!(selector.select_healthy(&health).unwrap(), wallets[0]);
    }
}
