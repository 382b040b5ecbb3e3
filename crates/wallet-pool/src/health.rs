use std::{
    collections::HashMap,
    panic::AssertUnwindSafe,
    sync::RwLock,
    time::Duration,
};

use async_trait::async_trait;
use solana_pubkey::Pubkey;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{Error, Result},
    wallet::WalletHealth,
};

/// How long a wallet may sit unpolled before its health is considered
/// [`WalletHealth::Critical`] by omission — not part of the spec's
/// threshold logic but guards against a balance lookup that never
/// completes from silently leaving a dead wallet marked healthy forever.
pub const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const HEALTH_POLL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthThresholds {
    pub min_healthy_balance: f64,
    pub critical_balance: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            min_healthy_balance: 0.005,
            critical_balance: 0.001,
        }
    }
}

impl HealthThresholds {
    pub fn classify(&self, balance: f64) -> WalletHealth {
        if balance >= self.min_healthy_balance {
            WalletHealth::Healthy
        } else if balance <= self.critical_balance {
            WalletHealth::Critical
        } else {
            WalletHealth::Low
        }
    }
}

/// The RPC-facing collaborator the health checker polls. A concrete
/// implementation wraps a real RPC client; tests use an in-memory fake.
#[async_trait]
pub trait NativeBalanceProvider: Send + Sync {
    /// Native-token balance for `wallet`, in major units (e.g. SOL).
    async fn get_balance(&self, wallet: &Pubkey) -> Result<f64>;
}

/// Invoked on a healthy/low → critical transition. Kept as a plain
/// synchronous callback (not async) so the observability collaborator can
/// fire a metric or alert without the health checker waiting on it;
/// implementations that need to do async work should hand off to a
/// channel or spawned task themselves.
pub trait CriticalBalanceObserver: Send + Sync {
    fn on_critical(&self, wallet: Pubkey, balance: f64);
}

/// Tracks the last-known [`WalletHealth`] of every wallet in the pool.
/// Guarded by a single `RwLock`, matching the read-mostly registry shape
/// used elsewhere in this workspace (e.g. `paywall_money::AssetRegistry`).
#[derive(Default)]
pub struct HealthMap {
    inner: RwLock<HashMap<Pubkey, WalletHealth>>,
}

impl HealthMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, wallet: &Pubkey) -> Option<WalletHealth> {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).get(wallet).copied()
    }

    pub fn set(&self, wallet: Pubkey, health: WalletHealth) {
        self.inner.write().unwrap_or_else(|e| e.into_inner()).insert(wallet, health);
    }

    pub fn snapshot(&self) -> HashMap<Pubkey, WalletHealth> {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Polls `provider` for every wallet in `wallets` once, with
/// [`HEALTH_POLL_TIMEOUT`] per lookup, updates `map`, and fires
/// `observer.on_critical` for any wallet that transitions into
/// [`WalletHealth::Critical`] this round. A lookup failure (timeout or
/// transport error) leaves that wallet's prior classification untouched
/// rather than guessing.
pub async fn poll_once(
    wallets: &[Pubkey],
    provider: &dyn NativeBalanceProvider,
    thresholds: HealthThresholds,
    map: &HealthMap,
    observer: Option<&dyn CriticalBalanceObserver>,
) {
    for &wallet in wallets {
        let previous = map.get(&wallet);
        let balance = match tokio::time::timeout(HEALTH_POLL_TIMEOUT, provider.get_balance(&wallet)).await {
            Ok(Ok(balance)) => balance,
            Ok(Err(error)) => {
                tracing::warn!(%wallet, %error, "wallet balance lookup failed");
                continue;
            }
            Err(_) => {
                tracing::warn!(%wallet, "wallet balance lookup timed out");
                continue;
            }
        };

        let health = thresholds.classify(balance);
        map.set(wallet, health);

        if health == WalletHealth::Critical && previous != Some(WalletHealth::Critical) {
            if let Some(observer) = observer {
                // Isolate a misbehaving hook: one observer panicking must
                // not take down the health-check loop.
                let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| observer.on_critical(wallet, balance)));
                if outcome.is_err() {
                    tracing::error!(%wallet, "critical-balance observer panicked");
                }
            }
        }
    }
}

/// Runs [`poll_once`] on a fixed [`HEALTH_POLL_INTERVAL`] cadence until
/// `cancel` fires.
pub async fn run_health_loop(
    wallets: Vec<Pubkey>,
    provider: &dyn NativeBalanceProvider,
    thresholds: HealthThresholds,
    map: &HealthMap,
    observer: Option<&dyn CriticalBalanceObserver>,
    cancel: &CancellationToken,
) {
    let mut interval = tokio::time::interval(HEALTH_POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                poll_once(&wallets, provider, thresholds, map, observer).await;
            }
            () = cancel.cancelled() => return,
        }
    }
}

/// Ensures `wallet` has a known classification, failing rather than
/// silently treating an unpolled wallet as healthy.
pub fn require_known(map: &HealthMap, wallet: &Pubkey) -> Result<WalletHealth> {
    map.get(wallet).ok_or_else(|| Error::BalanceLookup(format!("{wallet} has never been polled")))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    struct FixedProvider(f64);

    #[async_trait]
    impl NativeBalanceProvider for FixedProvider {
        async fn get_balance(&self, _wallet: &Pubkey) -> Result<f64> {
            Ok(self.0)
        }
    }

    struct CountingObserver(AtomicU32);

    impl CriticalBalanceObserver for CountingObserver {
        fn on_critical(&self, _wallet: Pubkey, _balance: f64) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn classify_thresholds() {
        let thresholds = HealthThresholds::default();
        assert_eq!(thresholds.classify(0.01), WalletHealth::Healthy);
        assert_eq!(thresholds.classify(0.003), WalletHealth::Low);
        assert_eq!(thresholds.classify(0.0005), WalletHealth::Critical);
        assert_eq!(thresholds.classify(0.001), WalletHealth::Critical);
        assert_eq!(thresholds.classify(0.005), WalletHealth::Healthy);
    }

    #[tokio::test]
    async fn critical_transition_fires_observer_once() {
        let provider = FixedProvider(0.0001);
        let map = HealthMap::new();
        let observer = CountingObserver(AtomicU32::new(0));
        let wallet = Pubkey::new_unique();

        poll_once(&[wallet], &provider, HealthThresholds::default(), &map, Some(&observer)).await;
        poll_once(&[wallet], &provider, HealthThresholds::default(), &map, Some(&observer)).await;

        assert_eq!(observer.0.load(Ordering::SeqCst), 1);
        assert_eq!(map.get(&wallet), Some(WalletHealth::Critical));
    }

    #[tokio::test]
    async fn unpolled_wallet_is_not_known() {
        let map = HealthMap::new();
        assert!(require_known(&map, &Pubkey::new_unique()).is_err());
    }
}
