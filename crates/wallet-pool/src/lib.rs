//! The sponsor/auto-create-ATA wallet fleet: health classification,
//! healthy-only round-robin selection, and a rate-limit-aware broadcast
//! queue.

mod error;
mod health;
mod pool;
mod queue;
mod selection;
mod wallet;

pub use self::{
    error::{Error, Result},
    health::{
        CriticalBalanceObserver, HEALTH_POLL_INTERVAL, HEALTH_POLL_TIMEOUT, HealthMap, HealthThresholds, NativeBalanceProvider,
        poll_once, require_known, run_health_loop,
    },
    pool::WalletPool,
    queue::{QueueItem, SendOutcome, SendQueue, SendQueueConfig, TransactionSender, run_send_queue_worker},
    selection::RoundRobinSelector,
    wallet::{Wallet, WalletHealth},
};
