//! Shared test utilities for lottery integration tests
#![allow(dead_code)]

use common::draw::DrawNumbers;
use common::lottery::Lottery;
use common::round::FixedNumberSource;
use common::store::MemoryDrawStore;
use common::user::{Registration, User};
use tracing_subscriber::EnvFilter;

/// Route engine logs to the test harness, filtered by `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn numbers(ns: [u32; 6]) -> DrawNumbers {
    DrawNumbers::new(ns).unwrap()
}

/// Winning numbers every fixed-source test lottery publishes
pub fn winning() -> DrawNumbers {
    numbers([3, 17, 22, 40, 51, 59])
}

/// Set up an in-memory lottery that always publishes [`winning`], plus its admin
pub async fn setup_test_env() -> (Lottery<MemoryDrawStore>, User) {
    init_tracing();
    let lottery =
        Lottery::new(MemoryDrawStore::new()).with_number_source(FixedNumberSource(winning()));
    let admin = lottery
        .bootstrap_admin(Registration::new("admin@email.com", "Alice", "Jones"))
        .await
        .unwrap();
    (lottery, admin)
}

/// Register a player with a fresh keypair
pub async fn player(lottery: &Lottery<MemoryDrawStore>, email: &str) -> User {
    lottery
        .register_user(Registration::new(email, "Test", "Player"))
        .await
        .unwrap()
}
