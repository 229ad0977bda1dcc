//! Ids for correlating the log lines of one request.
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use std::cell::RefCell;

thread_local! {
    static ID_RNG: RefCell<SmallRng> = RefCell::new(SmallRng::from_entropy());
}

/// Returns 16 lowercase hex digits. Not suitable for anything security-related.
#[must_use]
pub fn new_request_id() -> String {
    ID_RNG.with(|cell| format!("{:016x}", cell.borrow_mut().next_u64()))
}
