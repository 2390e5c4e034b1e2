//! Timestamp helpers
//!
//! Stored records carry epoch milliseconds.

/// Current time as epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Current time as epoch seconds
pub fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Whole minutes elapsed since an epoch-seconds instant
pub fn minutes_since(epoch_secs: u64) -> u64 {
    now_secs().saturating_sub(epoch_secs) / 60
}
