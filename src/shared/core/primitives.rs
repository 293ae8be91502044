// Primitive values shared by every module.
//
// Timestamps
// - All i64 time values are epoch milliseconds.

pub type Timestamp = i64;

pub fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}
