//! Last-value store for the device status.

use parking_lot::Mutex;

use crate::status::StatusRecord;

/// Concurrency-safe single-slot holder for the latest [`StatusRecord`].
///
/// The session's event-loop task writes into the slot; request handlers
/// read from it concurrently. Each write replaces the previous record
/// wholesale, never merging fields. There is no queue and no waiting:
/// last-value semantics only.
#[derive(Debug, Default)]
pub struct StatusStore {
    slot: Mutex<Option<StatusRecord>>,
}

impl StatusStore {
    /// Create an empty store ("none yet observed").
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the stored record.
    pub fn write(&self, record: StatusRecord) {
        *self.slot.lock() = Some(record);
    }

    /// Atomically snapshot the current record, or `None` if no heartbeat
    /// has ever been accepted.
    pub fn read(&self) -> Option<StatusRecord> {
        self.slot.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(uptime_ms: u64) -> StatusRecord {
        StatusRecord {
            temp_c: Some(uptime_ms as f64),
            humidity: None,
            rain: Some(false),
            mode: None,
            uptime_ms: Some(uptime_ms),
            received_at: Utc::now(),
        }
    }

    #[test]
    fn reads_absent_before_any_write() {
        assert_eq!(StatusStore::new().read(), None);
    }

    #[test]
    fn read_returns_the_written_record() {
        let store = StatusStore::new();
        let r = record(1);
        store.write(r.clone());
        assert_eq!(store.read(), Some(r));
    }

    #[test]
    fn last_write_wins_without_field_merge() {
        let store = StatusStore::new();
        store.write(record(1));

        let mut r2 = record(2);
        r2.rain = None;
        r2.temp_c = None;
        store.write(r2.clone());

        // r1's fields must not leak into r2's absent slots.
        let got = store.read().unwrap();
        assert_eq!(got, r2);
        assert_eq!(got.rain, None);
        assert_eq!(got.temp_c, None);
    }
}
