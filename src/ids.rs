use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use lazy_static::lazy_static;

lazy_static! {
    static ref LAST_ID: AtomicI64 = AtomicI64::new(0);
}

/// Returns a new identifier derived from the current time in
/// milliseconds. Identifiers are strictly increasing within a process,
/// so two records created in the same millisecond still differ.
pub fn next_id() -> i64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default();

    let mut previous = LAST_ID.load(Ordering::SeqCst);

    loop {
        let candidate = now.max(previous + 1);

        match LAST_ID.compare_exchange(previous, candidate, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return candidate,
            Err(actual) => previous = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::next_id;

    #[test]
    fn ids_are_unique_and_increasing() {
        let ids = (0..1000).map(|_| next_id()).collect::<Vec<_>>();

        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
    }

    #[test]
    fn ids_are_timestamps() {
        // 2020-01-01T00:00:00Z
        assert!(next_id() > 1_577_836_800_000);
    }
}
