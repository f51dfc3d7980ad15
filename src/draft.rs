//! Report draft persistence.
//!
//! Saves an in-progress daily report so an operator can resume it later,
//! keyed by `(station, reportDate)` with a fixed 12-hour TTL. The payload is
//! opaque JSON — whatever the form wants to recover — wrapped in an envelope
//! carrying `savedAt`/`expiresAt`.
//!
//! Key design goals:
//! - **Fail-safe**: storage errors are logged and collapsed to `false`/`None`;
//!   nothing here ever panics past the boundary or blocks the form.
//! - **Self-cleaning**: expired or corrupt entries are purged on read and by
//!   the sweep, never surfaced as errors — the draft is simply gone.
//! - **Injected dependencies**: the backing store and the clock are passed
//!   in, so tests run against isolated in-memory stores and simulated time.
//!
//! Concurrent writers to the same key (two browser tabs) race
//! last-write-wins; that is the documented behavior, not a bug.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::kv::KvStore;

/// Key prefix for every stored draft. Internal to this store — not a wire
/// contract — but stable across `(station, date)` pairs.
pub const DRAFT_KEY_PREFIX: &str = "sales-report-draft-";

/// Default draft lifetime. A policy constant, not a business rule; override
/// per store with [`DraftStore::with_ttl`].
pub const DEFAULT_DRAFT_TTL_HOURS: i64 = 12;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Time source for save/expiry decisions. Injected so tests can move the
/// clock instead of sleeping.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time (`Utc::now`), the production clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ---------------------------------------------------------------------------
// Stored shapes
// ---------------------------------------------------------------------------

/// On-disk envelope around the opaque form payload.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftEnvelope {
    saved_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    payload: Value,
}

/// Draft metadata without the payload, for "you have an unsaved draft from
/// 3 hours ago, expiring in 9 hours" banners.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftInfo {
    pub saved_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub hours_remaining: f64,
}

/// One row of the draft-management listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSummary {
    pub station: String,
    pub report_date: String,
    pub info: DraftInfo,
}

// ---------------------------------------------------------------------------
// Draft store
// ---------------------------------------------------------------------------

/// Draft persistence over an injected key-value backend.
///
/// One live draft per `(station, reportDate)` pair: re-saving overwrites the
/// prior entry and resets its expiry. All operations are synchronous; the
/// backend is expected to be local (no network I/O).
pub struct DraftStore<S: KvStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    ttl: Duration,
}

impl<S: KvStore> DraftStore<S> {
    /// Store over `store` with the wall clock and the default 12-hour TTL.
    pub fn new(store: S) -> DraftStore<S> {
        DraftStore::with_clock(store, SystemClock)
    }
}

impl<S: KvStore, C: Clock> DraftStore<S, C> {
    /// Store with an explicit clock (tests inject a manual one).
    pub fn with_clock(store: S, clock: C) -> DraftStore<S, C> {
        DraftStore {
            store,
            clock,
            ttl: Duration::hours(DEFAULT_DRAFT_TTL_HOURS),
        }
    }

    /// Override the draft lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> DraftStore<S, C> {
        self.ttl = ttl;
        self
    }

    /// Borrow the underlying store (draft-management tooling, tests).
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Storage key for a `(station, reportDate)` pair.
    pub fn draft_key(station: &str, report_date: &str) -> String {
        format!("{DRAFT_KEY_PREFIX}{station}-{report_date}")
    }

    // -- save ---------------------------------------------------------------

    /// Persist `payload` for `(station, report_date)`, overwriting any prior
    /// draft and resetting its expiry. Returns `false` (and logs) on
    /// serialization or storage failure — the caller keeps the form in
    /// memory and tells the operator the draft could not be saved.
    pub fn save_draft(&mut self, station: &str, report_date: &str, payload: &Value) -> bool {
        let now = self.clock.now();
        let envelope = DraftEnvelope {
            saved_at: now,
            expires_at: now + self.ttl,
            payload: payload.clone(),
        };

        let serialized = match serde_json::to_string(&envelope) {
            Ok(s) => s,
            Err(e) => {
                warn!(station, report_date, error = %e, "draft: serialize failed");
                return false;
            }
        };

        let key = Self::draft_key(station, report_date);
        match self.store.set(&key, &serialized) {
            Ok(()) => {
                debug!(station, report_date, "draft saved");
                true
            }
            Err(e) => {
                warn!(station, report_date, error = %e, "draft: write failed");
                false
            }
        }
    }

    // -- read ---------------------------------------------------------------

    /// Load the stored payload, or `None` when no live draft exists. An
    /// expired or corrupt entry is removed as a side effect.
    pub fn load_draft(&mut self, station: &str, report_date: &str) -> Option<Value> {
        let key = Self::draft_key(station, report_date);
        self.read_envelope(&key).map(|env| env.payload)
    }

    /// Metadata for the live draft, or `None`. Same expiry/purge semantics
    /// as [`load_draft`](Self::load_draft) without handing back the payload.
    pub fn get_draft_info(&mut self, station: &str, report_date: &str) -> Option<DraftInfo> {
        let key = Self::draft_key(station, report_date);
        let now = self.clock.now();
        self.read_envelope(&key).map(|env| draft_info(&env, now))
    }

    /// Whether a live draft exists for the pair.
    pub fn has_draft(&mut self, station: &str, report_date: &str) -> bool {
        self.get_draft_info(station, report_date).is_some()
    }

    // -- delete -------------------------------------------------------------

    /// Remove the draft for the pair. Idempotent — `true` even when nothing
    /// was stored. Called by the UI after a successful report submission.
    pub fn delete_draft(&mut self, station: &str, report_date: &str) -> bool {
        let key = Self::draft_key(station, report_date);
        self.store.remove(&key);
        debug!(station, report_date, "draft deleted");
        true
    }

    // -- sweep --------------------------------------------------------------

    /// Every live draft across all stations and dates, most recent first.
    /// Expired and corrupt entries encountered during the scan are purged.
    pub fn list_all_drafts(&mut self) -> Vec<DraftSummary> {
        let now = self.clock.now();
        let mut summaries = Vec::new();

        for key in self.store.keys_with_prefix(DRAFT_KEY_PREFIX) {
            let Some((station, report_date)) = parse_draft_key(&key) else {
                // Not one of ours (foreign key under the prefix) — leave it.
                continue;
            };
            if let Some(envelope) = self.read_envelope(&key) {
                summaries.push(DraftSummary {
                    station,
                    report_date,
                    info: draft_info(&envelope, now),
                });
            }
        }

        summaries.sort_by(|a, b| b.info.saved_at.cmp(&a.info.saved_at));
        summaries
    }

    /// Eagerly purge expired and corrupt entries (hygiene pass, e.g. at
    /// startup). Returns how many were removed.
    pub fn cleanup_expired_drafts(&mut self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;

        for key in self.store.keys_with_prefix(DRAFT_KEY_PREFIX) {
            if parse_draft_key(&key).is_none() {
                continue;
            }
            let Some(raw) = self.store.get(&key) else {
                continue;
            };
            let purge = match serde_json::from_str::<DraftEnvelope>(&raw) {
                Ok(envelope) => now > envelope.expires_at,
                Err(e) => {
                    warn!(key, error = %e, "draft: purging corrupt entry");
                    true
                }
            };
            if purge {
                self.store.remove(&key);
                removed += 1;
            }
        }

        if removed > 0 {
            info!(removed, "draft cleanup removed stale entries");
        }
        removed
    }

    // -- internal -----------------------------------------------------------

    /// Read and validate one envelope. Expired or unparseable entries are
    /// removed and reported as absent.
    fn read_envelope(&mut self, key: &str) -> Option<DraftEnvelope> {
        let raw = self.store.get(key)?;

        let envelope = match serde_json::from_str::<DraftEnvelope>(&raw) {
            Ok(env) => env,
            Err(e) => {
                warn!(key, error = %e, "draft: corrupt entry removed");
                self.store.remove(key);
                return None;
            }
        };

        if self.clock.now() > envelope.expires_at {
            debug!(key, "draft expired, removing");
            self.store.remove(key);
            return None;
        }

        Some(envelope)
    }
}

fn draft_info(envelope: &DraftEnvelope, now: DateTime<Utc>) -> DraftInfo {
    let remaining = envelope.expires_at - now;
    DraftInfo {
        saved_at: envelope.saved_at,
        expires_at: envelope.expires_at,
        hours_remaining: remaining.num_seconds() as f64 / 3600.0,
    }
}

/// Split a storage key back into `(station, reportDate)`.
///
/// Stations may themselves contain `-`, so the date is recovered as the
/// trailing `YYYY-MM-DD` token rather than by splitting on dashes. Keys that
/// don't fit the shape are not drafts and return `None`.
fn parse_draft_key(key: &str) -> Option<(String, String)> {
    let rest = key.strip_prefix(DRAFT_KEY_PREFIX)?;
    // station + "-" + YYYY-MM-DD needs at least 1 + 1 + 10 chars
    if rest.len() < 12 || !rest.is_char_boundary(rest.len() - 10) {
        return None;
    }
    let (head, date) = rest.split_at(rest.len() - 10);
    let station = head.strip_suffix('-')?;
    if station.is_empty() || NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
        return None;
    }
    Some((station.to_string(), date.to_string()))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;
    use chrono::TimeZone;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Shared-handle manual clock so tests can advance time after the store
    /// takes ownership of its copy.
    #[derive(Clone)]
    struct ManualClock(Rc<Cell<DateTime<Utc>>>);

    impl ManualClock {
        fn at(t: DateTime<Utc>) -> ManualClock {
            ManualClock(Rc::new(Cell::new(t)))
        }

        fn advance(&self, d: Duration) {
            self.0.set(self.0.get() + d);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.0.get()
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    fn test_store() -> (DraftStore<MemoryKv, ManualClock>, ManualClock) {
        let clock = ManualClock::at(t0());
        (DraftStore::with_clock(MemoryKv::new(), clock.clone()), clock)
    }

    fn sample_payload() -> Value {
        json!({
            "gasCash": 412.30,
            "groceryCash": 188.11,
            "lotteryNetSales": 75.00,
            "scratchOffSales": 42.50,
            "cashCollectionOnHand": 650.00,
            "cashExpenses": 35.75,
            "notes": "pump 3 was down until 10am",
        })
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let (mut drafts, _clock) = test_store();
        assert!(drafts.save_draft("station-12", "2025-06-01", &sample_payload()));

        let loaded = drafts.load_draft("station-12", "2025-06-01").unwrap();
        assert_eq!(loaded, sample_payload());
    }

    #[test]
    fn test_load_missing_is_none() {
        let (mut drafts, _clock) = test_store();
        assert!(drafts.load_draft("station-12", "2025-06-01").is_none());
        assert!(!drafts.has_draft("station-12", "2025-06-01"));
    }

    #[test]
    fn test_expired_draft_is_removed_on_load() {
        let (mut drafts, clock) = test_store();
        drafts.save_draft("station-12", "2025-06-01", &sample_payload());

        clock.advance(Duration::hours(12) + Duration::seconds(1));

        assert!(drafts.load_draft("station-12", "2025-06-01").is_none());
        // Removed as a side effect, not just filtered
        assert_eq!(drafts.store_mut().len(), 0);
        assert!(!drafts.has_draft("station-12", "2025-06-01"));
    }

    #[test]
    fn test_draft_live_just_before_expiry() {
        let (mut drafts, clock) = test_store();
        drafts.save_draft("station-12", "2025-06-01", &sample_payload());

        clock.advance(Duration::hours(12) - Duration::seconds(1));
        assert!(drafts.has_draft("station-12", "2025-06-01"));
    }

    #[test]
    fn test_resave_overwrites_and_resets_expiry() {
        let (mut drafts, clock) = test_store();
        drafts.save_draft("station-12", "2025-06-01", &json!({"v": 1}));

        clock.advance(Duration::hours(6));
        drafts.save_draft("station-12", "2025-06-01", &json!({"v": 2}));

        // Exactly one entry, holding the second payload
        assert_eq!(drafts.store_mut().len(), 1);
        let loaded = drafts.load_draft("station-12", "2025-06-01").unwrap();
        assert_eq!(loaded, json!({"v": 2}));

        // Timer was reset: 10 more hours is only 10h into the new TTL
        clock.advance(Duration::hours(10));
        assert!(drafts.has_draft("station-12", "2025-06-01"));
        let info = drafts.get_draft_info("station-12", "2025-06-01").unwrap();
        assert!((info.hours_remaining - 2.0).abs() < 0.01);
    }

    #[test]
    fn test_draft_info_without_payload() {
        let (mut drafts, clock) = test_store();
        drafts.save_draft("station-12", "2025-06-01", &sample_payload());

        clock.advance(Duration::hours(3));
        let info = drafts.get_draft_info("station-12", "2025-06-01").unwrap();
        assert_eq!(info.saved_at, t0());
        assert_eq!(info.expires_at, t0() + Duration::hours(12));
        assert!((info.hours_remaining - 9.0).abs() < 0.01);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (mut drafts, _clock) = test_store();
        drafts.save_draft("station-12", "2025-06-01", &sample_payload());

        assert!(drafts.delete_draft("station-12", "2025-06-01"));
        assert!(!drafts.has_draft("station-12", "2025-06-01"));
        // Nothing stored — still true
        assert!(drafts.delete_draft("station-12", "2025-06-01"));
    }

    #[test]
    fn test_drafts_are_isolated_per_station_and_date() {
        let (mut drafts, _clock) = test_store();
        drafts.save_draft("station-a", "2025-06-01", &json!({"which": "a1"}));
        drafts.save_draft("station-b", "2025-06-01", &json!({"which": "b1"}));
        drafts.save_draft("station-a", "2025-06-02", &json!({"which": "a2"}));

        drafts.delete_draft("station-a", "2025-06-01");

        assert!(!drafts.has_draft("station-a", "2025-06-01"));
        assert_eq!(
            drafts.load_draft("station-b", "2025-06-01").unwrap(),
            json!({"which": "b1"})
        );
        assert_eq!(
            drafts.load_draft("station-a", "2025-06-02").unwrap(),
            json!({"which": "a2"})
        );
    }

    #[test]
    fn test_corrupt_entry_purged_silently() {
        let (mut drafts, _clock) = test_store();
        let key = DraftStore::<MemoryKv>::draft_key("station-12", "2025-06-01");
        drafts.store_mut().set(&key, "{not json at all").unwrap();

        assert!(drafts.load_draft("station-12", "2025-06-01").is_none());
        assert_eq!(drafts.store_mut().len(), 0, "corrupt entry was removed");
    }

    #[test]
    fn test_list_all_drafts_sorted_most_recent_first() {
        let (mut drafts, clock) = test_store();
        drafts.save_draft("station-a", "2025-06-01", &json!({}));
        clock.advance(Duration::hours(1));
        drafts.save_draft("station-b", "2025-06-01", &json!({}));
        clock.advance(Duration::hours(1));
        drafts.save_draft("station-a", "2025-06-02", &json!({}));

        let listing = drafts.list_all_drafts();
        assert_eq!(listing.len(), 3);
        assert_eq!(listing[0].station, "station-a");
        assert_eq!(listing[0].report_date, "2025-06-02");
        assert_eq!(listing[1].station, "station-b");
        assert_eq!(listing[2].report_date, "2025-06-01");
    }

    #[test]
    fn test_list_skips_and_purges_expired_and_corrupt() {
        let (mut drafts, clock) = test_store();
        drafts.save_draft("station-old", "2025-06-01", &json!({}));
        clock.advance(Duration::hours(13));
        drafts.save_draft("station-new", "2025-06-02", &json!({}));

        let bad_key = DraftStore::<MemoryKv>::draft_key("station-bad", "2025-06-02");
        drafts.store_mut().set(&bad_key, "garbage").unwrap();
        // A non-draft key under the prefix must be left alone
        drafts
            .store_mut()
            .set("sales-report-draft-index", "[]")
            .unwrap();

        let listing = drafts.list_all_drafts();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].station, "station-new");
        // expired + corrupt purged; live draft + foreign key remain
        assert_eq!(drafts.store_mut().len(), 2);
    }

    #[test]
    fn test_cleanup_counts_removals() {
        let (mut drafts, clock) = test_store();
        drafts.save_draft("station-a", "2025-06-01", &json!({}));
        drafts.save_draft("station-b", "2025-06-01", &json!({}));
        clock.advance(Duration::hours(13));
        drafts.save_draft("station-c", "2025-06-02", &json!({}));

        let bad_key = DraftStore::<MemoryKv>::draft_key("station-d", "2025-06-02");
        drafts.store_mut().set(&bad_key, "][").unwrap();

        assert_eq!(drafts.cleanup_expired_drafts(), 3);
        assert_eq!(drafts.cleanup_expired_drafts(), 0);
        assert!(drafts.has_draft("station-c", "2025-06-02"));
    }

    #[test]
    fn test_custom_ttl() {
        let clock = ManualClock::at(t0());
        let mut drafts = DraftStore::with_clock(MemoryKv::new(), clock.clone())
            .with_ttl(Duration::hours(1));
        drafts.save_draft("station-12", "2025-06-01", &json!({}));

        clock.advance(Duration::minutes(61));
        assert!(!drafts.has_draft("station-12", "2025-06-01"));
    }

    #[test]
    fn test_save_failure_returns_false() {
        /// Backend that accepts nothing (full quota).
        struct FullKv;
        impl KvStore for FullKv {
            fn get(&self, _key: &str) -> Option<String> {
                None
            }
            fn set(&mut self, _key: &str, _value: &str) -> Result<(), String> {
                Err("quota exceeded".into())
            }
            fn remove(&mut self, _key: &str) {}
            fn keys(&self) -> Vec<String> {
                Vec::new()
            }
            fn len(&self) -> usize {
                0
            }
        }

        // Surface the warn-level log this path emits when running with
        // RUST_LOG set; harmless if another test already installed one.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();

        let mut drafts = DraftStore::new(FullKv);
        assert!(!drafts.save_draft("station-12", "2025-06-01", &sample_payload()));
    }

    #[test]
    fn test_parse_draft_key_handles_dashed_stations() {
        assert_eq!(
            parse_draft_key("sales-report-draft-north-hwy-7-2025-06-01"),
            Some(("north-hwy-7".to_string(), "2025-06-01".to_string()))
        );
        assert_eq!(
            parse_draft_key("sales-report-draft-s1-2025-06-01"),
            Some(("s1".to_string(), "2025-06-01".to_string()))
        );
        assert_eq!(parse_draft_key("sales-report-draft-2025-06-01"), None);
        assert_eq!(parse_draft_key("sales-report-draft-s1-not-a-date!"), None);
        assert_eq!(parse_draft_key("unrelated-key"), None);
    }

    #[test]
    fn test_sqlite_backed_store() {
        let clock = ManualClock::at(t0());
        let store = crate::kv::SqliteKv::open_in_memory().unwrap();
        let mut drafts = DraftStore::with_clock(store, clock.clone());

        drafts.save_draft("station-12", "2025-06-01", &sample_payload());
        assert_eq!(
            drafts.load_draft("station-12", "2025-06-01").unwrap(),
            sample_payload()
        );

        clock.advance(Duration::hours(13));
        assert_eq!(drafts.cleanup_expired_drafts(), 1);
        assert!(drafts.store_mut().is_empty());
    }
}
