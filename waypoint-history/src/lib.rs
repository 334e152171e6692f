mod error;
mod models;
mod record;
mod repository;
pub mod snapshot;

pub use error::{HistoryError, Result};
pub use models::{DayKey, DayMap, Sample, day_key, normalize_identity, parse_day};
pub use record::{IDENTITY_FIELD, Observation, Skip};
pub use repository::{HistoryRepository, JsonFileRepository, MemoryRepository, is_safe_file_stem};

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Display;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local, NaiveTime, TimeDelta, TimeZone, Utc};
use serde_json::Value;
use tracing::{debug, error, info, warn};

/// Day buckets older than this (measured from the bucket's UTC midnight) are swept.
pub const RETENTION_SECS: i64 = 7 * 24 * 60 * 60;

/// Minimum time between two flushing cycles.
pub const FLUSH_INTERVAL_SECS: i64 = 5 * 60;

/// Identity -> day map, for one server scope.
type ServerHistory = HashMap<String, DayMap>;

struct Table {
  servers: HashMap<String, ServerHistory>,
  /// Start of the last cycle that flushed, shared by every scope.
  last_flush: DateTime<Utc>,
}

/// Rolling per-day position history for the players currently online.
///
/// Only identities seen in a server's latest cycle stay in memory. Everything
/// else lives in the repository and is loaded back on first sight.
pub struct HistoryStore<R> {
  repository: R,
  table: Mutex<Table>,
}

impl<R: HistoryRepository> HistoryStore<R> {
  pub fn new(repository: R) -> Self {
    Self {
      repository,
      table: Mutex::new(Table {
        servers: HashMap::new(),
        last_flush: DateTime::UNIX_EPOCH,
      }),
    }
  }

  pub fn repository(&self) -> &R {
    &self.repository
  }

  fn table(&self) -> MutexGuard<'_, Table> {
    // Ingestion keeps going after a panic in another cycle.
    self.table.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Record one polling cycle for `scope`, timestamped with the local clock.
  pub fn ingest(&self, records: &[Value], scope: &str) {
    self.ingest_at(records, scope, Local::now());
  }

  /// Record one polling cycle for `scope` as of `now`.
  ///
  /// Samples land in the day bucket of `now` in its own time zone. Touched
  /// identities are swept and, when the flush interval has passed, written to
  /// the repository. Identities of this scope missing from the cycle are
  /// dropped from memory. Never fails; bad records and I/O errors are logged.
  pub fn ingest_at<Tz>(&self, records: &[Value], scope: &str, now: DateTime<Tz>)
  where
    Tz: TimeZone,
    Tz::Offset: Display,
  {
    let day = day_key(&now);
    let unix = now.timestamp();
    let now = now.with_timezone(&Utc);

    let observations: Vec<Observation> = records
      .iter()
      .enumerate()
      .filter_map(|(index, record)| match Observation::from_record(record) {
        Ok(observation) => Some(observation),
        Err(skip) => {
          debug!(server = %scope, index, reason = skip.as_str(), "skipped record");
          None
        }
      })
      .collect();

    // Cold identities are read from disk without holding the table lock.
    let missing: Vec<String> = {
      let mut table = self.table();
      let server = table.servers.entry(scope.to_string()).or_insert_with(|| {
        info!(server = %scope, "tracking new server");
        ServerHistory::new()
      });

      let mut seen = HashSet::new();
      observations
        .iter()
        .map(|o| o.identity.as_str())
        .filter(|identity| !server.contains_key(*identity) && seen.insert(*identity))
        .map(str::to_string)
        .collect()
    };
    let loaded: Vec<(String, DayMap)> = missing
      .into_iter()
      .map(|identity| {
        let days = self.load(&identity);
        (identity, days)
      })
      .collect();

    let mut pending: Vec<(String, DayMap)> = Vec::new();
    {
      let mut table = self.table();
      let flush_due = now - table.last_flush > TimeDelta::seconds(FLUSH_INTERVAL_SECS);
      let server = table.servers.entry(scope.to_string()).or_default();

      for (identity, days) in loaded {
        server.entry(identity).or_insert(days);
      }

      let mut touched = BTreeSet::new();
      for observation in &observations {
        let identity = observation.identity.as_str();
        if !server.contains_key(identity) {
          // Evicted by an overlapping cycle since the load above.
          let days = self.load(identity);
          server.insert(identity.to_string(), days);
        }
        if let Some(days) = server.get_mut(identity) {
          days.entry(day).or_default().push(Sample {
            x: observation.x,
            y: observation.y,
            z: observation.z,
            time: unix,
          });
        }
        touched.insert(identity);
      }

      for identity in &touched {
        let Some(days) = server.get_mut(*identity) else {
          continue;
        };
        let swept = sweep(days, now);
        if swept > 0 {
          debug!(server = %scope, %identity, swept, "dropped expired days");
        }
        if flush_due {
          pending.push((identity.to_string(), days.clone()));
        }
      }

      let before = server.len();
      server.retain(|identity, _| touched.contains(identity.as_str()));
      let evicted = before - server.len();
      if evicted > 0 {
        debug!(server = %scope, evicted, "evicted offline identities");
      }

      if !pending.is_empty() {
        table.last_flush = now;
      }
    }

    if !pending.is_empty() {
      let written = self.save_all(&pending);
      debug!(server = %scope, written, total = pending.len(), "flushed history");
    }
  }

  /// Write every resident identity of every scope, regardless of the flush interval.
  /// Returns how many writes succeeded.
  pub fn flush_all(&self) -> usize {
    let pending: Vec<(String, DayMap)> = {
      let table = self.table();
      table
        .servers
        .values()
        .flat_map(|server| server.iter().map(|(id, days)| (id.clone(), days.clone())))
        .collect()
    };

    let written = self.save_all(&pending);
    info!(written, total = pending.len(), "flushed all resident history");
    written
  }

  /// Copy of the resident day map for a normalized identity.
  pub fn history(&self, scope: &str, identity: &str) -> Option<DayMap> {
    self
      .table()
      .servers
      .get(scope)
      .and_then(|server| server.get(identity))
      .cloned()
  }

  /// Identities currently held in memory for a scope, sorted.
  pub fn resident_identities(&self, scope: &str) -> Vec<String> {
    let mut identities: Vec<String> = self
      .table()
      .servers
      .get(scope)
      .map(|server| server.keys().cloned().collect())
      .unwrap_or_default();
    identities.sort();
    identities
  }

  /// Every scope ingested since start, sorted.
  pub fn server_scopes(&self) -> Vec<String> {
    let mut scopes: Vec<String> = self.table().servers.keys().cloned().collect();
    scopes.sort();
    scopes
  }

  fn load(&self, identity: &str) -> DayMap {
    match self.repository.load(identity) {
      Ok(days) => days,
      Err(err) => {
        warn!(%identity, %err, "unreadable history, starting empty");
        DayMap::new()
      }
    }
  }

  fn save_all(&self, pending: &[(String, DayMap)]) -> usize {
    let mut written = 0;
    for (identity, days) in pending {
      match self.repository.save(identity, days) {
        Ok(()) => written += 1,
        Err(err) => error!(%identity, %err, "failed to write history"),
      }
    }
    written
  }
}

/// Drop day buckets more than the retention window before `now`. Unparseable keys go too.
fn sweep(days: &mut DayMap, now: DateTime<Utc>) -> usize {
  let retention = TimeDelta::seconds(RETENTION_SECS);
  let before = days.len();
  days.retain(|key, _| match parse_day(key) {
    Some(date) => now - date.and_time(NaiveTime::MIN).and_utc() <= retention,
    None => false,
  });
  before - days.len()
}
