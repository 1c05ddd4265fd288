//! The in-memory Entry Store for the active session.

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::{self, MonthCalendar};
use crate::session::SessionContext;
use crate::{CycleEntry, CycleStatistics, Flow, NewCycleEntry, PadPalsError, StorefrontClient};

/// Where the current entries came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    Remote,
    Placeholder,
    Local,
}

/// Identifies one fetch. Results carrying an older ticket are stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

#[derive(Clone, Debug)]
pub struct Fetched {
    pub entries: Vec<CycleEntry>,
    pub source: EntrySource,
}

#[derive(Clone, Debug)]
pub struct EntryStore {
    entries: Vec<CycleEntry>,
    source: EntrySource,
    generation: u64,
}

impl Default for EntryStore {
    fn default() -> Self {
        Self::placeholder()
    }
}

/// Sample history shown to guests and when the tracker API is unreachable.
pub fn placeholder_entries() -> Vec<CycleEntry> {
    let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day);
    [
        (d(2025, 1, 5), d(2025, 1, 10), Flow::Medium),
        (d(2025, 2, 2), d(2025, 2, 7), Flow::Heavy),
    ]
    .into_iter()
    .filter_map(|(start, end, flow)| Some(CycleEntry::new(start?, end, flow)))
    .collect()
}

/// Fetch the entries a session should see. Guests get the placeholder; a
/// failed fetch also falls back to it.
pub async fn fetch_for_session(client: &dyn StorefrontClient, session: &SessionContext) -> Fetched {
    let Some(user_id) = session.user_id() else {
        return Fetched {
            entries: placeholder_entries(),
            source: EntrySource::Placeholder,
        };
    };
    match client.get_tracker_entries(user_id).await {
        Ok(entries) => Fetched {
            entries,
            source: EntrySource::Remote,
        },
        Err(e) => {
            tracing::warn!(user_id, error = %e, "tracker fetch failed; showing placeholder entries");
            Fetched {
                entries: placeholder_entries(),
                source: EntrySource::Placeholder,
            }
        }
    }
}

/// Send an entry to the tracker service when the session is signed in.
/// Returns `false` for guests, whose entries never leave the process.
pub async fn persist_remote(
    client: &dyn StorefrontClient,
    session: &SessionContext,
    entry: &CycleEntry,
) -> Result<bool, PadPalsError> {
    let Some(user_id) = session.user_id() else {
        return Ok(false);
    };
    client.log_tracker_entry(user_id, entry).await?;
    tracing::info!(user_id, start = %entry.start_date, "logged cycle entry");
    Ok(true)
}

impl EntryStore {
    pub fn placeholder() -> Self {
        Self {
            entries: placeholder_entries(),
            source: EntrySource::Placeholder,
            generation: 0,
        }
    }

    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            source: EntrySource::Local,
            generation: 0,
        }
    }

    pub fn entries(&self) -> &[CycleEntry] {
        &self.entries
    }

    pub fn source(&self) -> EntrySource {
        self.source
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.generation += 1;
        RefreshTicket(self.generation)
    }

    /// Install fetched entries unless a newer refresh has started since.
    pub fn apply_refresh(&mut self, ticket: RefreshTicket, fetched: Fetched) -> bool {
        if ticket.0 != self.generation {
            tracing::debug!(
                ticket = ticket.0,
                current = self.generation,
                "discarding stale tracker fetch"
            );
            return false;
        }
        self.entries = fetched.entries;
        self.source = fetched.source;
        true
    }

    pub async fn load(&mut self, client: &dyn StorefrontClient, session: &SessionContext) {
        let ticket = self.begin_refresh();
        let fetched = fetch_for_session(client, session).await;
        self.apply_refresh(ticket, fetched);
    }

    /// Validate and store a new entry. Signed-in users persist it remotely and
    /// reload; guests keep it in memory only.
    pub async fn record(
        &mut self,
        client: &dyn StorefrontClient,
        session: &SessionContext,
        new_entry: &NewCycleEntry,
    ) -> Result<CycleEntry, PadPalsError> {
        let entry = new_entry.validate()?;
        if persist_remote(client, session, &entry).await? {
            self.load(client, session).await;
        } else {
            self.push_local(entry.clone());
        }
        Ok(entry)
    }

    /// Keep an entry in memory only; the next refresh replaces it.
    pub fn push_local(&mut self, entry: CycleEntry) {
        self.entries.push(entry);
        self.source = EntrySource::Local;
    }

    pub fn statistics(&self) -> CycleStatistics {
        CycleStatistics::compute(&self.entries)
    }

    pub fn calendar(&self, year: i32, month: u32) -> Result<MonthCalendar, PadPalsError> {
        calendar::project_month(year, month, &self.entries, &self.statistics())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DayState;
    use crate::session::UserSession;
    use crate::test_utils::FakeStorefront;

    fn signed_in() -> SessionContext {
        SessionContext::signed_in(UserSession {
            id: "u1".into(),
            name: "A".into(),
            email: "a@example.com".into(),
            is_admin: false,
            is_super_admin: false,
        })
    }

    fn new_entry(start: &str, end: &str) -> NewCycleEntry {
        NewCycleEntry {
            start_date: start.into(),
            end_date: Some(end.into()),
            flow: Flow::Light,
        }
    }

    #[tokio::test]
    async fn guest_sees_placeholder() {
        let mut store = EntryStore::empty();
        store.load(&FakeStorefront::default(), &SessionContext::guest()).await;
        assert_eq!(store.source(), EntrySource::Placeholder);
        assert_eq!(store.entries().len(), 2);
        assert_eq!(
            store.statistics().predicted_next_start,
            NaiveDate::from_ymd_opt(2025, 3, 2)
        );
    }

    #[tokio::test]
    async fn failed_fetch_falls_back_to_placeholder() {
        let client = FakeStorefront {
            fail_reads: true,
            ..Default::default()
        };
        let mut store = EntryStore::empty();
        store.load(&client, &signed_in()).await;
        assert_eq!(store.source(), EntrySource::Placeholder);
        assert_eq!(store.entries(), placeholder_entries().as_slice());
    }

    #[tokio::test]
    async fn signed_in_record_persists_and_reloads() {
        let client = FakeStorefront::default();
        let session = signed_in();
        let mut store = EntryStore::empty();
        store.load(&client, &session).await;
        assert!(store.entries().is_empty());

        store
            .record(&client, &session, &new_entry("2025-04-01", "2025-04-05"))
            .await
            .expect("record");
        assert_eq!(client.remote.lock().unwrap().len(), 1);
        assert_eq!(store.source(), EntrySource::Remote);
        assert_eq!(store.entries().len(), 1);
        assert_eq!(store.statistics().average_flow_length, 5);
    }

    #[tokio::test]
    async fn guest_record_stays_local() {
        let client = FakeStorefront::default();
        let mut store = EntryStore::placeholder();
        store
            .record(&client, &SessionContext::guest(), &new_entry("2025-03-02", "2025-03-06"))
            .await
            .expect("record");
        assert!(client.remote.lock().unwrap().is_empty());
        assert_eq!(store.entries().len(), 3);
        assert_eq!(store.source(), EntrySource::Local);
        let cal = store.calendar(2025, 3).expect("calendar");
        assert_eq!(
            cal.day(2).unwrap().state,
            DayState::Logged { flow: Flow::Light }
        );
    }

    #[tokio::test]
    async fn invalid_entry_is_rejected_before_any_call() {
        let client = FakeStorefront::default();
        let mut store = EntryStore::empty();
        let res = store
            .record(&client, &signed_in(), &new_entry("2025-04-05", "2025-04-01"))
            .await;
        assert!(matches!(res, Err(PadPalsError::InvalidInput(_))));
        assert!(client.remote.lock().unwrap().is_empty());
    }

    #[test]
    fn stale_refresh_is_discarded() {
        let mut store = EntryStore::empty();
        let old = store.begin_refresh();
        let newer = store.begin_refresh();
        let stale = Fetched {
            entries: placeholder_entries(),
            source: EntrySource::Placeholder,
        };
        assert!(!store.apply_refresh(old, stale));
        assert!(store.entries().is_empty());
        let fresh = Fetched {
            entries: vec![],
            source: EntrySource::Remote,
        };
        assert!(store.apply_refresh(newer, fresh));
        assert_eq!(store.source(), EntrySource::Remote);
    }
}
