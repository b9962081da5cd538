//! Open Session Table

use crate::error::SessionError;
use crate::session::{ReadSession, SessionKind};
use metrics::{counter, gauge};
use ring_buffer::{Presenter, RingStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};
use uuid::Uuid;

/// Handle returned when a session is opened
pub type SessionId = Uuid;

type SessionSlot = Arc<Mutex<ReadSession>>;

/// Called before every open so the producer can refresh a stale latest sample
pub type RefreshHook = Arc<dyn Fn() + Send + Sync>;

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Consumer-facing entry point: open, read, reset and close sessions.
///
/// Each session sits behind its own lock, so reads on different sessions only
/// contend on the ring's short critical section.
pub struct SessionTable {
    store: Arc<RingStore>,
    presenter: Arc<dyn Presenter>,
    sessions: Mutex<HashMap<SessionId, SessionSlot>>,
    refresh: Option<RefreshHook>,
}

impl SessionTable {
    pub fn new(store: Arc<RingStore>, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            store,
            presenter,
            sessions: Mutex::new(HashMap::new()),
            refresh: None,
        }
    }

    /// Run `hook` at the start of every open
    pub fn with_refresh(mut self, hook: RefreshHook) -> Self {
        self.refresh = Some(hook);
        self
    }

    /// Shared sample ring
    pub fn store(&self) -> &Arc<RingStore> {
        &self.store
    }

    /// Open a session of `kind`. The refresh hook, if any, runs first so a
    /// latest-only reader sees a sample no older than the sampling interval.
    pub fn open(&self, kind: SessionKind) -> SessionId {
        if let Some(refresh) = &self.refresh {
            refresh();
        }
        let id = Uuid::new_v4();
        let session = ReadSession::open(kind, self.store.clone());
        let open = {
            let mut sessions = relock(&self.sessions);
            sessions.insert(id, Arc::new(Mutex::new(session)));
            sessions.len()
        };
        gauge!("sessions_open").set(open as f64);
        info!("Opened {} session {}", kind.as_str(), id);
        id
    }

    pub fn open_latest(&self) -> SessionId {
        self.open(SessionKind::Latest)
    }

    pub fn open_full(&self) -> SessionId {
        self.open(SessionKind::FullDrain)
    }

    fn session(&self, id: &SessionId) -> Result<SessionSlot, SessionError> {
        relock(&self.sessions)
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownSession(id.to_string()))
    }

    /// Read at most one formatted sample into a buffer of `max_bytes`.
    ///
    /// Returns `Ok(None)` when the session has nothing to deliver. A buffer
    /// smaller than the presenter's worst case is rejected without consuming
    /// anything.
    pub fn read(
        &self,
        id: &SessionId,
        max_bytes: usize,
    ) -> Result<Option<Vec<u8>>, SessionError> {
        let required = self.presenter.max_len();
        if max_bytes < required {
            return Err(SessionError::BufferTooSmall {
                required,
                available: max_bytes,
            });
        }

        let slot = self.session(id)?;
        let (kind, record) = {
            let mut session = relock(&slot);
            (session.kind(), session.read())
        };

        let Some(record) = record else {
            debug!("Session {} has no sample to deliver", id);
            return Ok(None);
        };

        counter!("session_reads_total", "kind" => kind.as_str()).increment(1);
        let bytes = self.presenter.present(&record)?;
        debug!("Session {} read {} bytes", id, bytes.len());
        Ok(Some(bytes))
    }

    /// Put a session back into its just-opened state
    pub fn reset(&self, id: &SessionId) -> Result<(), SessionError> {
        let slot = self.session(id)?;
        relock(&slot).reset();
        debug!("Session {} reset", id);
        Ok(())
    }

    pub fn close(&self, id: &SessionId) -> Result<(), SessionError> {
        let (removed, open) = {
            let mut sessions = relock(&self.sessions);
            (sessions.remove(id), sessions.len())
        };
        if removed.is_none() {
            return Err(SessionError::UnknownSession(id.to_string()));
        }
        gauge!("sessions_open").set(open as f64);
        info!("Closed session {}", id);
        Ok(())
    }

    /// Kind of an open session
    pub fn kind(&self, id: &SessionId) -> Result<SessionKind, SessionError> {
        let slot = self.session(id)?;
        let kind = relock(&slot).kind();
        Ok(kind)
    }

    /// Number of open sessions
    pub fn open_count(&self) -> usize {
        relock(&self.sessions).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring_buffer::{LinePresenter, SampleRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn table(capacity: usize) -> SessionTable {
        let store = Arc::new(RingStore::new(capacity).unwrap());
        SessionTable::new(store, Arc::new(LinePresenter))
    }

    fn sample(ts: u64) -> SampleRecord {
        SampleRecord {
            timestamp_ms: ts,
            gyro_x: 1,
            gyro_y: 2,
            gyro_z: 3,
            accel_x: 4,
            accel_y: 5,
            accel_z: 6,
            temperature: 30,
        }
    }

    fn read_line(table: &SessionTable, id: &SessionId) -> Option<String> {
        table
            .read(id, 256)
            .unwrap()
            .map(|bytes| String::from_utf8(bytes).unwrap())
    }

    #[test]
    fn test_latest_session_lines() {
        let table = table(2);
        table.store().produce(sample(100));

        let id = table.open_latest();
        assert_eq!(
            read_line(&table, &id).as_deref(),
            Some("100: gyro=1:2:3 acc=4:5:6\n")
        );
        assert_eq!(read_line(&table, &id), None);

        table.store().produce(sample(200));
        assert_eq!(read_line(&table, &id), None);

        table.reset(&id).unwrap();
        assert!(read_line(&table, &id).unwrap().starts_with("200:"));
    }

    #[test]
    fn test_full_session_lines() {
        let table = table(3);
        for ts in 1..=4 {
            table.store().produce(sample(ts));
        }

        let id = table.open_full();
        let lines: Vec<String> = std::iter::from_fn(|| read_line(&table, &id)).collect();
        let stamps: Vec<&str> = lines.iter().map(|l| l.split(':').next().unwrap()).collect();
        assert_eq!(stamps, vec!["2", "3", "4"]);
    }

    #[test]
    fn test_small_buffer_does_not_consume() {
        let table = table(2);
        table.store().produce(sample(1));
        let id = table.open_latest();

        let err = table.read(&id, 8).unwrap_err();
        assert_eq!(
            err,
            SessionError::BufferTooSmall {
                required: LinePresenter::MAX_LEN,
                available: 8,
            }
        );
        assert!(read_line(&table, &id).is_some());
    }

    #[test]
    fn test_close_and_unknown_session() {
        let table = table(2);
        let id = table.open_full();
        assert_eq!(table.kind(&id).unwrap(), SessionKind::FullDrain);
        assert_eq!(table.open_count(), 1);

        table.close(&id).unwrap();
        assert_eq!(table.open_count(), 0);
        assert!(matches!(table.read(&id, 256), Err(SessionError::UnknownSession(_))));
        assert!(table.close(&id).is_err());
        assert!(table.reset(&id).is_err());
    }

    #[test]
    fn test_open_runs_refresh_before_session_starts() {
        let store = Arc::new(RingStore::new(4).unwrap());
        store.produce(sample(0));
        let calls = Arc::new(AtomicUsize::new(0));

        let hook_store = store.clone();
        let hook_calls = calls.clone();
        let table = SessionTable::new(store, Arc::new(LinePresenter)).with_refresh(Arc::new(
            move || {
                let n = hook_calls.fetch_add(1, Ordering::SeqCst) as u64;
                hook_store.produce(sample(1000 * (n + 1)));
            },
        ));

        let id = table.open_latest();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(read_line(&table, &id).unwrap().starts_with("1000:"));

        let id = table.open_full();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let lines: Vec<String> = std::iter::from_fn(|| read_line(&table, &id)).collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("2000:"));
    }

    #[test]
    fn test_concurrent_sessions() {
        let table = Arc::new(table(8));
        for ts in 1..=8 {
            table.store().produce(sample(ts));
        }

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let table = table.clone();
                thread::spawn(move || {
                    let id = table.open_full();
                    let mut count = 0;
                    while table.read(&id, 256).unwrap().is_some() {
                        count += 1;
                    }
                    table.close(&id).unwrap();
                    count
                })
            })
            .collect();

        for handle in readers {
            assert_eq!(handle.join().unwrap(), 8);
        }
        assert_eq!(table.open_count(), 0);
    }
}
