//! Per-session operation guard.
//!
//! At most one operation of a given kind may be in flight per session;
//! operations of different kinds do not block each other. Entries expire
//! after a per-kind timeout and are reaped on the next conflicting attempt
//! instead of blocking forever; there is no bypass path around the guard.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Kinds of guarded session operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Message send and response generation.
    MessageSend,
    /// Session rename or dashboard reattachment.
    SessionUpdate,
    /// Session deletion.
    SessionDelete,
}

impl OperationKind {
    /// Returns the timeout after which a stale entry may be reaped.
    pub fn timeout(&self) -> Duration {
        match self {
            // Generation can legitimately take a while
            Self::MessageSend => Duration::from_secs(20),
            Self::SessionUpdate => Duration::from_secs(5),
            Self::SessionDelete => Duration::from_secs(10),
        }
    }
}

struct ActiveOperation {
    started: Instant,
    timeout: Duration,
    token: CancellationToken,
}

impl ActiveOperation {
    fn is_expired(&self) -> bool {
        self.started.elapsed() > self.timeout
    }
}

/// Registry of in-flight operations, keyed by session and kind.
#[derive(Clone, Default)]
pub struct SessionGuard {
    inner: Arc<Mutex<HashMap<(Uuid, OperationKind), ActiveOperation>>>,
}

/// A granted operation slot.
///
/// Dropping the permit releases the slot. The embedded token is cancelled
/// when another caller explicitly cancels this session's operations; work
/// started under the permit should select against it.
pub struct OperationPermit {
    guard: SessionGuard,
    key: (Uuid, OperationKind),
    /// Cancellation scope for this operation only.
    pub token: CancellationToken,
}

impl Drop for OperationPermit {
    fn drop(&mut self) {
        self.guard.release(self.key);
    }
}

impl SessionGuard {
    /// Creates an empty guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot for an operation kind on a session.
    ///
    /// Fails when a live operation of the same kind holds the slot; a
    /// stale entry past its timeout is cancelled, reaped, and replaced.
    pub fn begin(
        &self,
        session_id: Uuid,
        kind: OperationKind,
    ) -> Result<OperationPermit, OperationKind> {
        self.begin_with_timeout(session_id, kind, kind.timeout())
    }

    fn begin_with_timeout(
        &self,
        session_id: Uuid,
        kind: OperationKind,
        timeout: Duration,
    ) -> Result<OperationPermit, OperationKind> {
        let key = (session_id, kind);
        let mut active = self.inner.lock().expect("guard lock poisoned");

        if let Some(existing) = active.get(&key) {
            if !existing.is_expired() {
                return Err(kind);
            }

            existing.token.cancel();
        }

        let token = CancellationToken::new();
        active.insert(
            key,
            ActiveOperation {
                started: Instant::now(),
                timeout,
                token: token.clone(),
            },
        );

        Ok(OperationPermit {
            guard: self.clone(),
            key,
            token,
        })
    }

    /// Cancels every in-flight operation on a session.
    ///
    /// Cancellation is scoped to that session; operations on other
    /// sessions are unaffected.
    pub fn cancel(&self, session_id: Uuid) {
        let active = self.inner.lock().expect("guard lock poisoned");

        for ((session, _), operation) in active.iter() {
            if *session == session_id {
                operation.token.cancel();
            }
        }
    }

    fn release(&self, key: (Uuid, OperationKind)) {
        let mut active = self.inner.lock().expect("guard lock poisoned");
        active.remove(&key);
    }
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let active = self.inner.lock().expect("guard lock poisoned");
        f.debug_struct("SessionGuard")
            .field("active_operations", &active.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_kind_conflicts() {
        let guard = SessionGuard::new();
        let session = Uuid::new_v4();

        let _permit = guard.begin(session, OperationKind::MessageSend).unwrap();
        let conflict = guard.begin(session, OperationKind::MessageSend);

        assert_eq!(conflict.err(), Some(OperationKind::MessageSend));
    }

    #[test]
    fn test_different_kinds_do_not_conflict() {
        let guard = SessionGuard::new();
        let session = Uuid::new_v4();

        let send = guard.begin(session, OperationKind::MessageSend).unwrap();
        let update = guard.begin(session, OperationKind::SessionUpdate);

        assert!(update.is_ok());
        assert!(!send.token.is_cancelled());
    }

    #[test]
    fn test_permit_drop_releases_slot() {
        let guard = SessionGuard::new();
        let session = Uuid::new_v4();

        let permit = guard.begin(session, OperationKind::MessageSend).unwrap();
        drop(permit);

        assert!(guard.begin(session, OperationKind::MessageSend).is_ok());
    }

    #[test]
    fn test_sessions_are_independent() {
        let guard = SessionGuard::new();

        let _a = guard
            .begin(Uuid::new_v4(), OperationKind::MessageSend)
            .unwrap();
        assert!(
            guard
                .begin(Uuid::new_v4(), OperationKind::MessageSend)
                .is_ok()
        );
    }

    #[test]
    fn test_expired_entry_is_reaped() {
        let guard = SessionGuard::new();
        let session = Uuid::new_v4();

        let stale = guard
            .begin_with_timeout(session, OperationKind::MessageSend, Duration::ZERO)
            .unwrap();
        let stale_token = stale.token.clone();
        // Keep the permit alive so only expiry, not release, frees the slot
        std::mem::forget(stale);

        let fresh = guard.begin(session, OperationKind::MessageSend);
        assert!(fresh.is_ok());
        assert!(stale_token.is_cancelled());
    }

    #[test]
    fn test_cancel_scopes_to_one_session() {
        let guard = SessionGuard::new();
        let session_a = Uuid::new_v4();
        let session_b = Uuid::new_v4();

        let permit_a = guard.begin(session_a, OperationKind::MessageSend).unwrap();
        let permit_b = guard.begin(session_b, OperationKind::MessageSend).unwrap();

        guard.cancel(session_a);

        assert!(permit_a.token.is_cancelled());
        assert!(!permit_b.token.is_cancelled());
    }
}
