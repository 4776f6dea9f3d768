//! In-memory proposal session store.
//!
//! Sessions expire `ttl` after their last access and the least recently used
//! session is evicted once `capacity` is reached. The lock guards map
//! operations only and is never held across an `.await`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;
use uuid::Uuid;

use crate::editing::models::ProposalSession;

#[derive(Debug)]
struct StoredSession {
    session: Arc<ProposalSession>,
    last_access: Instant,
}

#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    capacity: usize,
    sessions: Mutex<HashMap<Uuid, StoredSession>>,
}

impl SessionStore {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, session: ProposalSession) -> Arc<ProposalSession> {
        self.insert_at(session, Instant::now())
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<ProposalSession>> {
        self.get_at(id, Instant::now())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    // A panic while the lock was held cannot leave the map half-updated.
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, StoredSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, stored: &StoredSession, now: Instant) -> bool {
        now.saturating_duration_since(stored.last_access) >= self.ttl
    }

    pub(crate) fn insert_at(&self, session: ProposalSession, now: Instant) -> Arc<ProposalSession> {
        let session = Arc::new(session);
        let mut sessions = self.lock();

        sessions.retain(|_, stored| !self.is_expired(stored, now));

        while sessions.len() >= self.capacity {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, stored)| stored.last_access)
                .map(|(id, _)| *id)
            else {
                break;
            };
            sessions.remove(&oldest);
            debug!("Evicted least recently used proposal session {}", oldest);
        }

        sessions.insert(
            session.id,
            StoredSession {
                session: Arc::clone(&session),
                last_access: now,
            },
        );
        session
    }

    pub(crate) fn get_at(&self, id: &Uuid, now: Instant) -> Option<Arc<ProposalSession>> {
        let mut sessions = self.lock();
        let stored = sessions.get_mut(id)?;

        if self.is_expired(stored, now) {
            sessions.remove(id);
            debug!("Proposal session {} expired", id);
            return None;
        }

        stored.last_access = now;
        Some(Arc::clone(&stored.session))
    }
}
