// Session registry
// Single source of truth for sessions; "current" is a key, never a copy

use crate::chat::models::{RecordId, Session};
use std::collections::HashMap;

/// Ordered set of sessions plus the current-session pointer
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    /// Registry of all sessions (id -> Session)
    sessions: HashMap<RecordId, Session>,
    /// Display order, front first
    order: Vec<RecordId>,
    /// ID of the current session, if any
    current_id: Option<RecordId>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection, keeping the given order
    ///
    /// The current pointer is left alone; it may name a session outside the
    /// loaded page.
    pub fn replace_all(&mut self, sessions: Vec<Session>) {
        self.sessions.clear();
        self.order.clear();
        for session in sessions {
            if self.sessions.contains_key(&session.id) {
                continue;
            }
            self.order.push(session.id.clone());
            self.sessions.insert(session.id.clone(), session);
        }
    }

    /// Insert at the front of the display order (moving it if already known)
    pub fn insert_front(&mut self, session: Session) {
        self.order.retain(|id| id != &session.id);
        self.order.insert(0, session.id.clone());
        self.sessions.insert(session.id.clone(), session);
    }

    /// Insert or refresh a session without changing the order of known ones
    ///
    /// Unknown sessions go to the front.
    pub fn upsert(&mut self, session: Session) {
        if self.sessions.contains_key(&session.id) {
            self.sessions.insert(session.id.clone(), session);
        } else {
            self.insert_front(session);
        }
    }

    /// Remove a session; clears the current pointer if it pointed there
    /// Returns the removed session if it existed
    pub fn remove(&mut self, id: &RecordId) -> Option<Session> {
        let removed = self.sessions.remove(id);
        self.order.retain(|known| known != id);
        if self.current_id.as_ref() == Some(id) {
            self.current_id = None;
        }
        removed
    }

    /// Update a session's title
    /// Returns true if the session was found and updated
    pub fn rename(&mut self, id: &RecordId, title: &str) -> bool {
        if let Some(session) = self.sessions.get_mut(id) {
            session.title = title.to_string();
            true
        } else {
            false
        }
    }

    /// Look a session up by id
    pub fn get(&self, id: &RecordId) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Point "current" at a session id
    pub fn set_current(&mut self, id: RecordId) {
        self.current_id = Some(id);
    }

    /// Clear the current pointer
    pub fn clear_current(&mut self) {
        self.current_id = None;
    }

    /// ID of the current session
    pub fn current_id(&self) -> Option<&RecordId> {
        self.current_id.as_ref()
    }

    /// The current session, if it is known to the store
    pub fn current(&self) -> Option<&Session> {
        self.current_id.as_ref().and_then(|id| self.sessions.get(id))
    }

    /// Sessions in display order
    pub fn list(&self) -> Vec<&Session> {
        self.order
            .iter()
            .filter_map(|id| self.sessions.get(id))
            .collect()
    }

    /// Number of sessions
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the store holds no sessions
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(store: &SessionStore) -> Vec<&str> {
        store.list().iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn test_insert_front_and_order() {
        let mut store = SessionStore::new();
        store.replace_all(vec![Session::new("b", "B"), Session::new("c", "C")]);
        store.insert_front(Session::new("a", "A"));
        assert_eq!(titles(&store), vec!["A", "B", "C"]);

        store.insert_front(Session::new("c", "C2"));
        assert_eq!(titles(&store), vec!["C2", "A", "B"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_current_is_a_key_not_a_copy() {
        let mut store = SessionStore::new();
        store.insert_front(Session::new("a", "Old"));
        store.set_current(RecordId::from("a"));

        assert!(store.rename(&RecordId::from("a"), "New"));
        assert_eq!(store.current().unwrap().title, "New");
        assert!(!store.rename(&RecordId::from("zzz"), "Nope"));
    }

    #[test]
    fn test_remove_clears_current() {
        let mut store = SessionStore::new();
        store.insert_front(Session::new(1, "One"));
        store.insert_front(Session::new(2, "Two"));
        store.set_current(RecordId::Number(1));

        assert!(store.remove(&RecordId::Number(2)).is_some());
        assert_eq!(store.current_id(), Some(&RecordId::Number(1)));

        assert!(store.remove(&RecordId::Number(1)).is_some());
        assert!(store.current_id().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_replace_all_keeps_weak_current_key() {
        let mut store = SessionStore::new();
        store.insert_front(Session::new("a", "A"));
        store.set_current(RecordId::from("a"));

        store.replace_all(vec![Session::new("b", "B"), Session::new("b", "dup")]);
        assert_eq!(store.current_id(), Some(&RecordId::from("a")));
        assert!(store.current().is_none());
        assert_eq!(titles(&store), vec!["B"]);
    }

    #[test]
    fn test_upsert_keeps_position() {
        let mut store = SessionStore::new();
        store.replace_all(vec![Session::new("a", "A"), Session::new("b", "B")]);
        store.upsert(Session::new("b", "B2"));
        store.upsert(Session::new("z", "Z"));
        assert_eq!(titles(&store), vec!["Z", "A", "B2"]);
    }
}
