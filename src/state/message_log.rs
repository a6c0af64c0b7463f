// Message log for the current session
// Arena of messages keyed by id, with display order held by slot numbers

use crate::chat::models::{Feedback, Message, MessageId, MessageStatus, RecordId};
use std::collections::{BTreeMap, HashMap};

/// Slot number; assigned on append and never reused within a log
type Slot = u64;

/// Ordered messages of one session, including optimistic entries
///
/// Messages live in slots numbered in creation order. An id index maps
/// temporary or server ids to slots, so confirming or rolling back an entry
/// never moves any other entry.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    /// Session these messages belong to
    session_id: Option<RecordId>,
    /// False while history is loading or after a failed load
    ready: bool,
    /// Bumped on every reset; lets late responses detect a switch
    generation: u64,
    next_slot: Slot,
    slots: BTreeMap<Slot, Message>,
    index: HashMap<MessageId, Slot>,
}

impl MessageLog {
    /// Create an empty log bound to no session
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every message and rebind the log
    ///
    /// Returns the new generation.
    pub fn reset(&mut self, session_id: Option<RecordId>, ready: bool) -> u64 {
        self.slots.clear();
        self.index.clear();
        self.session_id = session_id;
        self.ready = ready;
        self.generation += 1;
        self.generation
    }

    /// Replace the contents with a chronologically ordered history
    pub fn install_history(&mut self, messages: Vec<Message>) {
        self.slots.clear();
        self.index.clear();
        for message in messages {
            self.append(message);
        }
        self.ready = true;
    }

    /// Session the log belongs to
    pub fn session_id(&self) -> Option<&RecordId> {
        self.session_id.as_ref()
    }

    /// Whether history for the bound session has been installed
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Current generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Append at the end of the log
    ///
    /// A message whose id is already present replaces the index entry; the
    /// earlier entry stays in place but is no longer addressable.
    pub fn append(&mut self, message: Message) -> MessageId {
        let slot = self.next_slot;
        self.next_slot += 1;
        let id = message.id.clone();
        self.index.insert(id.clone(), slot);
        self.slots.insert(slot, message);
        id
    }

    /// Swap a pending entry for its confirmed counterpart, in place
    ///
    /// Returns false (and changes nothing) unless `temporary_id` names a
    /// pending entry.
    pub fn confirm(&mut self, temporary_id: &MessageId, confirmed: Message) -> bool {
        let Some(&slot) = self.index.get(temporary_id) else {
            return false;
        };
        match self.slots.get(&slot) {
            Some(existing) if existing.status == MessageStatus::Pending => {}
            _ => return false,
        }
        self.index.remove(temporary_id);
        self.index.insert(confirmed.id.clone(), slot);
        self.slots.insert(slot, confirmed);
        true
    }

    /// Remove a pending entry entirely
    ///
    /// Returns the removed entry; confirmed entries are never removed.
    pub fn rollback(&mut self, temporary_id: &MessageId) -> Option<Message> {
        let slot = *self.index.get(temporary_id)?;
        if self.slots.get(&slot)?.status != MessageStatus::Pending {
            return None;
        }
        self.index.remove(temporary_id);
        self.slots.remove(&slot)
    }

    /// Look a message up by temporary or server id
    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.index.get(id).and_then(|slot| self.slots.get(slot))
    }

    /// Attach feedback to a confirmed message
    /// Returns true if the message was found, confirmed, and updated
    pub fn set_feedback(&mut self, id: &RecordId, feedback: Feedback) -> bool {
        let key = MessageId::Server(id.clone());
        let Some(slot) = self.index.get(&key) else {
            return false;
        };
        match self.slots.get_mut(slot) {
            Some(message) if message.status == MessageStatus::Confirmed => {
                message.feedback = Some(feedback);
                true
            }
            _ => false,
        }
    }

    /// Messages in creation order
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.slots.values()
    }

    /// Number of messages, pending included
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of pending entries
    pub fn pending_count(&self) -> usize {
        self.slots.values().filter(|m| m.is_pending()).count()
    }
}
