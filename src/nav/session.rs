//! Tab and session state.
//!
//! One tab per distinct place, keyed by country code (or title for tabs
//! without one) plus sub-place name. Re-opening a place refocuses the
//! existing tab instead of creating a twin. Insertion order is preserved
//! for display.

use crate::collab::{ChatTurn, PlacePhoto};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TabKind {
    Country,
    SubPlace,
    Agent,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tab {
    pub id: u64,
    pub title: String,
    pub iso_code: Option<String>,
    pub sub_place: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub kind: TabKind,
    /// Ranking score, present only when the tab came out of a
    /// recommendation.
    pub score: Option<f64>,
    pub insight: Option<String>,
    /// Message waiting to be sent to the agent when the tab gains focus.
    pub initial_message: Option<String>,
    pub turns: Vec<ChatTurn>,
    pub photo: Option<PlacePhoto>,
}

/// Everything needed to open a tab. Identity is derived, never supplied.
#[derive(Debug, Clone)]
pub struct TabDraft {
    pub title: String,
    pub iso_code: Option<String>,
    pub sub_place: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub kind: TabKind,
    pub score: Option<f64>,
    pub insight: Option<String>,
    pub initial_message: Option<String>,
}

/// State changes observers can react to (UI sync, logging).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    TabOpened { id: u64 },
    TabActivated { id: u64 },
    TabRefreshed { id: u64 },
    TabClosed { id: u64 },
}

#[derive(Default)]
pub struct SessionState {
    tabs: Vec<Tab>,
    active: Option<u64>,
    next_id: u64,
    events: Vec<SessionEvent>,
}

impl SessionState {
    pub fn new() -> Self {
        Self { tabs: Vec::new(), active: None, next_id: 1, events: Vec::new() }
    }

    fn key(code: &Option<String>, title: &str, sub_place: &Option<String>) -> (String, String) {
        let primary = match code {
            Some(c) => c.to_uppercase(),
            None => title.to_lowercase(),
        };
        let secondary = sub_place.as_deref().map(str::to_lowercase).unwrap_or_default();
        (primary, secondary)
    }

    /// Open a tab for the draft, or refocus the tab that already shows the
    /// same place. Returns the tab id; the tab is active afterwards.
    pub fn add_or_activate(&mut self, draft: TabDraft) -> u64 {
        let key = Self::key(&draft.iso_code, &draft.title, &draft.sub_place);
        if let Some(tab) = self
            .tabs
            .iter_mut()
            .find(|t| Self::key(&t.iso_code, &t.title, &t.sub_place) == key)
        {
            let id = tab.id;
            // Fresh payload wins; fields the draft leaves empty keep their
            // old values.
            let refreshed = draft.initial_message.is_some()
                || draft.score.is_some()
                || draft.insight.is_some();
            if draft.initial_message.is_some() {
                tab.initial_message = draft.initial_message;
            }
            if draft.score.is_some() {
                tab.score = draft.score;
            }
            if draft.insight.is_some() {
                tab.insight = draft.insight;
            }
            if refreshed {
                self.events.push(SessionEvent::TabRefreshed { id });
            }
            self.active = Some(id);
            self.events.push(SessionEvent::TabActivated { id });
            return id;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.tabs.push(Tab {
            id,
            title: draft.title,
            iso_code: draft.iso_code,
            sub_place: draft.sub_place,
            lat: draft.lat,
            lng: draft.lng,
            kind: draft.kind,
            score: draft.score,
            insight: draft.insight,
            initial_message: draft.initial_message,
            turns: Vec::new(),
            photo: None,
        });
        self.active = Some(id);
        self.events.push(SessionEvent::TabOpened { id });
        self.events.push(SessionEvent::TabActivated { id });
        id
    }

    /// Close a tab. When the active tab closes, the most recently opened
    /// survivor takes over; closing the last tab leaves nothing active.
    pub fn close(&mut self, id: u64) -> bool {
        let Some(pos) = self.tabs.iter().position(|t| t.id == id) else {
            return false;
        };
        self.tabs.remove(pos);
        self.events.push(SessionEvent::TabClosed { id });

        if self.active == Some(id) {
            self.active = self.tabs.last().map(|t| t.id);
            if let Some(next) = self.active {
                self.events.push(SessionEvent::TabActivated { id: next });
            }
        }
        true
    }

    pub fn set_active(&mut self, id: u64) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.active = Some(id);
        self.events.push(SessionEvent::TabActivated { id });
        true
    }

    pub fn contains(&self, id: u64) -> bool {
        self.tabs.iter().any(|t| t.id == id)
    }

    pub fn get(&self, id: u64) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| t.id == id)
    }

    pub fn active_id(&self) -> Option<u64> {
        self.active
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.active.and_then(|id| self.get(id))
    }

    /// Tabs in insertion order.
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Record a conversation turn. False when the tab is gone, so stale
    /// replies are dropped instead of resurrecting a closed tab.
    pub fn push_turn(&mut self, id: u64, turn: ChatTurn) -> bool {
        match self.get_mut(id) {
            Some(tab) => {
                tab.turns.push(turn);
                true
            }
            None => false,
        }
    }

    /// Attach a photo. Same staleness contract as `push_turn`.
    pub fn set_photo(&mut self, id: u64, photo: PlacePhoto) -> bool {
        match self.get_mut(id) {
            Some(tab) => {
                tab.photo = Some(photo);
                true
            }
            None => false,
        }
    }

    /// Take the queued message off a tab, if any.
    pub fn take_initial_message(&mut self, id: u64) -> Option<String> {
        self.get_mut(id).and_then(|tab| tab.initial_message.take())
    }

    /// Drain recorded events.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }
}
