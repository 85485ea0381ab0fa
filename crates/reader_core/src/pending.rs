//! Per-kind slots for requests whose answer arrives as a later event.
//!
//! The renderer echoes the request id it was given. Only the most recent
//! request of each kind is live; issuing a new one supersedes the previous
//! and any answer to the superseded request is reported as stale.

use shared::domain::RequestId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Search,
    Html,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    Stale { live: Option<RequestId> },
}

#[derive(Debug, Default)]
pub struct PendingRequests {
    last_issued: u64,
    search: Option<RequestId>,
    html: Option<RequestId>,
}

impl PendingRequests {
    pub fn issue(&mut self, kind: RequestKind) -> RequestId {
        self.last_issued += 1;
        let id = RequestId(self.last_issued);
        *self.slot_mut(kind) = Some(id);
        id
    }

    /// Releases `id` if it is still the live request of `kind`.
    pub fn forget(&mut self, kind: RequestKind, id: RequestId) {
        let slot = self.slot_mut(kind);
        if *slot == Some(id) {
            *slot = None;
        }
    }

    /// Drops every live request, keeping the id sequence.
    pub fn clear(&mut self) {
        self.search = None;
        self.html = None;
    }

    pub fn in_flight(&self, kind: RequestKind) -> Option<RequestId> {
        match kind {
            RequestKind::Search => self.search,
            RequestKind::Html => self.html,
        }
    }

    /// Decides whether an answer may be applied.
    ///
    /// Answers without an id come from renderers that do not echo ids and
    /// are accepted as-is.
    pub fn admit(&mut self, kind: RequestKind, answer: Option<RequestId>) -> Admission {
        let slot = self.slot_mut(kind);
        match answer {
            None => {
                *slot = None;
                Admission::Accepted
            }
            Some(id) if *slot == Some(id) => {
                *slot = None;
                Admission::Accepted
            }
            Some(_) => Admission::Stale { live: *slot },
        }
    }

    fn slot_mut(&mut self, kind: RequestKind) -> &mut Option<RequestId> {
        match kind {
            RequestKind::Search => &mut self.search,
            RequestKind::Html => &mut self.html,
        }
    }
}
