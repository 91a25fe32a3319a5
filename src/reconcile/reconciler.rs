use crate::protocol::{EventEnvelope, EventKind};
use crate::types::SessionId;
use std::collections::HashMap;

/// Verdict on an incoming envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Caused by this session; already reflected optimistically
    OwnSession,
    /// Not newer than the last event of the same kind
    Stale { last_applied: i64 },
    Fresh,
}

/// Decides which realtime events a session should apply.
///
/// Staleness is tracked per event kind, so an older event of one kind is
/// still applied after a newer event of a different kind.
#[derive(Debug, Clone)]
pub struct Reconciler {
    session_id: SessionId,
    last_applied: HashMap<EventKind, i64>,
}

impl Reconciler {
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        Self {
            session_id: session_id.into(),
            last_applied: HashMap::new(),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Check an envelope and, when fresh, record its timestamp.
    /// Own-session events do not advance the clock for their kind.
    pub fn admit(&mut self, envelope: &EventEnvelope) -> Admission {
        if envelope.session_id == self.session_id {
            return Admission::OwnSession;
        }
        let kind = envelope.event.kind();
        if let Some(&last_applied) = self.last_applied.get(&kind) {
            if envelope.timestamp <= last_applied {
                return Admission::Stale { last_applied };
            }
        }
        self.last_applied.insert(kind, envelope.timestamp);
        Admission::Fresh
    }

    pub fn last_applied(&self, kind: EventKind) -> Option<i64> {
        self.last_applied.get(&kind).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Event;

    fn envelope(session: &str, timestamp: i64, event: Event) -> EventEnvelope {
        EventEnvelope {
            event,
            timestamp,
            session_id: session.into(),
        }
    }

    fn ready(team: &str) -> Event {
        Event::GuessingReady {
            word_id: "w1".into(),
            team_id: team.into(),
            ready: true,
        }
    }

    #[test]
    fn test_own_session_is_dropped_without_touching_clock() {
        let mut r = Reconciler::new("me");
        assert_eq!(r.admit(&envelope("me", 100, ready("t1"))), Admission::OwnSession);
        assert_eq!(r.last_applied(EventKind::GuessingReady), None);
        assert_eq!(r.admit(&envelope("other", 50, ready("t2"))), Admission::Fresh);
    }

    #[test]
    fn test_duplicates_are_admitted_once() {
        let mut r = Reconciler::new("me");
        let e = envelope("other", 100, ready("t2"));
        assert_eq!(r.admit(&e), Admission::Fresh);
        assert_eq!(r.admit(&e), Admission::Stale { last_applied: 100 });
        assert_eq!(r.admit(&e), Admission::Stale { last_applied: 100 });
    }

    #[test]
    fn test_staleness_is_per_kind() {
        let mut r = Reconciler::new("me");
        let newer = envelope("other", 200, Event::TeamLeave { user_id: "t1".into() });
        let older = envelope("other", 100, ready("t2"));
        assert_eq!(r.admit(&newer), Admission::Fresh);
        assert_eq!(r.admit(&older), Admission::Fresh);

        let late = envelope("other", 150, Event::TeamLeave { user_id: "t3".into() });
        assert_eq!(r.admit(&late), Admission::Stale { last_applied: 200 });
    }
}
