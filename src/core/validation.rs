/// Version guard over in-flight validations of one input box.
///
/// Every issued validation bumps the version. A result is applied only when
/// it carries the latest version, so slower validations of older text are
/// dropped on arrival no matter in which order they settle.
#[derive(Debug, Default)]
pub struct ValidationGate {
    version: u64,
    latest_text: Option<String>,
    settled: Option<Option<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid(String),
}

impl ValidationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, text: &str) -> Ticket {
        self.version = self.version.saturating_add(1);
        self.latest_text = Some(text.to_string());
        self.settled = None;
        Ticket {
            version: self.version,
        }
    }

    /// Records `outcome` if `ticket` is still current. Returns `false` for a
    /// superseded ticket.
    pub fn settle(&mut self, ticket: Ticket, outcome: Option<String>) -> bool {
        if ticket.version != self.version {
            return false;
        }
        self.settled = Some(outcome);
        true
    }

    /// Settled verdict for `text`, if the latest validation was for it.
    pub fn verdict_for(&self, text: &str) -> Option<Verdict> {
        if self.latest_text.as_deref() != Some(text) {
            return None;
        }
        self.settled.as_ref().map(|outcome| match outcome {
            None => Verdict::Valid,
            Some(message) => Verdict::Invalid(message.clone()),
        })
    }

    pub fn is_pending_for(&self, text: &str) -> bool {
        self.latest_text.as_deref() == Some(text) && self.settled.is_none()
    }

    pub fn latest_text(&self) -> Option<&str> {
        self.latest_text.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.settled.as_ref().and_then(|outcome| outcome.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::{ValidationGate, Verdict};

    #[test]
    fn superseded_ticket_is_discarded() {
        let mut gate = ValidationGate::new();
        let first = gate.issue("1");
        let second = gate.issue("12");

        assert!(gate.settle(second, None));
        assert!(!gate.settle(first, Some("too short".into())));
        assert_eq!(gate.verdict_for("12"), Some(Verdict::Valid));
        assert_eq!(gate.message(), None);
    }

    #[test]
    fn verdict_only_for_latest_text() {
        let mut gate = ValidationGate::new();
        let ticket = gate.issue("abc");
        assert!(gate.is_pending_for("abc"));
        assert!(gate.settle(ticket, Some("bad".into())));

        assert_eq!(
            gate.verdict_for("abc"),
            Some(Verdict::Invalid("bad".into()))
        );
        assert_eq!(gate.verdict_for("ab"), None);
        assert!(!gate.is_pending_for("abc"));
    }

    #[test]
    fn reissue_for_same_text_resets_verdict() {
        let mut gate = ValidationGate::new();
        let ticket = gate.issue("x");
        gate.settle(ticket, None);
        gate.issue("x");
        assert_eq!(gate.verdict_for("x"), None);
        assert!(gate.is_pending_for("x"));
    }
}
