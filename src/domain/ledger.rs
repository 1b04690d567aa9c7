use std::collections::HashSet;

use super::{Cents, Event, EventKind, LedgerError, Member, compute_summary, outstanding_debt};

/// The trip ledger: member registry plus the append-only event log.
///
/// Every `record_*` call validates the whole event against the current state
/// before appending, so a rejected call leaves the ledger untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    name: String,
    currency: String,
    members: Vec<Member>,
    events: Vec<Event>,
}

impl Ledger {
    pub fn new(name: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            currency: currency.into(),
            members: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Rebuild a ledger from an exported member list and event log.
    /// Each event goes through the same validation as a live `record_*` call;
    /// ids and timestamps are preserved.
    pub fn replay(
        name: impl Into<String>,
        currency: impl Into<String>,
        members: Vec<Member>,
        events: Vec<Event>,
    ) -> Result<Self, LedgerError> {
        let mut ledger = Self::new(name, currency);
        for member in members {
            ledger.insert_member(member)?;
        }
        for event in events {
            ledger.apply(event)?;
        }
        Ok(ledger)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Members in registration order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// The event log in insertion order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn contains_member(&self, name: &str) -> bool {
        self.member(name).is_some()
    }

    /// Register a new member.
    pub fn add_member(&mut self, name: impl Into<String>) -> Result<&Member, LedgerError> {
        self.insert_member(Member::new(name))
    }

    /// Record an advance handed by `from` to the treasurer `to`.
    pub fn record_advance(
        &mut self,
        from: &str,
        to: &str,
        amount_cents: Cents,
    ) -> Result<&Event, LedgerError> {
        self.apply(Event::advance(from, to, amount_cents))
    }

    /// Record an expense paid by `payer` and split among `participants`.
    /// The payer only carries a share when listed as a participant.
    pub fn record_expense(
        &mut self,
        payer: &str,
        amount_cents: Cents,
        participants: Vec<String>,
        description: impl Into<String>,
    ) -> Result<&Event, LedgerError> {
        self.apply(Event::expense(payer, amount_cents, participants, description))
    }

    /// Record that `from` paid `to` to clear dues. Rejected with
    /// [`LedgerError::Overpayment`] when more than the outstanding debt.
    pub fn record_settlement(
        &mut self,
        from: &str,
        to: &str,
        amount_cents: Cents,
        note: Option<String>,
    ) -> Result<&Event, LedgerError> {
        self.apply(Event::settlement(from, to, amount_cents, note))
    }

    /// Validate and append a prepared event, assigning its sequence number.
    /// An event whose amounts would overflow the trip totals is taken back out.
    pub fn apply(&mut self, mut event: Event) -> Result<&Event, LedgerError> {
        self.validate(&event)?;

        let index = self.events.len();
        event.sequence = index as u64 + 1;
        self.events.push(event);
        if let Err(e) = compute_summary(self) {
            self.events.pop();
            return Err(e);
        }
        Ok(&self.events[index])
    }

    /// Check an event against the registry and the current log without
    /// appending it.
    pub fn validate(&self, event: &Event) -> Result<(), LedgerError> {
        for name in event.member_refs() {
            if !self.contains_member(name) {
                return Err(LedgerError::UnknownMember(name.to_string()));
            }
        }

        match &event.kind {
            EventKind::Advance {
                from,
                to,
                amount_cents,
            } => {
                ensure_positive(*amount_cents)?;
                if from == to {
                    return Err(LedgerError::SelfAdvance(from.clone()));
                }
            }

            EventKind::Expense {
                amount_cents,
                participants,
                ..
            } => {
                if participants.is_empty() {
                    return Err(LedgerError::EmptyParticipants);
                }
                ensure_positive(*amount_cents)?;

                let mut seen = HashSet::new();
                for participant in participants {
                    if !seen.insert(participant.as_str()) {
                        return Err(LedgerError::DuplicateParticipant(participant.clone()));
                    }
                }
            }

            EventKind::Settlement {
                from,
                to,
                amount_cents,
                ..
            } => {
                ensure_positive(*amount_cents)?;
                if from == to {
                    return Err(LedgerError::SelfSettlement(from.clone()));
                }

                let outstanding = outstanding_debt(self, from, to)?;
                if *amount_cents > outstanding {
                    return Err(LedgerError::Overpayment {
                        from: from.clone(),
                        to: to.clone(),
                        outstanding,
                        requested: *amount_cents,
                    });
                }
            }
        }

        Ok(())
    }

    fn insert_member(&mut self, member: Member) -> Result<&Member, LedgerError> {
        if !Member::is_valid_name(&member.name) {
            return Err(LedgerError::InvalidMemberName(member.name));
        }
        if self.contains_member(&member.name) {
            return Err(LedgerError::DuplicateMember(member.name));
        }

        let index = self.members.len();
        self.members.push(member);
        Ok(&self.members[index])
    }
}

fn ensure_positive(amount_cents: Cents) -> Result<(), LedgerError> {
    if amount_cents <= 0 {
        return Err(LedgerError::InvalidAmount(amount_cents));
    }
    Ok(())
}
