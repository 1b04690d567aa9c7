use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, format_money};

pub type EventId = Uuid;

/// One entry of the trip log. Events are immutable once appended; corrections
/// are made by recording further events, never by editing old ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    /// 1-based position in the log, assigned by the ledger on append
    pub sequence: u64,
    /// When the event was recorded
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EventKind {
    /// `from` hands money to the treasurer `to`, usable later for `from`'s shares.
    Advance {
        from: String,
        to: String,
        amount_cents: Cents,
    },
    /// `payer` pays `amount_cents`, split evenly across `participants` (in order).
    Expense {
        payer: String,
        amount_cents: Cents,
        participants: Vec<String>,
        description: String,
    },
    /// `from` pays `to` to clear outstanding dues.
    Settlement {
        from: String,
        to: String,
        amount_cents: Cents,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
}

impl Event {
    /// Create a new event. The sequence number is assigned by the ledger.
    pub fn new(kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence: 0,
            recorded_at: Utc::now(),
            kind,
        }
    }

    pub fn advance(from: impl Into<String>, to: impl Into<String>, amount_cents: Cents) -> Self {
        Self::new(EventKind::Advance {
            from: from.into(),
            to: to.into(),
            amount_cents,
        })
    }

    pub fn expense(
        payer: impl Into<String>,
        amount_cents: Cents,
        participants: Vec<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(EventKind::Expense {
            payer: payer.into(),
            amount_cents,
            participants,
            description: description.into(),
        })
    }

    pub fn settlement(
        from: impl Into<String>,
        to: impl Into<String>,
        amount_cents: Cents,
        note: Option<String>,
    ) -> Self {
        Self::new(EventKind::Settlement {
            from: from.into(),
            to: to.into(),
            amount_cents,
            note,
        })
    }

    pub fn with_recorded_at(mut self, recorded_at: DateTime<Utc>) -> Self {
        self.recorded_at = recorded_at;
        self
    }

    pub fn kind_str(&self) -> &'static str {
        self.kind.as_str()
    }

    pub fn amount_cents(&self) -> Cents {
        match &self.kind {
            EventKind::Advance { amount_cents, .. }
            | EventKind::Expense { amount_cents, .. }
            | EventKind::Settlement { amount_cents, .. } => *amount_cents,
        }
    }

    /// Every member name this event refers to, payer/sender first.
    pub fn member_refs(&self) -> Vec<&str> {
        match &self.kind {
            EventKind::Advance { from, to, .. } | EventKind::Settlement { from, to, .. } => {
                vec![from.as_str(), to.as_str()]
            }
            EventKind::Expense {
                payer,
                participants,
                ..
            } => std::iter::once(payer.as_str())
                .chain(participants.iter().map(String::as_str))
                .collect(),
        }
    }

    pub fn involves(&self, name: &str) -> bool {
        self.member_refs().contains(&name)
    }

    /// One-line human description for the activity history.
    pub fn describe(&self, currency: &str) -> String {
        match &self.kind {
            EventKind::Advance {
                from,
                to,
                amount_cents,
            } => format!(
                "Advance: {} gave {} to {}",
                from,
                format_money(currency, *amount_cents),
                to
            ),
            EventKind::Expense {
                payer,
                amount_cents,
                participants,
                description,
            } => format!(
                "Expense: {} paid {} for {} - {}",
                payer,
                format_money(currency, *amount_cents),
                participants.join(", "),
                description
            ),
            EventKind::Settlement {
                from,
                to,
                amount_cents,
                note,
            } => match note {
                Some(note) => format!(
                    "Settlement: {} paid {} to {} ({})",
                    from,
                    format_money(currency, *amount_cents),
                    to,
                    note
                ),
                None => format!(
                    "Settlement: {} paid {} to {}",
                    from,
                    format_money(currency, *amount_cents),
                    to
                ),
            },
        }
    }
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Advance { .. } => "advance",
            EventKind::Expense { .. } => "expense",
            EventKind::Settlement { .. } => "settlement",
        }
    }
}
