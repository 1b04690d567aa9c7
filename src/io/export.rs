use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::domain::{
    Debt, Event, EventKind, Ledger, LedgerError, MEMBER_LIST_SEPARATOR, Member, TripSummary,
    compute_summary, settlement_plan,
};

/// Header of the event CSV. The importer reads columns by these positions.
pub const EVENT_CSV_HEADER: [&str; 9] = [
    "sequence",
    "id",
    "kind",
    "recorded_at",
    "from",
    "to",
    "amount_cents",
    "participants",
    "description",
];

/// Separator for the participant list inside a single CSV field.
pub const PARTICIPANT_SEPARATOR: &str = MEMBER_LIST_SEPARATOR;

/// Trip name and currency label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripInfo {
    pub name: String,
    pub currency: String,
}

/// Full trip export: the event log plus the summary computed from it.
/// Replaying `members` and `events` must reproduce `summary` exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub trip: TripInfo,
    pub members: Vec<Member>,
    pub events: Vec<Event>,
    pub summary: TripSummary,
    pub settlement_plan: Vec<Debt>,
}

impl TripSnapshot {
    pub fn capture(ledger: &Ledger) -> Result<Self, LedgerError> {
        let summary = compute_summary(ledger)?;
        let settlement_plan = settlement_plan(&summary.members);

        Ok(Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            trip: TripInfo {
                name: ledger.name().to_string(),
                currency: ledger.currency().to_string(),
            },
            members: ledger.members().to_vec(),
            events: ledger.events().to_vec(),
            summary,
            settlement_plan,
        })
    }

    /// Rebuild the ledger by replaying the exported log.
    pub fn restore(&self) -> Result<Ledger, LedgerError> {
        Ledger::replay(
            self.trip.name.clone(),
            self.trip.currency.clone(),
            self.members.clone(),
            self.events.clone(),
        )
    }

    /// True when the stored summary equals a fresh reconciliation of `ledger`.
    pub fn summary_matches(&self, ledger: &Ledger) -> Result<bool, LedgerError> {
        Ok(compute_summary(ledger)? == self.summary)
    }
}

/// Which debt list to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebtView {
    /// Pairwise debts as they arose from expenses, after settlements
    Outstanding,
    /// Minimal payments clearing every net balance
    Plan,
}

/// Exporter for converting a trip to flat record sets
pub struct Exporter<'a> {
    ledger: &'a Ledger,
}

impl<'a> Exporter<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self { ledger }
    }

    /// Export the event log to CSV, one row per event in ledger order
    pub fn export_events_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(EVENT_CSV_HEADER)?;

        let mut count = 0;
        for event in self.ledger.events() {
            let (from, to, participants, description) = match &event.kind {
                EventKind::Advance { from, to, .. } => {
                    (from.clone(), to.clone(), String::new(), String::new())
                }
                EventKind::Expense {
                    payer,
                    participants,
                    description,
                    ..
                } => (
                    payer.clone(),
                    String::new(),
                    participants.join(PARTICIPANT_SEPARATOR),
                    description.clone(),
                ),
                EventKind::Settlement { from, to, note, .. } => (
                    from.clone(),
                    to.clone(),
                    String::new(),
                    note.clone().unwrap_or_default(),
                ),
            };

            csv_writer.write_record(&[
                event.sequence.to_string(),
                event.id.to_string(),
                event.kind_str().to_string(),
                event.recorded_at.to_rfc3339(),
                from,
                to,
                event.amount_cents().to_string(),
                participants,
                description,
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the per-member summary table to CSV
    pub fn export_summary_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let summary = compute_summary(self.ledger)?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Field names follow `MemberSummary`
        for row in &summary.members {
            csv_writer.serialize(row)?;
        }

        csv_writer.flush()?;
        Ok(summary.members.len())
    }

    /// Export outstanding debts or the settlement plan to CSV
    pub fn export_debts_csv<W: Write>(&self, writer: W, view: DebtView) -> Result<usize> {
        let summary = compute_summary(self.ledger)?;
        let debts = match view {
            DebtView::Outstanding => summary.outstanding,
            DebtView::Plan => settlement_plan(&summary.members),
        };

        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["debtor", "creditor", "amount_cents"])?;
        for debt in &debts {
            csv_writer.write_record(&[
                debt.debtor.as_str(),
                debt.creditor.as_str(),
                debt.amount_cents.to_string().as_str(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(debts.len())
    }

    /// Export the whole trip as a JSON snapshot
    pub fn export_full_json<W: Write>(&self, mut writer: W) -> Result<TripSnapshot> {
        let snapshot = TripSnapshot::capture(self.ledger)?;

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
