use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Cents, Debt, Event, EventKind, Ledger, LedgerError, MemberSummary, compute_summary,
    settlement_plan,
};

/// Full report consumed by renderers (table, JSON, PDF collaborators).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripReport {
    pub trip_name: String,
    pub currency: String,
    pub generated_at: DateTime<Utc>,
    pub totals: TripTotals,
    pub members: Vec<MemberSummary>,
    pub outstanding: Vec<Debt>,
    pub settlement_plan: Vec<Debt>,
    pub history: Vec<ActivityEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripTotals {
    pub expenses: Cents,
    pub advances: Cents,
    pub settlements: Cents,
    pub advance_held: Cents,
    pub outstanding: Cents,
}

/// One line of the activity history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub sequence: u64,
    pub kind: String,
    pub recorded_at: DateTime<Utc>,
    pub line: String,
}

impl ActivityEntry {
    pub fn from_event(event: &Event, currency: &str) -> Self {
        Self {
            sequence: event.sequence,
            kind: event.kind_str().to_string(),
            recorded_at: event.recorded_at,
            line: event.describe(currency),
        }
    }
}

/// Everything known about one member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDetail {
    pub summary: MemberSummary,
    pub owes_to: Vec<Debt>,
    pub gets_from: Vec<Debt>,
    pub activity: Vec<ActivityEntry>,
}

pub fn activity_history(ledger: &Ledger) -> Vec<ActivityEntry> {
    ledger
        .events()
        .iter()
        .map(|e| ActivityEntry::from_event(e, ledger.currency()))
        .collect()
}

pub fn build_report(ledger: &Ledger) -> Result<TripReport, LedgerError> {
    let summary = compute_summary(ledger)?;
    let plan = settlement_plan(&summary.members);

    let mut totals = TripTotals {
        advance_held: summary.total_advance_held(),
        outstanding: summary.outstanding.iter().map(|d| d.amount_cents).sum(),
        ..Default::default()
    };
    for event in ledger.events() {
        match event.kind {
            EventKind::Advance { amount_cents, .. } => totals.advances += amount_cents,
            EventKind::Expense { amount_cents, .. } => totals.expenses += amount_cents,
            EventKind::Settlement { amount_cents, .. } => totals.settlements += amount_cents,
        }
    }

    Ok(TripReport {
        trip_name: ledger.name().to_string(),
        currency: ledger.currency().to_string(),
        generated_at: Utc::now(),
        totals,
        members: summary.members,
        outstanding: summary.outstanding,
        settlement_plan: plan,
        history: activity_history(ledger),
    })
}

/// Detail for `name`, or `None` when no such member is registered.
pub fn member_detail(ledger: &Ledger, name: &str) -> Result<Option<MemberDetail>, LedgerError> {
    let summary = compute_summary(ledger)?;
    let Some(row) = summary.member(name).cloned() else {
        return Ok(None);
    };

    Ok(Some(MemberDetail {
        owes_to: summary.owes_to(name).cloned().collect(),
        gets_from: summary.gets_from(name).cloned().collect(),
        activity: ledger
            .events()
            .iter()
            .filter(|e| e.involves(name))
            .map(|e| ActivityEntry::from_event(e, ledger.currency()))
            .collect(),
        summary: row,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> Ledger {
        let mut ledger = Ledger::new("Ooty", "Rs.");
        for name in ["Anu", "Bala", "Chitra"] {
            ledger.add_member(name).unwrap();
        }
        ledger.record_advance("Anu", "Chitra", 50000).unwrap();
        ledger
            .record_expense(
                "Chitra",
                90000,
                vec!["Anu".into(), "Bala".into(), "Chitra".into()],
                "Toy train",
            )
            .unwrap();
        ledger
            .record_settlement("Bala", "Anu", 10000, Some("cash".into()))
            .unwrap();
        ledger
    }

    #[test]
    fn test_report_totals() {
        let report = build_report(&ledger()).unwrap();

        assert_eq!(report.totals.advances, 50000);
        assert_eq!(report.totals.expenses, 90000);
        assert_eq!(report.totals.settlements, 10000);
        assert_eq!(report.totals.advance_held, 0);
        assert_eq!(report.members.len(), 3);
        assert_eq!(report.history.len(), 3);
    }

    #[test]
    fn test_history_lines() {
        let history = activity_history(&ledger());
        let lines: Vec<&str> = history.iter().map(|h| h.line.as_str()).collect();

        assert_eq!(
            lines,
            vec![
                "Advance: Anu gave Rs. 500.00 to Chitra",
                "Expense: Chitra paid Rs. 900.00 for Anu, Bala, Chitra - Toy train",
                "Settlement: Bala paid Rs. 100.00 to Anu (cash)",
            ]
        );
        assert_eq!(history[1].kind, "expense");
        assert_eq!(history[2].sequence, 3);
    }

    #[test]
    fn test_member_detail() {
        let ledger = ledger();
        let detail = member_detail(&ledger, "Bala").unwrap().unwrap();

        assert_eq!(detail.summary.share_owed, 30000);
        // Anu's leftover advance covered 200.00, Chitra fronted the rest
        assert_eq!(detail.owes_to.len(), 2);
        assert_eq!(detail.owes_to[0].creditor, "Anu");
        assert_eq!(detail.owes_to[0].amount_cents, 10000);
        assert_eq!(detail.owes_to[1].creditor, "Chitra");
        assert_eq!(detail.owes_to[1].amount_cents, 10000);
        assert!(detail.gets_from.is_empty());
        assert_eq!(detail.activity.len(), 2);

        assert!(member_detail(&ledger, "Zed").unwrap().is_none());
    }
}
