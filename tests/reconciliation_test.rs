mod common;

use anyhow::Result;
use common::{Group, names, rs};
use tripsplit::domain::{
    Cents, SettlementStatus, TripSummary, compute_debt_matrix, compute_summary,
};

fn assert_conserved(summary: &TripSummary) {
    let funded: Cents = summary
        .members
        .iter()
        .map(|m| m.expenses_paid + m.advance_given)
        .sum();
    let consumed: Cents = summary.members.iter().map(|m| m.share_owed).sum();
    assert_eq!(funded, consumed + summary.total_advance_held());

    let net: Cents = summary.members.iter().map(|m| m.net).sum();
    assert_eq!(net, 0);

    for m in &summary.members {
        assert_eq!(
            m.net,
            m.advance_given - m.advance_balance + m.expenses_paid - m.share_owed
                + m.settlements_paid
                - m.settlements_received,
            "balance identity for {}",
            m.name
        );
    }
}

#[test]
fn test_eight_member_advance_scenario() -> Result<()> {
    let ledger = Group::eight_member_trip()?;
    let summary = compute_summary(&ledger)?;

    // A's pool covers A, then C and part of D; B's pool covers B, the rest
    // of D and most of E; C pays everything after that.
    assert_eq!(summary.debt("C", "A"), rs(1250));
    assert_eq!(summary.debt("D", "A"), rs(500));
    assert_eq!(summary.debt("D", "B"), rs(750));
    assert_eq!(summary.debt("E", "B"), rs(1000));
    assert_eq!(summary.debt("E", "C"), rs(250));
    for member in ["F", "G", "H"] {
        assert_eq!(summary.debt(member, "C"), rs(1250));
    }
    assert_eq!(summary.outstanding.len(), 8);

    let nets: Vec<(&str, Cents)> = summary
        .members
        .iter()
        .map(|m| (m.name.as_str(), m.net))
        .collect();
    assert_eq!(
        nets,
        vec![
            ("A", rs(1750)),
            ("B", rs(1750)),
            ("C", rs(2750)),
            ("D", rs(-1250)),
            ("E", rs(-1250)),
            ("F", rs(-1250)),
            ("G", rs(-1250)),
            ("H", rs(-1250)),
        ]
    );

    let c = summary.member("C").unwrap();
    assert_eq!(c.advance_received, rs(6000));
    assert_eq!(c.advance_held, 0);
    assert_eq!(c.expenses_paid, rs(4000));
    assert_eq!(c.advance_used_from_others, rs(1250));

    let a = summary.member("A").unwrap();
    assert_eq!(a.advance_given, rs(3000));
    assert_eq!(a.advance_balance, 0);
    assert_eq!(a.advance_used_by_others, rs(1750));
    assert_eq!(a.status, SettlementStatus::Pending);

    assert_conserved(&summary);
    Ok(())
}

#[test]
fn test_non_treasurer_expense() -> Result<()> {
    let mut ledger = Group::eight_member_trip()?;
    ledger.record_expense("D", rs(800), names(&["D", "E"]), "Snacks")?;

    let summary = compute_summary(&ledger)?;
    assert_eq!(summary.debt("E", "D"), rs(400));

    let d = summary.member("D").unwrap();
    assert_eq!(d.expenses_paid, rs(800));
    assert_eq!(d.share_owed, rs(1250) + rs(400));
    assert_eq!(d.net, rs(-1250) + rs(400));

    assert_conserved(&summary);
    Ok(())
}

#[test]
fn test_expense_without_any_advance() -> Result<()> {
    let mut ledger = Group::ledger(&["Anu", "Bala", "Chitra"])?;
    ledger.record_expense("Anu", 1000, names(&["Anu", "Bala", "Chitra"]), "Tea")?;

    let summary = compute_summary(&ledger)?;
    // 1000 / 3 leaves one cent over, assigned to the first participant
    assert_eq!(summary.member("Anu").unwrap().share_owed, 334);
    assert_eq!(summary.debt("Bala", "Anu"), 333);
    assert_eq!(summary.debt("Chitra", "Anu"), 333);
    assert_eq!(summary.member("Anu").unwrap().net, 666);

    assert_conserved(&summary);
    Ok(())
}

#[test]
fn test_unspent_advance_stays_with_treasurer() -> Result<()> {
    let mut ledger = Group::ledger(&["Anu", "Bala", "Chitra"])?;
    ledger.record_advance("Anu", "Chitra", rs(5000))?;
    ledger.record_expense("Chitra", rs(900), names(&["Anu", "Chitra"]), "Fuel")?;

    let summary = compute_summary(&ledger)?;
    let anu = summary.member("Anu").unwrap();
    let chitra = summary.member("Chitra").unwrap();

    // Anu's own share and Chitra's share both come out of Anu's advance
    assert_eq!(anu.advance_balance, rs(4100));
    assert_eq!(chitra.advance_held, rs(4100));
    assert_eq!(summary.debt("Chitra", "Anu"), rs(450));
    assert_eq!(chitra.expenses_paid, 0);

    // Unspent advance is not debt; it shows up as advance balance only
    assert_eq!(anu.net, rs(450));
    assert_eq!(summary.member("Bala").unwrap().status, SettlementStatus::Settled);

    assert_conserved(&summary);
    Ok(())
}

#[test]
fn test_repeat_advance_tops_up_same_pool() -> Result<()> {
    let mut ledger = Group::ledger(&["Anu", "Bala", "Chitra"])?;
    ledger.record_advance("Anu", "Chitra", rs(100))?;
    ledger.record_advance("Bala", "Chitra", rs(100))?;
    ledger.record_advance("Anu", "Chitra", rs(100))?;
    ledger.record_expense("Chitra", rs(250), names(&["Chitra"]), "Souvenirs")?;

    let summary = compute_summary(&ledger)?;
    // Anu gave first, so Anu's (topped-up) pool is drained before Bala's
    assert_eq!(summary.debt("Chitra", "Anu"), rs(200));
    assert_eq!(summary.debt("Chitra", "Bala"), rs(50));
    assert_eq!(summary.member("Bala").unwrap().advance_balance, rs(50));

    assert_conserved(&summary);
    Ok(())
}

#[test]
fn test_opposite_debts_are_netted() -> Result<()> {
    let mut ledger = Group::ledger(&["Anu", "Bala"])?;
    ledger.record_expense("Anu", rs(600), names(&["Anu", "Bala"]), "Cab")?;
    ledger.record_expense("Bala", rs(200), names(&["Anu", "Bala"]), "Tea")?;

    let summary = compute_summary(&ledger)?;
    assert_eq!(summary.debt("Bala", "Anu"), rs(200));
    assert_eq!(summary.debt("Anu", "Bala"), 0);
    assert_eq!(summary.outstanding.len(), 1);

    assert_conserved(&summary);
    Ok(())
}

#[test]
fn test_debt_matrix_is_minimal() -> Result<()> {
    let ledger = Group::eight_member_trip()?;
    let plan = compute_debt_matrix(&ledger)?;

    // Five debtors and three creditors: never more than n - 1 payments
    assert!(plan.len() <= Group::EIGHT.len() - 1);

    let summary = compute_summary(&ledger)?;
    for member in &summary.members {
        let received: Cents = plan
            .iter()
            .filter(|d| d.creditor == member.name)
            .map(|d| d.amount_cents)
            .sum();
        let paid: Cents = plan
            .iter()
            .filter(|d| d.debtor == member.name)
            .map(|d| d.amount_cents)
            .sum();
        assert_eq!(received - paid, member.net, "plan clears {}", member.name);
    }
    Ok(())
}

#[test]
fn test_recomputation_is_deterministic() -> Result<()> {
    let ledger = Group::eight_member_trip()?;

    let first = serde_json::to_string(&compute_summary(&ledger)?)?;
    let second = serde_json::to_string(&compute_summary(&ledger)?)?;
    assert_eq!(first, second);
    Ok(())
}
