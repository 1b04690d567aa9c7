use super::{Cents, Debt, Ledger, LedgerError, MemberSummary, compute_summary};

/// Minimal set of payments that clears every member's net balance.
pub fn compute_debt_matrix(ledger: &Ledger) -> Result<Vec<Debt>, LedgerError> {
    let summary = compute_summary(ledger)?;
    Ok(settlement_plan(&summary.members))
}

/// Greedy resolution over net balances: the largest remaining debtor pays the
/// largest remaining creditor until both sides are exhausted. Equal amounts
/// are resolved in registration order (the order of `members`). Produces at
/// most `n - 1` payments.
pub fn settlement_plan(members: &[MemberSummary]) -> Vec<Debt> {
    let mut creditors: Vec<(usize, Cents)> = Vec::new();
    let mut debtors: Vec<(usize, Cents)> = Vec::new();
    for (i, member) in members.iter().enumerate() {
        if member.net > 0 {
            creditors.push((i, member.net));
        } else if member.net < 0 {
            debtors.push((i, -member.net));
        }
    }

    let mut plan = Vec::new();
    while let (Some(c), Some(d)) = (largest(&creditors), largest(&debtors)) {
        let amount = creditors[c].1.min(debtors[d].1);
        plan.push(Debt {
            debtor: members[debtors[d].0].name.clone(),
            creditor: members[creditors[c].0].name.clone(),
            amount_cents: amount,
        });

        creditors[c].1 -= amount;
        debtors[d].1 -= amount;
        creditors.retain(|&(_, left)| left > 0);
        debtors.retain(|&(_, left)| left > 0);
    }

    plan
}

/// Position of the largest amount; the first one wins on ties.
fn largest(entries: &[(usize, Cents)]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (pos, &(_, amount)) in entries.iter().enumerate() {
        match best {
            Some(b) if entries[b].1 >= amount => {}
            _ => best = Some(pos),
        }
    }
    best
}
