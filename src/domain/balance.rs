use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Cents, Event, EventKind, Ledger, LedgerError, Member, split_evenly};

/// Figures derived for one member from the whole event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSummary {
    pub name: String,
    /// Total advance handed to treasurers
    pub advance_given: Cents,
    /// Total advance received as treasurer
    pub advance_received: Cents,
    /// Own advance spent on other members' shares
    pub advance_used_by_others: Cents,
    /// Share covered by other members' advances
    pub advance_used_from_others: Cents,
    /// Own advance not yet consumed
    pub advance_balance: Cents,
    /// Other members' advance still held unconsumed as treasurer
    pub advance_held: Cents,
    /// Expense money paid out of pocket (not covered by held advances)
    pub expenses_paid: Cents,
    pub settlements_paid: Cents,
    pub settlements_received: Cents,
    /// `expenses_paid + settlements_paid`
    pub paid: Cents,
    /// Sum of expense shares, however they were funded
    pub share_owed: Cents,
    /// Outstanding amount other members owe this member
    pub gets_back: Cents,
    /// Outstanding amount this member owes others
    pub dues: Cents,
    /// `gets_back - dues`: positive means the group owes this member
    pub net: Cents,
    pub status: SettlementStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    Settled,
    Pending,
}

impl SettlementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStatus::Settled => "settled",
            SettlementStatus::Pending => "pending",
        }
    }
}

impl std::fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `debtor` owes `creditor` the given amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debt {
    pub debtor: String,
    pub creditor: String,
    pub amount_cents: Cents,
}

/// Result of reconciling a trip: one row per member in registration order,
/// plus the outstanding pairwise debts (netted per pair, after settlements).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripSummary {
    pub members: Vec<MemberSummary>,
    pub outstanding: Vec<Debt>,
}

impl TripSummary {
    pub fn member(&self, name: &str) -> Option<&MemberSummary> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Outstanding amount `debtor` owes `creditor` (zero if none).
    pub fn debt(&self, debtor: &str, creditor: &str) -> Cents {
        self.outstanding
            .iter()
            .find(|d| d.debtor == debtor && d.creditor == creditor)
            .map(|d| d.amount_cents)
            .unwrap_or(0)
    }

    pub fn owes_to<'a>(&'a self, debtor: &'a str) -> impl Iterator<Item = &'a Debt> + 'a {
        self.outstanding.iter().filter(move |d| d.debtor == debtor)
    }

    pub fn gets_from<'a>(&'a self, creditor: &'a str) -> impl Iterator<Item = &'a Debt> + 'a {
        self.outstanding.iter().filter(move |d| d.creditor == creditor)
    }

    /// Advance money still sitting with treasurers.
    pub fn total_advance_held(&self) -> Cents {
        self.members.iter().map(|m| m.advance_held).sum()
    }

    pub fn is_settled(&self) -> bool {
        self.outstanding.is_empty()
    }
}

/// Reconcile the ledger into per-member figures.
pub fn compute_summary(ledger: &Ledger) -> Result<TripSummary, LedgerError> {
    reconcile(ledger.members(), ledger.events())
}

/// Outstanding pairwise debt `from` owes `to` given everything recorded so far.
pub fn outstanding_debt(ledger: &Ledger, from: &str, to: &str) -> Result<Cents, LedgerError> {
    Ok(compute_summary(ledger)?.debt(from, to))
}

/// Pure reconciliation over a member set and an event log, processed in
/// order. Settlements larger than the outstanding debt are clamped to it.
/// Fails with [`LedgerError::AmountOverflow`] when a total leaves `i64`.
pub fn reconcile(members: &[Member], events: &[Event]) -> Result<TripSummary, LedgerError> {
    let mut reconciler = Reconciler::new(members);
    for event in events {
        reconciler.apply(event)?;
    }
    reconciler.finish()
}

/// Remaining advance per (treasurer, contributor), with each treasurer's
/// contributors kept in the order of their first advance.
#[derive(Debug, Default)]
struct AdvancePools {
    remaining: HashMap<(usize, usize), Cents>,
    contributors: HashMap<usize, Vec<usize>>,
}

impl AdvancePools {
    fn deposit(
        &mut self,
        treasurer: usize,
        contributor: usize,
        amount: Cents,
    ) -> Result<(), LedgerError> {
        if !self.remaining.contains_key(&(treasurer, contributor)) {
            self.contributors
                .entry(treasurer)
                .or_default()
                .push(contributor);
        }
        credit(
            self.remaining.entry((treasurer, contributor)).or_insert(0),
            amount,
        )
    }

    /// Take up to `wanted` from one pool, returning what was taken.
    fn draw(&mut self, treasurer: usize, contributor: usize, wanted: Cents) -> Cents {
        match self.remaining.get_mut(&(treasurer, contributor)) {
            Some(pool) if *pool > 0 && wanted > 0 => {
                let used = wanted.min(*pool);
                *pool -= used;
                used
            }
            _ => 0,
        }
    }

    fn contributors_of(&self, treasurer: usize) -> Vec<usize> {
        self.contributors
            .get(&treasurer)
            .cloned()
            .unwrap_or_default()
    }
}

/// Square matrix of who owes whom, kept netted per pair.
#[derive(Debug)]
struct DebtMatrix {
    owed: Vec<Vec<Cents>>,
}

impl DebtMatrix {
    fn new(size: usize) -> Self {
        Self {
            owed: vec![vec![0; size]; size],
        }
    }

    /// Add a debt, first cancelling whatever the creditor owes the debtor.
    fn add(&mut self, debtor: usize, creditor: usize, amount: Cents) -> Result<(), LedgerError> {
        if debtor == creditor || amount <= 0 {
            return Ok(());
        }
        let offset = self.owed[creditor][debtor].min(amount);
        self.owed[creditor][debtor] -= offset;
        credit(&mut self.owed[debtor][creditor], amount - offset)
    }

    /// Pay down a debt, never below zero. Returns the amount applied.
    fn pay(&mut self, debtor: usize, creditor: usize, amount: Cents) -> Cents {
        let applied = self.owed[debtor][creditor].min(amount).max(0);
        self.owed[debtor][creditor] -= applied;
        applied
    }
}

struct Reconciler<'a> {
    index: HashMap<&'a str, usize>,
    rows: Vec<MemberSummary>,
    pools: AdvancePools,
    debts: DebtMatrix,
    // Money moved by all events so far; bounds every total derived from the log
    volume: Cents,
}

impl<'a> Reconciler<'a> {
    fn new(members: &'a [Member]) -> Self {
        Self {
            index: members
                .iter()
                .enumerate()
                .map(|(i, m)| (m.name.as_str(), i))
                .collect(),
            rows: members.iter().map(|m| empty_row(&m.name)).collect(),
            pools: AdvancePools::default(),
            debts: DebtMatrix::new(members.len()),
            volume: 0,
        }
    }

    fn lookup(&self, event: &Event, name: &str) -> Result<usize, LedgerError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| LedgerError::InconsistentLedger {
                sequence: event.sequence,
                member: name.to_string(),
            })
    }

    fn apply(&mut self, event: &Event) -> Result<(), LedgerError> {
        credit(&mut self.volume, event.amount_cents())?;
        match &event.kind {
            EventKind::Advance {
                from,
                to,
                amount_cents,
            } => {
                let from = self.lookup(event, from)?;
                let to = self.lookup(event, to)?;
                self.pools.deposit(to, from, *amount_cents)?;
                credit(&mut self.rows[from].advance_given, *amount_cents)?;
                credit(&mut self.rows[to].advance_received, *amount_cents)?;
            }

            EventKind::Expense {
                payer,
                amount_cents,
                participants,
                ..
            } => {
                let payer = self.lookup(event, payer)?;
                let participants = participants
                    .iter()
                    .map(|p| self.lookup(event, p))
                    .collect::<Result<Vec<_>, _>>()?;
                self.apply_expense(payer, *amount_cents, &participants)?;
            }

            EventKind::Settlement {
                from,
                to,
                amount_cents,
                ..
            } => {
                let from = self.lookup(event, from)?;
                let to = self.lookup(event, to)?;
                let applied = self.debts.pay(from, to, *amount_cents);
                credit(&mut self.rows[from].settlements_paid, applied)?;
                credit(&mut self.rows[to].settlements_received, applied)?;
            }
        }
        Ok(())
    }

    /// Each share is funded, in order, by the participant's own advance held
    /// by the payer, then by other contributors' advances at the payer (first
    /// given, first used), then by the payer's own pocket. A payer without
    /// pools funds everything; a payer's own uncovered share borrows from the
    /// pools like anyone else's.
    fn apply_expense(
        &mut self,
        payer: usize,
        amount: Cents,
        participants: &[usize],
    ) -> Result<(), LedgerError> {
        let contributors = self.pools.contributors_of(payer);
        let shares = split_evenly(amount, participants.len());
        let mut consumed = 0;

        for (&person, &share) in participants.iter().zip(&shares) {
            let mut remaining = share;
            remaining -= self.pools.draw(payer, person, remaining);

            for &contributor in &contributors {
                if remaining == 0 {
                    break;
                }
                if contributor == person {
                    continue;
                }
                let used = self.pools.draw(payer, contributor, remaining);
                if used > 0 {
                    remaining -= used;
                    self.debts.add(person, contributor, used)?;
                    credit(&mut self.rows[contributor].advance_used_by_others, used)?;
                    credit(&mut self.rows[person].advance_used_from_others, used)?;
                }
            }

            if remaining > 0 && person != payer {
                self.debts.add(person, payer, remaining)?;
            }

            // Draws never exceed the shares, which sum to `amount`
            consumed += share - remaining;
            credit(&mut self.rows[person].share_owed, share)?;
        }

        credit(&mut self.rows[payer].expenses_paid, amount - consumed)
    }

    fn finish(mut self) -> Result<TripSummary, LedgerError> {
        for (&(treasurer, contributor), &remaining) in &self.pools.remaining {
            credit(&mut self.rows[contributor].advance_balance, remaining)?;
            credit(&mut self.rows[treasurer].advance_held, remaining)?;
        }

        let size = self.rows.len();
        let mut outstanding = Vec::new();
        for debtor in 0..size {
            for creditor in 0..size {
                let amount = self.debts.owed[debtor][creditor];
                if amount > 0 {
                    credit(&mut self.rows[debtor].dues, amount)?;
                    credit(&mut self.rows[creditor].gets_back, amount)?;
                    outstanding.push(Debt {
                        debtor: self.rows[debtor].name.clone(),
                        creditor: self.rows[creditor].name.clone(),
                        amount_cents: amount,
                    });
                }
            }
        }

        for row in &mut self.rows {
            row.paid = row
                .expenses_paid
                .checked_add(row.settlements_paid)
                .ok_or(LedgerError::AmountOverflow)?;
            row.net = row
                .gets_back
                .checked_sub(row.dues)
                .ok_or(LedgerError::AmountOverflow)?;
            row.status = if row.gets_back == 0 && row.dues == 0 {
                SettlementStatus::Settled
            } else {
                SettlementStatus::Pending
            };
        }

        Ok(TripSummary {
            members: self.rows,
            outstanding,
        })
    }
}

fn credit(total: &mut Cents, amount: Cents) -> Result<(), LedgerError> {
    *total = total
        .checked_add(amount)
        .ok_or(LedgerError::AmountOverflow)?;
    Ok(())
}

fn empty_row(name: &str) -> MemberSummary {
    MemberSummary {
        name: name.to_string(),
        advance_given: 0,
        advance_received: 0,
        advance_used_by_others: 0,
        advance_used_from_others: 0,
        advance_balance: 0,
        advance_held: 0,
        expenses_paid: 0,
        settlements_paid: 0,
        settlements_received: 0,
        paid: 0,
        share_owed: 0,
        gets_back: 0,
        dues: 0,
        net: 0,
        status: SettlementStatus::Settled,
    }
}
