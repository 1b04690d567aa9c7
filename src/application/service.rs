use std::io::{Read, Write};
use std::path::Path;

use crate::domain::{
    Cents, Debt, Event, Ledger, Member, TripSummary, compute_debt_matrix, compute_summary,
};
use crate::io::{DebtView, Exporter, ImportOptions, ImportResult, Importer, TripSnapshot};
use crate::storage::TripStore;

use super::{
    ActivityEntry, AppError, MemberDetail, TripReport, activity_history, build_report,
    member_detail,
};

/// Application service over one trip file.
/// This is the primary interface for any client (CLI, UI, exporters).
pub struct TripService {
    store: TripStore,
    ledger: Ledger,
}

/// Result of recording an event
#[derive(Debug, Clone)]
pub struct RecordResult {
    pub event: Event,
    pub line: String,
}

/// Result of a settlement, with what is still owed afterwards
#[derive(Debug, Clone)]
pub struct SettlementResult {
    pub event: Event,
    pub line: String,
    pub remaining: Cents,
}

impl TripService {
    /// Create a new, empty trip file.
    pub fn init(path: impl AsRef<Path>, name: &str, currency: &str) -> Result<Self, AppError> {
        let store = TripStore::new(path.as_ref());
        if store.exists() {
            return Err(AppError::TripAlreadyExists(store.path().to_path_buf()));
        }

        let ledger = Ledger::new(name, currency);
        store.save(&ledger)?;
        tracing::info!(path = %store.path().display(), trip = name, "trip created");

        Ok(Self { store, ledger })
    }

    /// Open an existing trip file, replaying its event log.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let store = TripStore::new(path.as_ref());
        if !store.exists() {
            return Err(AppError::TripNotFound(store.path().to_path_buf()));
        }

        let loaded = store.load()?;
        if !loaded.summary_matches {
            return Err(AppError::SummaryMismatch(store.path().to_path_buf()));
        }

        Ok(Self {
            store,
            ledger: loaded.ledger,
        })
    }

    /// Create a trip file from an exported JSON snapshot. An existing file is
    /// only replaced when `overwrite` is set.
    pub fn import_snapshot<R: Read>(
        path: impl AsRef<Path>,
        reader: R,
        overwrite: bool,
    ) -> Result<Self, AppError> {
        let store = TripStore::new(path.as_ref());
        if store.exists() && !overwrite {
            return Err(AppError::TripAlreadyExists(store.path().to_path_buf()));
        }

        let imported = crate::io::import_full_json(reader)?;
        if !imported.summary_matches {
            return Err(AppError::SummaryMismatch(store.path().to_path_buf()));
        }

        store.save(&imported.ledger)?;
        tracing::info!(
            path = %store.path().display(),
            events = imported.ledger.events().len(),
            "trip imported from snapshot"
        );

        Ok(Self {
            store,
            ledger: imported.ledger,
        })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    // ========================
    // Ledger operations
    // ========================

    pub fn add_member(&mut self, name: &str) -> Result<Member, AppError> {
        let member = self.commit(|ledger| Ok(ledger.add_member(name.trim())?.clone()))?;
        tracing::debug!(member = %member.name, "member added");
        Ok(member)
    }

    pub fn record_advance(
        &mut self,
        from: &str,
        to: &str,
        amount_cents: Cents,
    ) -> Result<RecordResult, AppError> {
        let event =
            self.commit(|ledger| Ok(ledger.record_advance(from, to, amount_cents)?.clone()))?;
        Ok(self.finish_record(event))
    }

    /// Record an expense. With no participants given, the expense is shared
    /// by every registered member.
    pub fn record_expense(
        &mut self,
        payer: &str,
        amount_cents: Cents,
        participants: Option<Vec<String>>,
        description: &str,
    ) -> Result<RecordResult, AppError> {
        let participants = participants.unwrap_or_else(|| {
            self.ledger
                .members()
                .iter()
                .map(|m| m.name.clone())
                .collect()
        });
        let event = self.commit(|ledger| {
            Ok(ledger
                .record_expense(payer, amount_cents, participants, description)?
                .clone())
        })?;
        Ok(self.finish_record(event))
    }

    /// Record a settlement. Without an amount, the full outstanding debt
    /// from `from` to `to` is settled.
    pub fn record_settlement(
        &mut self,
        from: &str,
        to: &str,
        amount_cents: Option<Cents>,
        note: Option<String>,
    ) -> Result<SettlementResult, AppError> {
        self.require_member(from)?;
        self.require_member(to)?;

        let owed = self.outstanding_debt(from, to)?;
        let amount_cents = match amount_cents {
            Some(amount) => amount,
            None if owed > 0 => owed,
            None => {
                return Err(AppError::NothingToSettle {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
        };

        let event = self.commit(|ledger| {
            Ok(ledger
                .record_settlement(from, to, amount_cents, note)?
                .clone())
        })?;
        let recorded = self.finish_record(event);

        Ok(SettlementResult {
            event: recorded.event,
            line: recorded.line,
            remaining: owed - amount_cents,
        })
    }

    // ========================
    // Queries
    // ========================

    pub fn summary(&self) -> Result<TripSummary, AppError> {
        Ok(compute_summary(&self.ledger)?)
    }

    pub fn settlement_plan(&self) -> Result<Vec<Debt>, AppError> {
        Ok(compute_debt_matrix(&self.ledger)?)
    }

    pub fn outstanding_debt(&self, from: &str, to: &str) -> Result<Cents, AppError> {
        Ok(self.summary()?.debt(from, to))
    }

    pub fn member_detail(&self, name: &str) -> Result<MemberDetail, AppError> {
        member_detail(&self.ledger, name)?.ok_or_else(|| AppError::MemberNotFound(name.to_string()))
    }

    pub fn history(&self) -> Vec<ActivityEntry> {
        activity_history(&self.ledger)
    }

    pub fn report(&self) -> Result<TripReport, AppError> {
        Ok(build_report(&self.ledger)?)
    }

    // ========================
    // Export / import
    // ========================

    pub fn export_events_csv<W: Write>(&self, writer: W) -> Result<usize, AppError> {
        Ok(Exporter::new(&self.ledger).export_events_csv(writer)?)
    }

    pub fn export_summary_csv<W: Write>(&self, writer: W) -> Result<usize, AppError> {
        Ok(Exporter::new(&self.ledger).export_summary_csv(writer)?)
    }

    pub fn export_debts_csv<W: Write>(&self, writer: W, view: DebtView) -> Result<usize, AppError> {
        Ok(Exporter::new(&self.ledger).export_debts_csv(writer, view)?)
    }

    pub fn export_full_json<W: Write>(&self, writer: W) -> Result<TripSnapshot, AppError> {
        Ok(Exporter::new(&self.ledger).export_full_json(writer)?)
    }

    /// Append events from CSV; the trip file is only rewritten when
    /// something was actually imported. The imported rows only become
    /// visible once the file has been written.
    pub fn import_events_csv<R: Read>(
        &mut self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult, AppError> {
        let dry_run = options.dry_run;
        let mut staged = self.ledger.clone();
        let result = Importer::new(&mut staged).import_events_csv(reader, options)?;

        if !dry_run && (result.imported > 0 || result.members_created > 0) {
            self.store.save(&staged)?;
            self.ledger = staged;
        }
        tracing::info!(
            imported = result.imported,
            members_created = result.members_created,
            errors = result.errors.len(),
            dry_run,
            "event import finished"
        );
        Ok(result)
    }

    fn require_member(&self, name: &str) -> Result<(), AppError> {
        if self.ledger.contains_member(name) {
            Ok(())
        } else {
            Err(AppError::MemberNotFound(name.to_string()))
        }
    }

    fn finish_record(&self, event: Event) -> RecordResult {
        tracing::debug!(
            sequence = event.sequence,
            kind = event.kind_str(),
            amount_cents = event.amount_cents(),
            "event recorded"
        );
        let line = event.describe(self.ledger.currency());
        RecordResult { event, line }
    }

    /// Apply `change` to a copy of the ledger and keep it only once the trip
    /// file has been saved. A failed change or a failed save leaves both the
    /// file and the in-memory ledger as they were.
    fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut Ledger) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut staged = self.ledger.clone();
        let value = change(&mut staged)?;
        self.store.save(&staged)?;
        self.ledger = staged;
        Ok(value)
    }
}
