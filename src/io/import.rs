use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::io::Read;
use uuid::Uuid;

use crate::domain::{Event, EventKind, Ledger};
use crate::io::export::{PARTICIPANT_SEPARATOR, TripSnapshot};

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub imported: usize,
    pub members_created: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
    pub create_missing_members: bool,
}

/// A trip rebuilt from a JSON snapshot
#[derive(Debug)]
pub struct SnapshotImport {
    pub ledger: Ledger,
    pub snapshot: TripSnapshot,
    /// False when the stored summary differs from the recomputed one
    pub summary_matches: bool,
}

/// Importer for replaying exported events into a ledger
pub struct Importer<'a> {
    ledger: &'a mut Ledger,
}

impl<'a> Importer<'a> {
    pub fn new(ledger: &'a mut Ledger) -> Self {
        Self { ledger }
    }

    /// Append events from CSV in file order. Rows that fail validation are
    /// reported and skipped; later rows still see every row applied before
    /// them. A dry run replays into a scratch copy and leaves the ledger as is.
    pub fn import_events_csv<R: Read>(
        &mut self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut scratch;
        let target: &mut Ledger = if options.dry_run {
            scratch = self.ledger.clone();
            &mut scratch
        } else {
            &mut *self.ledger
        };

        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut result = ImportResult::default();

        for (line_num, record) in csv_reader.records().enumerate() {
            let line = line_num + 2; // +2 for header and 0-indexing

            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    result.errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            let event = match parse_event_record(&record) {
                Ok(event) => event,
                Err((field, error)) => {
                    tracing::warn!(line, field, %error, "skipping event row");
                    result.errors.push(ImportError {
                        line,
                        field: Some(field.to_string()),
                        error,
                    });
                    continue;
                }
            };

            match apply_row(target, event, options.create_missing_members) {
                Ok(created) => {
                    result.imported += 1;
                    result.members_created += created;
                }
                Err((field, error)) => {
                    tracing::warn!(line, field, %error, "event rejected by ledger");
                    result.errors.push(ImportError {
                        line,
                        field: field.map(String::from),
                        error,
                    });
                }
            }
        }

        Ok(result)
    }
}

/// Rebuild a trip from a JSON snapshot, replaying its event log and checking
/// the recomputed summary against the stored one.
pub fn import_full_json<R: Read>(reader: R) -> Result<SnapshotImport> {
    let snapshot: TripSnapshot =
        serde_json::from_reader(reader).context("Invalid trip snapshot JSON")?;
    let ledger = snapshot
        .restore()
        .context("Snapshot event log does not replay")?;
    let summary_matches = snapshot.summary_matches(&ledger)?;

    Ok(SnapshotImport {
        ledger,
        snapshot,
        summary_matches,
    })
}

type FieldError = (&'static str, String);

/// Apply one parsed row, registering the members it names first when asked
/// to. The row lands whole or not at all: members created for a rejected
/// event are discarded with it. Returns how many members were created.
fn apply_row(
    target: &mut Ledger,
    event: Event,
    create_missing_members: bool,
) -> Result<usize, (Option<&'static str>, String)> {
    let missing: Vec<String> = if create_missing_members {
        let mut missing: Vec<String> = Vec::new();
        for name in event.member_refs() {
            if !target.contains_member(name) && !missing.iter().any(|m| m == name) {
                missing.push(name.to_string());
            }
        }
        missing
    } else {
        Vec::new()
    };

    if missing.is_empty() {
        target
            .apply(event)
            .map_err(|e| (None, format!("Event rejected: {}", e)))?;
        return Ok(0);
    }

    let mut staged = target.clone();
    for name in &missing {
        staged
            .add_member(name.clone())
            .map_err(|e| (Some("member"), format!("Cannot create member: {}", e)))?;
    }
    staged
        .apply(event)
        .map_err(|e| (None, format!("Event rejected: {}", e)))?;

    *target = staged;
    Ok(missing.len())
}

fn parse_event_record(record: &csv::StringRecord) -> Result<Event, FieldError> {
    // Names and free text are taken verbatim so they survive a round trip
    let raw = |i: usize| record.get(i).unwrap_or("");
    let field = |i: usize| raw(i).trim();

    let amount_cents: i64 = field(6)
        .parse()
        .map_err(|e| ("amount_cents", format!("Invalid amount: {}", e)))?;

    let kind = match field(2) {
        "advance" => EventKind::Advance {
            from: raw(4).to_string(),
            to: raw(5).to_string(),
            amount_cents,
        },
        "expense" => EventKind::Expense {
            payer: raw(4).to_string(),
            amount_cents,
            participants: raw(7)
                .split(PARTICIPANT_SEPARATOR)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            description: raw(8).to_string(),
        },
        "settlement" => EventKind::Settlement {
            from: raw(4).to_string(),
            to: raw(5).to_string(),
            amount_cents,
            note: Some(raw(8))
                .filter(|s| !s.is_empty())
                .map(String::from),
        },
        other => return Err(("kind", format!("Unknown event kind: '{}'", other))),
    };

    let mut event = Event::new(kind);

    if !field(1).is_empty() {
        event.id =
            Uuid::parse_str(field(1)).map_err(|e| ("id", format!("Invalid event id: {}", e)))?;
    }
    if !field(3).is_empty() {
        event.recorded_at = parse_timestamp(field(3))
            .map_err(|e| ("recorded_at", format!("Invalid timestamp: {}", e)))?;
    }

    Ok(event)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let dt = DateTime::parse_from_rfc3339(s)?;
    Ok(dt.with_timezone(&Utc))
}
