use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{Read, Write, stdin, stdout};
use std::path::PathBuf;

use crate::application::{MemberDetail, TripService};
use crate::config::Config;
use crate::domain::{
    Cents, Debt, MemberSummary, TripSummary, format_cents, format_money, parse_cents,
};
use crate::io::{DebtView, ImportOptions};

/// tripsplit - Shared trip expense ledger
#[derive(Parser)]
#[command(name = "tripsplit")]
#[command(about = "Track trip advances, shared expenses and settlements, and work out who owes whom")]
#[command(version)]
pub struct Cli {
    /// Trip file path [env: TRIPSPLIT_FILE, default: trip.json]
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Currency label for a new trip [env: TRIPSPLIT_CURRENCY, default: Rs.]
    #[arg(long, global = true)]
    pub currency: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new trip file
    Init {
        /// Trip name
        #[arg(short, long, default_value = "Trip 1")]
        name: String,
    },

    /// Member management commands
    #[command(subcommand)]
    Member(MemberCommands),

    /// Record an advance handed to a treasurer
    Advance {
        /// Amount (e.g., "3000" or "3000.00")
        amount: String,

        /// Member giving the advance
        #[arg(long)]
        from: String,

        /// Treasurer receiving the advance
        #[arg(long)]
        to: String,
    },

    /// Record an expense shared by some or all members
    Expense {
        /// Amount (e.g., "900" or "900.50")
        amount: String,

        /// Member who paid
        #[arg(long)]
        payer: String,

        /// Comma-separated participants (all members if omitted)
        #[arg(long, value_delimiter = ',')]
        shared_by: Option<Vec<String>>,

        /// What the money was spent on
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Record a settlement payment between two members
    Settle {
        /// Amount (settles the full outstanding debt if omitted)
        amount: Option<String>,

        /// Member paying
        #[arg(long)]
        from: String,

        /// Member being paid
        #[arg(long)]
        to: String,

        /// Free-form note (e.g., "UPI", "cash")
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Per-member balance summary
    Summary {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show detailed information for one member
    Show {
        /// Member name
        name: String,
    },

    /// Show who owes whom
    Debts {
        /// Show the minimal settlement plan instead of pairwise debts
        #[arg(long)]
        plan: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Activity history, one line per event
    History,

    /// Export data to CSV or JSON
    Export {
        /// What to export: events, summary, debts, plan, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format: csv, json (default: csv for most types, json for full)
        #[arg(short = 'F', long)]
        format: Option<String>,
    },

    /// Import data from CSV or JSON
    Import {
        /// What to import: events, full
        import_type: String,

        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Preview without importing
        #[arg(long)]
        dry_run: bool,

        /// Create members that don't exist
        #[arg(long)]
        create_members: bool,

        /// Replace an existing trip file (full import only)
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum MemberCommands {
    /// Add a member to the trip
    Add {
        /// Member name (must be unique)
        name: String,
    },

    /// List members in registration order
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl Cli {
    pub fn config(&self) -> Config {
        Config::load(self.file.clone(), self.currency.clone())
    }

    pub fn run(self) -> Result<()> {
        let config = self.config();
        let path = config.trip_file.as_path();

        match self.command {
            Commands::Init { name } => {
                let service = TripService::init(path, &name, &config.currency_label)?;
                println!(
                    "Trip '{}' initialized: {}",
                    service.ledger().name(),
                    service.path().display()
                );
            }

            Commands::Member(member_cmd) => {
                let mut service = TripService::open(path)?;
                run_member_command(&mut service, member_cmd)?;
            }

            Commands::Advance { amount, from, to } => {
                let mut service = TripService::open(path)?;
                let amount_cents = parse_amount(&amount)?;
                let result = service.record_advance(&from, &to, amount_cents)?;
                println!("Recorded {} (#{})", result.line, result.event.sequence);
            }

            Commands::Expense {
                amount,
                payer,
                shared_by,
                description,
            } => {
                let mut service = TripService::open(path)?;
                let amount_cents = parse_amount(&amount)?;
                let participants = shared_by.map(|names| {
                    names
                        .into_iter()
                        .map(|n| n.trim().to_string())
                        .filter(|n| !n.is_empty())
                        .collect()
                });
                let result = service.record_expense(
                    &payer,
                    amount_cents,
                    participants,
                    description.as_deref().unwrap_or_default(),
                )?;
                println!("Recorded {} (#{})", result.line, result.event.sequence);
            }

            Commands::Settle {
                amount,
                from,
                to,
                note,
            } => {
                let mut service = TripService::open(path)?;
                let amount_cents = amount.as_deref().map(parse_amount).transpose()?;
                let result = service.record_settlement(&from, &to, amount_cents, note)?;
                println!("Recorded {} (#{})", result.line, result.event.sequence);
                if result.remaining > 0 {
                    println!(
                        "  {} still owes {} {}",
                        from,
                        to,
                        format_money(service.ledger().currency(), result.remaining)
                    );
                } else {
                    println!("  {} and {} are settled", from, to);
                }
            }

            Commands::Summary { format } => {
                let service = TripService::open(path)?;
                run_summary_command(&service, format)?;
            }

            Commands::Show { name } => {
                let service = TripService::open(path)?;
                let detail = service.member_detail(&name)?;
                print_member_detail(&detail, service.ledger().currency());
            }

            Commands::Debts { plan, format } => {
                let service = TripService::open(path)?;
                run_debts_command(&service, plan, format)?;
            }

            Commands::History => {
                let service = TripService::open(path)?;
                let history = service.history();
                if history.is_empty() {
                    println!("No activity yet.");
                } else {
                    for entry in history {
                        println!(
                            "{:>4}  {}  {}",
                            entry.sequence,
                            entry.recorded_at.format("%Y-%m-%d %H:%M"),
                            entry.line
                        );
                    }
                }
            }

            Commands::Export {
                export_type,
                output,
                format,
            } => {
                let service = TripService::open(path)?;
                run_export_command(&service, &export_type, output.as_deref(), format.as_deref())?;
            }

            Commands::Import {
                import_type,
                input,
                dry_run,
                create_members,
                force,
            } => {
                run_import_command(
                    path,
                    &import_type,
                    input.as_deref(),
                    ImportOptions {
                        dry_run,
                        create_missing_members: create_members,
                    },
                    force,
                )?;
            }
        }

        Ok(())
    }
}

fn parse_amount(amount: &str) -> Result<Cents> {
    parse_cents(amount).with_context(|| {
        format!(
            "Invalid amount '{}'. Use '3000' or '3000.50' (at most two decimals)",
            amount
        )
    })
}

fn run_member_command(service: &mut TripService, cmd: MemberCommands) -> Result<()> {
    match cmd {
        MemberCommands::Add { name } => {
            let member = service.add_member(&name)?;
            println!("Added member: {}", member.name);
        }

        MemberCommands::List => {
            let members = service.ledger().members();
            if members.is_empty() {
                println!("No members yet.");
            } else {
                println!("{:<4} {:<20} {:<20}", "#", "NAME", "JOINED");
                println!("{}", "-".repeat(46));
                for (i, member) in members.iter().enumerate() {
                    println!(
                        "{:<4} {:<20} {:<20}",
                        i + 1,
                        truncate(&member.name, 20),
                        member.joined_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }
    }
    Ok(())
}

fn run_summary_command(service: &TripService, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let report = service.report()?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Csv => {
            service.export_summary_csv(stdout())?;
        }
        OutputFormat::Table => {
            let summary = service.summary()?;
            print_summary_table(service, &summary);
        }
    }
    Ok(())
}

fn print_summary_table(service: &TripService, summary: &TripSummary) {
    let ledger = service.ledger();
    println!("{} ({})", ledger.name(), ledger.currency());
    println!();

    if summary.members.is_empty() {
        println!("No members yet.");
        return;
    }

    println!(
        "{:<15} {:>12} {:>12} {:>12} {:>12} {:>12} {:<8}",
        "MEMBER", "ADVANCE", "SHARE", "PAID", "DUES", "NET", "STATUS"
    );
    println!("{}", "-".repeat(90));
    for row in &summary.members {
        print_summary_row(row);
    }
    println!("{}", "-".repeat(90));

    let held = summary.total_advance_held();
    if held > 0 {
        println!(
            "Advance still held by treasurers: {}",
            format_money(ledger.currency(), held)
        );
    }
    if summary.is_settled() {
        println!("Everyone is settled.");
    }
}

fn print_summary_row(row: &MemberSummary) {
    println!(
        "{:<15} {:>12} {:>12} {:>12} {:>12} {:>12} {:<8}",
        truncate(&row.name, 15),
        format_cents(row.advance_given),
        format_cents(row.share_owed),
        format_cents(row.paid),
        format_cents(row.dues),
        format_cents(row.net),
        row.status
    );
}

fn print_member_detail(detail: &MemberDetail, currency: &str) {
    let s = &detail.summary;

    println!("Member: {}", s.name);
    println!("  Status:           {}", s.status);
    println!();
    println!("  Advance given:    {}", format_money(currency, s.advance_given));
    println!("  Used by others:   {}", format_money(currency, s.advance_used_by_others));
    println!("  Advance balance:  {}", format_money(currency, s.advance_balance));
    if s.advance_received > 0 {
        println!("  Advance received: {}", format_money(currency, s.advance_received));
        println!("  Advance held:     {}", format_money(currency, s.advance_held));
    }
    println!("  Used from others: {}", format_money(currency, s.advance_used_from_others));
    println!("  Expenses paid:    {}", format_money(currency, s.expenses_paid));
    println!("  Settlements paid: {}", format_money(currency, s.settlements_paid));
    println!("  Settlements recv: {}", format_money(currency, s.settlements_received));
    println!("  Share owed:       {}", format_money(currency, s.share_owed));
    println!();
    println!("  Gets back:        {}", format_money(currency, s.gets_back));
    println!("  Dues:             {}", format_money(currency, s.dues));
    println!("  Net:              {}", format_money(currency, s.net));

    if !detail.owes_to.is_empty() {
        println!();
        println!("  Owes:");
        for debt in &detail.owes_to {
            println!(
                "    - {:<15} {:>12}",
                truncate(&debt.creditor, 15),
                format_cents(debt.amount_cents)
            );
        }
    }
    if !detail.gets_from.is_empty() {
        println!();
        println!("  Gets back from:");
        for debt in &detail.gets_from {
            println!(
                "    - {:<15} {:>12}",
                truncate(&debt.debtor, 15),
                format_cents(debt.amount_cents)
            );
        }
    }

    if !detail.activity.is_empty() {
        println!();
        println!("  Activity:");
        for entry in &detail.activity {
            println!("    #{:<4} {}", entry.sequence, entry.line);
        }
    }
}

fn run_debts_command(service: &TripService, plan: bool, format: OutputFormat) -> Result<()> {
    let (view, debts) = if plan {
        (DebtView::Plan, service.settlement_plan()?)
    } else {
        (DebtView::Outstanding, service.summary()?.outstanding)
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&debts)?);
        }
        OutputFormat::Csv => {
            service.export_debts_csv(stdout(), view)?;
        }
        OutputFormat::Table => print_debts_table(&debts, plan),
    }
    Ok(())
}

fn print_debts_table(debts: &[Debt], plan: bool) {
    if debts.is_empty() {
        println!("Nothing outstanding. Everyone is settled.");
        return;
    }

    if plan {
        println!("Settlement plan ({} payment(s))", debts.len());
    } else {
        println!("Outstanding debts");
    }
    println!();
    println!("{:<15} {:<15} {:>12}", "FROM", "TO", "AMOUNT");
    println!("{}", "-".repeat(44));
    for debt in debts {
        println!(
            "{:<15} {:<15} {:>12}",
            truncate(&debt.debtor, 15),
            truncate(&debt.creditor, 15),
            format_cents(debt.amount_cents)
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportKind {
    Events,
    Summary,
    Debts,
    Plan,
    Full,
}

/// Resolve the export type and output format before anything is written.
fn export_kind(export_type: &str, format: Option<&str>) -> Result<ExportKind> {
    let kind = match export_type {
        "events" => ExportKind::Events,
        "summary" => ExportKind::Summary,
        "debts" => ExportKind::Debts,
        "plan" => ExportKind::Plan,
        "full" => ExportKind::Full,
        _ => anyhow::bail!(
            "Invalid export type '{}'. Valid types: events, summary, debts, plan, full",
            export_type
        ),
    };

    let expected = if kind == ExportKind::Full { "json" } else { "csv" };
    let format = format.unwrap_or(expected);
    if format != expected {
        anyhow::bail!(
            "Format '{}' is not available for '{}' (full exports json, everything else csv)",
            format,
            export_type
        );
    }
    Ok(kind)
}

fn run_export_command(
    service: &TripService,
    export_type: &str,
    output: Option<&str>,
    format: Option<&str>,
) -> Result<()> {
    let kind = export_kind(export_type, format)?;

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    let count = match kind {
        ExportKind::Events => service.export_events_csv(writer)?,
        ExportKind::Summary => service.export_summary_csv(writer)?,
        ExportKind::Debts => service.export_debts_csv(writer, DebtView::Outstanding)?,
        ExportKind::Plan => service.export_debts_csv(writer, DebtView::Plan)?,
        ExportKind::Full => {
            let snapshot = service.export_full_json(writer)?;
            snapshot.events.len()
        }
    };

    tracing::info!(export_type, count, "export finished");
    if let Some(path) = output {
        eprintln!("Exported {} {} record(s) to {}", count, export_type, path);
    }

    Ok(())
}

fn run_import_command(
    path: &std::path::Path,
    import_type: &str,
    input: Option<&str>,
    options: ImportOptions,
    force: bool,
) -> Result<()> {
    // Determine input reader
    let reader: Box<dyn Read> = match input {
        Some(file) => {
            let file =
                File::open(file).with_context(|| format!("Failed to open input file: {}", file))?;
            Box::new(file)
        }
        None => Box::new(stdin()),
    };

    match import_type {
        "events" => {
            let mut service = TripService::open(path)?;
            let dry_run = options.dry_run;
            let result = service.import_events_csv(reader, options)?;

            if dry_run {
                println!("Dry run complete (nothing saved)");
            } else {
                println!("Import complete");
            }
            println!("  Imported:        {}", result.imported);
            println!("  Members created: {}", result.members_created);
            println!("  Errors:          {}", result.errors.len());

            if !result.errors.is_empty() {
                println!("\nErrors:");
                for error in result.errors.iter().take(10) {
                    println!(
                        "  Line {}: {}",
                        error.line,
                        error
                            .field
                            .as_ref()
                            .map(|f| format!("{}: ", f))
                            .unwrap_or_default()
                            + &error.error
                    );
                }
                if result.errors.len() > 10 {
                    println!("  ... and {} more errors", result.errors.len() - 10);
                }
            }
        }
        "full" => {
            if options.dry_run {
                let imported = crate::io::import_full_json(reader)?;
                println!("Dry run complete (nothing saved)");
                println!("  Members: {}", imported.ledger.members().len());
                println!("  Events:  {}", imported.ledger.events().len());
                println!(
                    "  Summary: {}",
                    if imported.summary_matches {
                        "matches event log"
                    } else {
                        "DOES NOT MATCH event log"
                    }
                );
            } else {
                let service = TripService::import_snapshot(path, reader, force)?;
                println!("Imported trip '{}'", service.ledger().name());
                println!("  Members: {}", service.ledger().members().len());
                println!("  Events:  {}", service.ledger().events().len());
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid import type '{}'. Valid types: events, full",
                import_type
            );
        }
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
