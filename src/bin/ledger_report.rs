use chrono::{DateTime, Datelike, Utc};
use clap::error::ErrorKind;
use clap::{ArgGroup, CommandFactory, Parser};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tithe_core::domains::analytics::{AggregateSummary, DonorRollup};
use tithe_core::domains::donation::{
    cents_to_decimal, DonorProfile, InMemoryDonationRepository, InMemoryDonorDirectory, LedgerService,
    LedgerServiceImpl, RawDonationRecord, SkippedRecord,
};
use tithe_core::domains::view::ViewQuery;
use tithe_core::{LedgerConfig, LedgerOwner};

#[derive(Parser)]
#[command(
    name = "ledger_report",
    version,
    about = "Offline giving report over an exported donation file",
    long_about = "Summarize an exported donation file for one payee or donor.\n\n\
                  Prints the dashboard summary, a month-by-month table and the rows\n\
                  that could not be read. Payee reports can also export donor rollups to CSV."
)]
#[command(group(ArgGroup::new("owner").required(true).args(["payee", "donor"])))]
struct Cli {
    /// JSON array of raw donation records.
    #[arg(value_name = "RECORDS")]
    records: PathBuf,

    /// Report on donations received by this payee (church) id.
    #[arg(long, value_name = "ID")]
    payee: Option<String>,

    /// Report on donations given by this donor id.
    #[arg(long, value_name = "ID")]
    donor: Option<String>,

    /// JSON array of donor profiles used for display names.
    #[arg(long, value_name = "PROFILES")]
    names: Option<PathBuf>,

    /// Report as of this instant instead of the system clock.
    #[arg(long, value_name = "RFC3339", value_parser = parse_now)]
    now: Option<DateTime<Utc>>,

    /// Write donor rollups to this CSV file (payee reports only).
    #[arg(long, value_name = "OUT_CSV")]
    csv: Option<PathBuf>,
}

impl Cli {
    fn owner(&self) -> Option<LedgerOwner> {
        self.payee
            .clone()
            .map(LedgerOwner::Payee)
            .or_else(|| self.donor.clone().map(LedgerOwner::Donor))
    }
}

fn parse_now(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 instant: {}", e))
}

#[derive(Serialize)]
struct RollupRow<'a> {
    donor_id: &'a str,
    display_name: &'a str,
    total: rust_decimal::Decimal,
    donation_count: u64,
    last_donation_at: String,
}

fn write_csv(path: &Path, rollups: &[DonorRollup]) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    for rollup in rollups {
        writer.serialize(RollupRow {
            donor_id: &rollup.donor_id,
            display_name: rollup.label(),
            total: cents_to_decimal(rollup.total_cents),
            donation_count: rollup.donation_count,
            last_donation_at: rollup.last_donation_at.to_rfc3339(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn print_summary(summary: &AggregateSummary) {
    println!("\n📊 SUMMARY");
    println!("==========");
    println!("This month:     {}", cents_to_decimal(summary.current_period_total_cents));
    println!("Last month:     {}", cents_to_decimal(summary.prior_period_total_cents));
    match summary.growth_percent {
        Some(growth) => println!("Growth:         {:+.1}%", growth),
        None => println!("Growth:         n/a (no prior baseline)"),
    }
    println!("This year:      {}", cents_to_decimal(summary.year_total_cents));
    println!("Lifetime:       {}", cents_to_decimal(summary.lifetime_total_cents));
    println!("Donors:         {} ({} recurring)", summary.distinct_donor_count, summary.recurring_donor_count);
    println!("Transactions:   {}", summary.transaction_count);
    if let Some(average) = summary.average_donation_cents {
        println!("Average gift:   {}", cents_to_decimal(average));
    }
    println!(
        "Excluded:       {} pending, {} failed",
        summary.excluded.pending, summary.excluded.failed
    );
}

fn print_skipped(skipped: &[SkippedRecord]) {
    if skipped.is_empty() {
        println!("\n✅ Every record was readable");
        return;
    }
    println!("\n⚠️  {} records could not be read", skipped.len());
    for record in skipped {
        println!(
            "   - #{} {}: {}",
            record.index,
            record.record_id.as_deref().unwrap_or("<no id>"),
            record.reason
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();

    let args = Cli::parse();
    let Some(owner) = args.owner() else {
        Cli::command()
            .error(ErrorKind::MissingRequiredArgument, "one of --payee or --donor is required")
            .exit();
    };

    let config = LedgerConfig::from_env()?;
    let records: Vec<RawDonationRecord> = serde_json::from_str(&fs::read_to_string(&args.records)?)?;
    let profiles: Vec<DonorProfile> = match &args.names {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => Vec::new(),
    };
    let now = args.now.unwrap_or_else(Utc::now);

    println!("🔍 Ledger Report");
    println!("================");
    println!("Records file:   {} ({} rows)", args.records.display(), records.len());
    println!("Owner:          {}", owner);
    println!("As of:          {} (offset {})", now.to_rfc3339(), config.utc_offset);

    let service = LedgerServiceImpl::new(
        Arc::new(InMemoryDonationRepository::new(records)),
        Arc::new(InMemoryDonorDirectory::new(profiles)),
        config,
    );

    let (summary, months) = futures::try_join!(
        service.giving_summary(&owner, now),
        service.monthly_breakdown(&owner, now.year()),
    )?;

    print_summary(&summary.data);

    println!("\n📅 {} BY MONTH", now.year());
    for month in &months.data {
        println!("   {:>2}: {:>12} ({} gifts)", month.month, cents_to_decimal(month.total_cents), month.transaction_count);
    }

    if let LedgerOwner::Payee(payee_id) = &owner {
        let rollups = service.donor_rollups(payee_id, &ViewQuery::new(), now).await?;
        println!("\n🙏 TOP DONORS");
        for rollup in rollups.data.iter().take(10) {
            println!(
                "   {:<24} {:>12} ({} gifts)",
                rollup.label(),
                cents_to_decimal(rollup.total_cents),
                rollup.donation_count
            );
        }
        if let Some(path) = &args.csv {
            write_csv(path, &rollups.data)?;
            log::info!("Wrote {} donor rollups to {}", rollups.data.len(), path.display());
        }
    } else if args.csv.is_some() {
        log::warn!("--csv only applies to --payee reports; skipping export");
    }

    print_skipped(&summary.skipped);

    Ok(())
}
