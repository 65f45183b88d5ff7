use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use clinic_scout::harvest::{HarvestConfig, HarvestPipeline};
use clinic_scout::outreach::{self, OutreachConfig, OutreachPipeline, SmtpConfig, SmtpMailer};
use clinic_scout::places::PlacesConfig;

#[derive(Parser)]
#[command(
    name = "clinic-scout",
    version,
    about = "Collect clinic listings postcode by postcode and run e-mail outreach"
)]
struct Cli {
    /// More detailed logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Walk the postcode grid and collect clinic records into the CSV
    Harvest {
        /// Destination CSV, which is also the resume checkpoint
        #[arg(long, default_value = "clinics.csv")]
        csv: PathBuf,

        /// Workbook written once the walk finishes
        #[arg(long, default_value = "clinics.xlsx")]
        xlsx: PathBuf,

        /// First postcode of the grid
        #[arg(long, default_value_t = 28001)]
        from: u32,

        /// Last postcode of the grid, inclusive
        #[arg(long, default_value_t = 28080)]
        to: u32,

        /// What to search for
        #[arg(long, default_value = "clínica dental")]
        term: String,

        /// City appended to every query
        #[arg(long, default_value = "Madrid")]
        city: String,

        /// Milliseconds to wait between place detail fetches
        #[arg(long, default_value_t = 100)]
        detail_pause: u64,

        /// Milliseconds to wait between postcodes
        #[arg(long, default_value_t = 1_000)]
        grid_pause: u64,
    },

    /// Send the application e-mail to every secondary address in the CSV
    Outreach {
        /// Source CSV with Name and Email columns
        #[arg(long, default_value = "clinics.csv")]
        csv: PathBuf,

        /// File attached to every message
        #[arg(long, default_value = "CV.pdf")]
        attachment: PathBuf,

        /// Milliseconds to wait between messages
        #[arg(long, default_value_t = 10_000)]
        send_pause: u64,

        /// List the derived recipients without sending anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Command::Harvest {
            csv,
            xlsx,
            from,
            to,
            term,
            city,
            detail_pause,
            grid_pause,
        } => {
            let config = HarvestConfig {
                postcode_start: from,
                postcode_end: to,
                search_term: term,
                city,
                csv_path: csv,
                xlsx_path: xlsx,
                detail_pause: Duration::from_millis(detail_pause),
                grid_pause: Duration::from_millis(grid_pause),
                ..HarvestConfig::default()
            };
            run_harvest(config).await
        }
        Command::Outreach {
            csv,
            attachment,
            send_pause,
            dry_run,
        } => run_outreach(csv, attachment, Duration::from_millis(send_pause), dry_run).await,
    }
}

async fn run_harvest(config: HarvestConfig) -> anyhow::Result<()> {
    let places = PlacesConfig::from_env()?;

    eprintln!("clinic-scout v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Grid: {} to {} ({})",
        config.postcode_start, config.postcode_end, config.city
    );
    eprintln!("   Search: {}", config.search_term);
    eprintln!("   CSV: {}", config.csv_path.display());
    eprintln!("   Workbook: {}\n", config.xlsx_path.display());

    let pipeline = HarvestPipeline::new(config, places)?;
    let summary = pipeline.run().await?;

    println!("\nHarvest finished");
    println!("   Postcodes searched: {}", summary.searched);
    println!("   Already covered:    {}", summary.skipped);
    println!("   Without results:    {}", summary.no_results);
    println!("   Records saved:      {}", summary.saved);
    println!("   Scrape failures:    {}", summary.scrape_failures);
    Ok(())
}

async fn run_outreach(
    csv: PathBuf,
    attachment: PathBuf,
    send_pause: Duration,
    dry_run: bool,
) -> anyhow::Result<()> {
    if dry_run {
        let recipients = outreach::preview(&csv)?;
        println!("Would contact {} recipient(s):", recipients.len());
        for recipient in &recipients {
            println!("   {} <{}>", recipient.name, recipient.email);
        }
        return Ok(());
    }

    let smtp = SmtpConfig::from_env()?;
    let sender = smtp.username.clone();
    let mut config = OutreachConfig::from_env(csv, attachment);
    config.send_pause = send_pause;

    eprintln!("clinic-scout v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Relay: {}:{}", smtp.host, smtp.port);
    eprintln!("   Sender: {}", sender);
    eprintln!("   CSV: {}", config.csv_path.display());
    eprintln!("   Attachment: {}\n", config.attachment_path.display());

    let mailer = Box::new(SmtpMailer::new(&smtp)?);
    let pipeline = OutreachPipeline::new(config, &sender, mailer)?;
    let report = pipeline.run().await?;

    println!("\nDispatch finished");
    println!("   Attempted: {}", report.attempted);
    println!("   Sent:      {}", report.sent);
    println!("   Skipped:   {}", report.skipped);
    if let Some(reason) = report.auth_failure {
        anyhow::bail!("authentication failed, dispatch halted: {reason}");
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pacing_flags_override_the_defaults() {
        let cli = Cli::parse_from([
            "clinic-scout",
            "harvest",
            "--detail-pause",
            "0",
            "--grid-pause",
            "250",
        ]);
        match cli.command {
            Command::Harvest {
                detail_pause,
                grid_pause,
                ..
            } => {
                assert_eq!(detail_pause, 0);
                assert_eq!(grid_pause, 250);
            }
            Command::Outreach { .. } => panic!("parsed the wrong subcommand"),
        }

        let cli = Cli::parse_from(["clinic-scout", "outreach", "--send-pause", "500"]);
        match cli.command {
            Command::Outreach { send_pause, .. } => assert_eq!(send_pause, 500),
            Command::Harvest { .. } => panic!("parsed the wrong subcommand"),
        }
    }

    #[test]
    fn pacing_defaults_keep_the_standard_cadence() {
        let cli = Cli::parse_from(["clinic-scout", "harvest"]);
        match cli.command {
            Command::Harvest {
                detail_pause,
                grid_pause,
                ..
            } => {
                assert_eq!(detail_pause, 100);
                assert_eq!(grid_pause, 1_000);
            }
            Command::Outreach { .. } => panic!("parsed the wrong subcommand"),
        }

        let cli = Cli::parse_from(["clinic-scout", "outreach", "--dry-run"]);
        match cli.command {
            Command::Outreach { send_pause, .. } => assert_eq!(send_pause, 10_000),
            Command::Harvest { .. } => panic!("parsed the wrong subcommand"),
        }
    }
}
