use anyhow::Context;
use inpolreserve::cli::Cli;
use inpolreserve::config;
use inpolreserve::delay::JitterDelay;
use inpolreserve::logging;
use inpolreserve::models::ReservationOutcome;
use inpolreserve::service::ReservationService;
use inpolreserve::transport::HttpTransport;
use std::process::ExitCode;
use tracing::{info, warn};

/// Exit status when the run finished without reserving a slot.
const NOT_RESERVED: u8 = 3;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse_args();
    logging::init(cli.verbose);

    let config = config::load_config(cli.config.as_deref()).context("Failed to load config")?;
    let transport = HttpTransport::new().context("Failed to build HTTP client")?;
    let delay = JitterDelay::from_entropy(&config.delay);
    let mut service = ReservationService::new(&config, cli.credentials(), transport, delay)
        .context("Failed to prepare request headers")?;

    let report = service.run(cli.dry_run).context("Reservation run aborted")?;

    match report.outcome {
        None => {
            info!("Dry run finished, {} slot(s) found", report.listing.slots.len());
            Ok(ExitCode::SUCCESS)
        }
        Some(ReservationOutcome::Reserved { slot, attempts }) => {
            info!("Reserved slot {} after {} attempt(s)", slot, attempts);
            Ok(ExitCode::SUCCESS)
        }
        Some(ReservationOutcome::Exhausted { attempts }) => {
            warn!("All {} slot(s) were taken, nothing reserved", attempts);
            Ok(ExitCode::from(NOT_RESERVED))
        }
        Some(ReservationOutcome::NoSlots) => {
            warn!(
                "No slots available ({} date(s) skipped), nothing reserved",
                report.listing.skipped.len()
            );
            Ok(ExitCode::from(NOT_RESERVED))
        }
    }
}
