//! Passcode check and overview counts.

use shoebox_admin::ShoeboxConfig;
use shoebox_admin::auth::{PinError, PinGate};
use shoebox_admin::dashboard::DashboardStats;
use shoebox_admin::{DataError, DataLayer};

use crate::output;

/// Check an entered passcode against the configured one.
pub fn login(config: &ShoeboxConfig, pin: &str) -> Result<(), PinError> {
    PinGate::new(config.admin_pin.clone())?.check(pin)?;
    output::line("Unlocked");
    Ok(())
}

/// Print the overview counts.
pub async fn stats(layer: &DataLayer) -> Result<(), DataError> {
    let stats = DashboardStats::collect(layer).await?;
    output::stats(&stats);
    Ok(())
}
