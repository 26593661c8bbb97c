//! Dashboard passcode gate.
//!
//! A single shared four-digit passcode protects the dashboard. It has
//! nothing to do with the per-user `pin` field on [`shoebox_core::User`].
//! The comparison is a plain equality check and is not meant to resist a
//! determined attacker.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Passcode used when `SHOEBOX_ADMIN_PIN` is not set.
pub const DEFAULT_ADMIN_PIN: &str = "1290";

/// Number of digits in a passcode.
pub const PIN_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PinError {
    #[error("PIN must be exactly {PIN_LEN} digits")]
    Malformed,
    #[error("Incorrect PIN")]
    Incorrect,
}

/// Checks entered passcodes against the configured one.
#[derive(Debug, Clone)]
pub struct PinGate {
    pin: SecretString,
}

impl PinGate {
    /// Build a gate for `pin`.
    ///
    /// # Errors
    ///
    /// Returns [`PinError::Malformed`] if the configured passcode is not
    /// exactly four ASCII digits.
    pub fn new(pin: SecretString) -> Result<Self, PinError> {
        if !is_well_formed(pin.expose_secret()) {
            return Err(PinError::Malformed);
        }
        Ok(Self { pin })
    }

    /// Check an entered passcode.
    ///
    /// # Errors
    ///
    /// Returns [`PinError::Malformed`] for input that is not four digits and
    /// [`PinError::Incorrect`] for a well-formed but wrong passcode.
    pub fn check(&self, entered: &str) -> Result<(), PinError> {
        let entered = entered.trim();
        if !is_well_formed(entered) {
            return Err(PinError::Malformed);
        }
        if entered == self.pin.expose_secret() {
            tracing::info!("Dashboard unlocked");
            Ok(())
        } else {
            tracing::warn!("Rejected dashboard PIN");
            Err(PinError::Incorrect)
        }
    }
}

impl Default for PinGate {
    fn default() -> Self {
        Self {
            pin: SecretString::from(DEFAULT_ADMIN_PIN),
        }
    }
}

fn is_well_formed(pin: &str) -> bool {
    pin.len() == PIN_LEN && pin.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pin() {
        let gate = PinGate::default();
        assert_eq!(gate.check("1290"), Ok(()));
        assert_eq!(gate.check(" 1290\n"), Ok(()));
        assert_eq!(gate.check("1234"), Err(PinError::Incorrect));
    }

    #[test]
    fn test_malformed_input() {
        let gate = PinGate::default();
        for entered in ["", "129", "12900", "12a0", "１２９０"] {
            assert_eq!(gate.check(entered), Err(PinError::Malformed), "{entered}");
        }
    }

    #[test]
    fn test_configured_pin() {
        let gate = PinGate::new(SecretString::from("0042")).unwrap();
        assert_eq!(gate.check("0042"), Ok(()));
        assert_eq!(gate.check("1290"), Err(PinError::Incorrect));
        assert!(PinGate::new(SecretString::from("abcd")).is_err());
    }
}
