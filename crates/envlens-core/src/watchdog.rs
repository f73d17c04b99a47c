//! Supervised restart of a comparison session.
//!
//! When the hosting environment invalidates (the extension context goes
//! away underneath the page), the controller tears the session down and
//! rebuilds it. The watchdog bounds how often that may happen before the
//! user has to reload manually. Kept outside the synchronizer: host
//! lifetime is a hosting concern, not a scroll-sync concern.

use envlens_types::error::{EnvlensError, Result};

/// Restarts allowed before giving up.
pub const DEFAULT_RESTART_BUDGET: u32 = 3;

/// Bounded restart counter.
#[derive(Debug, Clone)]
pub struct Watchdog {
    budget: u32,
    attempts: u32,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl Watchdog {
    pub fn new() -> Self {
        Self::with_budget(DEFAULT_RESTART_BUDGET)
    }

    pub fn with_budget(budget: u32) -> Self {
        Self { budget, attempts: 0 }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn remaining(&self) -> u32 {
        self.budget.saturating_sub(self.attempts)
    }

    /// Account for one restart. Errs once the budget is spent.
    pub fn request_restart(&mut self) -> Result<u32> {
        if self.attempts >= self.budget {
            return Err(EnvlensError::WatchdogExhausted(self.budget));
        }
        self.attempts += 1;
        Ok(self.attempts)
    }

    /// Forget past restarts (a session that proved stable again).
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_budget_then_refuses() {
        let mut wd = Watchdog::with_budget(3);
        assert_eq!(wd.request_restart().unwrap(), 1);
        assert_eq!(wd.request_restart().unwrap(), 2);
        assert_eq!(wd.request_restart().unwrap(), 3);
        assert!(matches!(
            wd.request_restart(),
            Err(EnvlensError::WatchdogExhausted(3))
        ));
        // Still refused afterwards.
        assert!(wd.request_restart().is_err());
    }

    #[test]
    fn remaining_counts_down() {
        let mut wd = Watchdog::with_budget(2);
        assert_eq!(wd.remaining(), 2);
        wd.request_restart().unwrap();
        assert_eq!(wd.remaining(), 1);
    }

    #[test]
    fn reset_restores_budget() {
        let mut wd = Watchdog::with_budget(1);
        wd.request_restart().unwrap();
        assert!(wd.request_restart().is_err());
        wd.reset();
        assert!(wd.request_restart().is_ok());
    }

    #[test]
    fn zero_budget_refuses_immediately() {
        let mut wd = Watchdog::with_budget(0);
        assert!(wd.request_restart().is_err());
    }
}
