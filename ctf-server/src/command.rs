//! The `ctf` operator command.

use ctf_core::{CtfError, FlagEventEngine, Phase, Result};
use tracing::{info, warn};

/// Cycles the event phase: inactive → preparation → active → inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CtfCommand {
    required_level: u8,
}

impl CtfCommand {
    /// Command name as typed by operators.
    pub const NAME: &'static str = "ctf";

    /// A command that requires `required_level` to run.
    #[must_use]
    pub fn new(required_level: u8) -> Self {
        Self { required_level }
    }

    /// Run the command for a sender holding `level`, returning the new phase.
    ///
    /// # Errors
    /// [`CtfError::PermissionDenied`] if `level` is too low, otherwise the
    /// failure of the phase transition.
    pub fn execute(&self, engine: &FlagEventEngine, sender: &str, level: u8) -> Result<Phase> {
        if level < self.required_level {
            warn!(
                command = Self::NAME,
                sender,
                level,
                required = self.required_level,
                "Command refused"
            );
            return Err(CtfError::PermissionDenied {
                required: self.required_level,
                actual: level,
            });
        }
        let phase = engine.cycle()?;
        info!(command = Self::NAME, sender, %phase, "Phase changed by command");
        Ok(phase)
    }
}
