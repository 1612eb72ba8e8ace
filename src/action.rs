use std::process::Command;

use crate::debug;
use crate::detectors::TriggerKind;
use crate::error::ActionError;

/// Sentinel action that ends the detector itself with success.
pub const EXIT_SENTINEL: &str = "exit";

/// What happened when an action fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Continue,
    Exit,
}

/// Runs whatever the operator asked for when a detector trips.
pub trait ActionRunner {
    fn fire(&mut self, kind: TriggerKind) -> Result<ActionOutcome, ActionError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Nothing,
    Exit,
    Command { program: String, args: Vec<String> },
}

impl Action {
    pub fn from_args(args: &[String]) -> Self {
        match args.split_first() {
            None => Action::Nothing,
            Some((first, _)) if first == EXIT_SENTINEL => Action::Exit,
            Some((program, rest)) => Action::Command {
                program: program.clone(),
                args: rest.to_vec(),
            },
        }
    }
}

impl ActionRunner for Action {
    /// Blocks until the command has finished; the detection loop waits on it.
    fn fire(&mut self, kind: TriggerKind) -> Result<ActionOutcome, ActionError> {
        match self {
            Action::Nothing => Ok(ActionOutcome::Continue),
            Action::Exit => Ok(ActionOutcome::Exit),
            Action::Command { program, args } => {
                debug!("Running {} for {}", program, kind.label());
                let status = Command::new(&*program)
                    .args(args.iter())
                    .status()
                    .map_err(|source| ActionError::Spawn {
                        program: program.clone(),
                        source,
                    })?;
                if !status.success() {
                    return Err(ActionError::Status {
                        program: program.clone(),
                        status,
                    });
                }
                Ok(ActionOutcome::Continue)
            }
        }
    }
}
