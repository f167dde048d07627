//! Pipeline state machine
//!
//! The run sequence is a total order: dependency check, then levels 1–4,
//! then done. `Failed` is absorbing and reachable from every live state; no
//! level is ever entered, run speculatively, or re-ordered. Transitions are
//! validated on every advance, so a mis-driven orchestrator surfaces as an
//! explicit sequence error instead of silently skipping a level.

use forge_validation::{Level, SequenceError};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// States of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineState {
    /// Run created, nothing executed
    Init,
    /// Pre-flight dependency probing
    DependencyCheck,
    /// Framework self-test
    Level1,
    /// Component logic validation
    Level2,
    /// System integration validation
    Level3,
    /// Semantic validation
    Level4,
    /// All levels passed
    Done,
    /// Terminal failure (absorbing)
    Failed,
}

impl PipelineState {
    /// The validation level this state executes, if any
    #[must_use]
    pub fn level(&self) -> Option<Level> {
        match self {
            PipelineState::Level1 => Some(Level::Framework),
            PipelineState::Level2 => Some(Level::ComponentLogic),
            PipelineState::Level3 => Some(Level::Integration),
            PipelineState::Level4 => Some(Level::Semantic),
            _ => None,
        }
    }

    /// Whether the run can leave this state
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

impl Display for PipelineState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Validates a state transition.
pub fn validate_transition(from: PipelineState, to: PipelineState) -> Result<(), SequenceError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(SequenceError::IllegalTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// All states reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: PipelineState) -> Vec<PipelineState> {
    use PipelineState::*;
    match from {
        Init => vec![DependencyCheck, Failed],
        DependencyCheck => vec![Level1, Failed],
        Level1 => vec![Level2, Failed],
        Level2 => vec![Level3, Failed],
        Level3 => vec![Level4, Failed],
        Level4 => vec![Done, Failed],
        Done => vec![],
        Failed => vec![],
    }
}

fn allowed(from: PipelineState, to: PipelineState) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}

/// Self-test of the transition table, registered into the level-1 battery
pub fn transition_table_self_check() -> Result<(), String> {
    use PipelineState::*;

    let chain = [Init, DependencyCheck, Level1, Level2, Level3, Level4, Done];
    for pair in chain.windows(2) {
        if validate_transition(pair[0], pair[1]).is_err() {
            return Err(format!("forward chain broken at {} -> {}", pair[0], pair[1]));
        }
    }
    for state in [Init, DependencyCheck, Level1, Level2, Level3, Level4] {
        if validate_transition(state, Failed).is_err() {
            return Err(format!("{state} cannot reach Failed"));
        }
    }
    if !allowed_transitions(Done).is_empty() || !allowed_transitions(Failed).is_empty() {
        return Err("terminal states must be absorbing".to_string());
    }
    if validate_transition(Level1, Level3).is_ok() {
        return Err("level skipping must be illegal".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_chain_is_legal() {
        assert!(validate_transition(PipelineState::Init, PipelineState::DependencyCheck).is_ok());
        assert!(validate_transition(PipelineState::Level4, PipelineState::Done).is_ok());
    }

    #[test]
    fn skipping_a_level_is_illegal() {
        let err = validate_transition(PipelineState::Level1, PipelineState::Level3).unwrap_err();
        assert!(err.to_string().contains("illegal pipeline transition"));
    }

    #[test]
    fn failed_is_absorbing() {
        assert!(allowed_transitions(PipelineState::Failed).is_empty());
        assert!(validate_transition(PipelineState::Failed, PipelineState::Level1).is_err());
    }

    #[test]
    fn done_is_absorbing() {
        assert!(allowed_transitions(PipelineState::Done).is_empty());
    }

    #[test]
    fn backward_transitions_are_illegal() {
        assert!(validate_transition(PipelineState::Level3, PipelineState::Level2).is_err());
    }

    #[test]
    fn states_map_to_levels() {
        assert_eq!(PipelineState::Level2.level(), Some(Level::ComponentLogic));
        assert_eq!(PipelineState::DependencyCheck.level(), None);
    }

    #[test]
    fn self_check_passes() {
        assert!(transition_table_self_check().is_ok());
    }
}
