use serde::{Deserialize, Serialize};

/// Orchestrator states.
///
/// `VALIDATING -> GENERATING -> RANKING -> INSERTING -> SCORING -> DONE`,
/// with `FAILED` reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GradingState {
    Validating,
    Generating,
    Ranking,
    Inserting,
    Scoring,
    Done,
    Failed,
}

impl GradingState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Validating => Some(Self::Generating),
            Self::Generating => Some(Self::Ranking),
            Self::Ranking => Some(Self::Inserting),
            Self::Inserting => Some(Self::Scoring),
            Self::Scoring => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    pub fn can_transition_to(&self, to: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == Self::Failed || self.next() == Some(to)
    }
}

/// States visited by one run, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTrail {
    visited: Vec<GradingState>,
}

impl StateTrail {
    pub fn start() -> Self {
        tracing::debug!(state = ?GradingState::Validating, "grading state");
        Self {
            visited: vec![GradingState::Validating],
        }
    }

    pub fn current(&self) -> GradingState {
        *self.visited.last().unwrap_or(&GradingState::Validating)
    }

    /// Record a transition. Illegal transitions are a programming error.
    pub fn advance(&mut self, to: GradingState) {
        let from = self.current();
        debug_assert!(
            from.can_transition_to(to),
            "illegal grading transition {:?} -> {:?}",
            from,
            to
        );
        tracing::debug!(from = ?from, to = ?to, "grading state");
        self.visited.push(to);
    }

    pub fn into_states(self) -> Vec<GradingState> {
        self.visited
    }
}
