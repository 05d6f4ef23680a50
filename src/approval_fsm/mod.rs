//! The approval strategy→transition tables (§4.4), represented as pure,
//! immutable data rather than a hand-coded `match` per strategy, per the
//! "strategy map + FSM definitions -> pure data tables" re-architecture note.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Strategy {
    Auto,
    Simple,
    FourEyes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    Pending,
    Granted,
    Rejected,
    Semigranted,
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionAction {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub action: TransitionAction,
    pub src: State,
    pub dst: State,
}

const SIMPLE: &[Transition] = &[
    Transition { action: TransitionAction::Allow, src: State::Pending, dst: State::Granted },
    Transition { action: TransitionAction::Deny, src: State::Pending, dst: State::Rejected },
];

const FOUR_EYES: &[Transition] = &[
    Transition { action: TransitionAction::Allow, src: State::Pending, dst: State::Semigranted },
    Transition { action: TransitionAction::Deny, src: State::Pending, dst: State::Rejected },
    Transition { action: TransitionAction::Deny, src: State::Semigranted, dst: State::Rejected },
    Transition { action: TransitionAction::Allow, src: State::Semigranted, dst: State::Granted },
];

const AUTO: &[Transition] = &[];

impl Strategy {
    /// The full transition table for this strategy.
    pub fn table(self) -> &'static [Transition] {
        match self {
            Strategy::Auto => AUTO,
            Strategy::Simple => SIMPLE,
            Strategy::FourEyes => FOUR_EYES,
        }
    }

    /// `available_transitions(s) = {t in FSM[S] : s in t.src}` (testable
    /// property #3).
    pub fn available_transitions(self, state: State) -> Vec<Transition> {
        self.table().iter().filter(|t| t.src == state).copied().collect()
    }

    /// Applies `action` from `state`; fails deterministically (returns
    /// `None`) when no transition matches, rather than silently staying put.
    pub fn apply(self, state: State, action: TransitionAction) -> Option<State> {
        self.table().iter().find(|t| t.src == state && t.action == action).map(|t| t.dst)
    }

    /// Whether `state` is a valid initial state for a freshly-created
    /// request under this strategy. `Auto` only ever admits `Granted`.
    pub fn is_valid_initial_state(self, state: State) -> bool {
        match self {
            Strategy::Auto => state == State::Granted,
            Strategy::Simple | Strategy::FourEyes => state == State::Pending,
        }
    }
}

impl State {
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Granted | State::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_eyes_requires_two_allows() {
        let s = Strategy::FourEyes;
        assert_eq!(s.apply(State::Pending, TransitionAction::Allow), Some(State::Semigranted));
        assert_eq!(s.apply(State::Semigranted, TransitionAction::Allow), Some(State::Granted));
        assert_eq!(s.apply(State::Semigranted, TransitionAction::Deny), Some(State::Rejected));
    }

    #[test]
    fn simple_two_transitions() {
        let s = Strategy::Simple;
        assert_eq!(s.apply(State::Pending, TransitionAction::Allow), Some(State::Granted));
        assert_eq!(s.apply(State::Pending, TransitionAction::Deny), Some(State::Rejected));
        assert_eq!(s.apply(State::Granted, TransitionAction::Allow), None);
    }

    #[test]
    fn auto_has_no_transitions_and_only_admits_granted() {
        assert!(Strategy::Auto.table().is_empty());
        assert!(Strategy::Auto.is_valid_initial_state(State::Granted));
        assert!(!Strategy::Auto.is_valid_initial_state(State::Pending));
    }

    #[test]
    fn available_transitions_matches_definition() {
        for strategy in [Strategy::Auto, Strategy::Simple, Strategy::FourEyes] {
            for state in [State::Pending, State::Granted, State::Rejected, State::Semigranted, State::Suspended] {
                let expected: Vec<_> = strategy.table().iter().filter(|t| t.src == state).copied().collect();
                assert_eq!(strategy.available_transitions(state), expected);
            }
        }
    }
}
