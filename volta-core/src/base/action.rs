//! Discrete action set.
use crate::error::VoltaError;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

/// Number of discrete actions.
pub const N_ACTIONS: usize = 4;

/// An action taken for a single entity in one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Stay put.
    Idle,

    /// Drive to the nearest charging station.
    NearestStation,

    /// Drive to the fastest charging station.
    FastestStation,

    /// Charge towards 95% at the current station.
    #[serde(rename = "charge_to_95")]
    ChargeTo95,
}

impl Action {
    /// All actions, ordered by their index.
    pub const ALL: [Action; N_ACTIONS] = [
        Action::Idle,
        Action::NearestStation,
        Action::FastestStation,
        Action::ChargeTo95,
    ];

    /// Index of the action in the output of a [`QFunction`](crate::QFunction).
    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<i64> for Action {
    type Error = VoltaError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Action::Idle),
            1 => Ok(Action::NearestStation),
            2 => Ok(Action::FastestStation),
            3 => Ok(Action::ChargeTo95),
            v => Err(VoltaError::InvalidAction(v)),
        }
    }
}

impl From<Action> for i64 {
    fn from(a: Action) -> Self {
        a.index() as i64
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Idle => "idle",
            Action::NearestStation => "nearest_station",
            Action::FastestStation => "fastest_station",
            Action::ChargeTo95 => "charge_to_95",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_index_roundtrip() {
        for a in Action::ALL {
            assert_eq!(Action::try_from(i64::from(a)), Ok(a));
        }
    }

    #[test]
    fn test_out_of_range_action() {
        assert_eq!(Action::try_from(4), Err(VoltaError::InvalidAction(4)));
        assert_eq!(Action::try_from(-1), Err(VoltaError::InvalidAction(-1)));
    }
}
