use crate::model::attendance::LogDirection;

/// Per-day punch state machine, derived from the most recent log.
///
/// The alternation rule is "no two logs of the same direction in a row".
/// An empty day admits either direction: a check-out with no prior check-in
/// is stored as-is and simply never counts toward status until a check-in
/// exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunchState {
    /// No logs yet for the day.
    Empty,
    /// Last log was a check-in.
    AwaitingCheckOut,
    /// Last log was a check-out.
    AwaitingCheckIn,
}

impl PunchState {
    pub fn from_last_direction(last: Option<LogDirection>) -> Self {
        match last {
            None => PunchState::Empty,
            Some(LogDirection::CheckIn) => PunchState::AwaitingCheckOut,
            Some(LogDirection::CheckOut) => PunchState::AwaitingCheckIn,
        }
    }

    /// Admits a punch and returns the next state, or the offending
    /// direction when the punch repeats the previous one.
    pub fn admit(self, direction: LogDirection) -> Result<PunchState, LogDirection> {
        match (self, direction) {
            (PunchState::Empty, LogDirection::CheckIn) => Ok(PunchState::AwaitingCheckOut),
            (PunchState::Empty, LogDirection::CheckOut) => Ok(PunchState::AwaitingCheckIn),
            (PunchState::AwaitingCheckOut, LogDirection::CheckOut) => {
                Ok(PunchState::AwaitingCheckIn)
            }
            (PunchState::AwaitingCheckIn, LogDirection::CheckIn) => {
                Ok(PunchState::AwaitingCheckOut)
            }
            (PunchState::AwaitingCheckOut, LogDirection::CheckIn) => Err(LogDirection::CheckIn),
            (PunchState::AwaitingCheckIn, LogDirection::CheckOut) => Err(LogDirection::CheckOut),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_day_admits_either_direction() {
        assert_eq!(
            PunchState::Empty.admit(LogDirection::CheckIn),
            Ok(PunchState::AwaitingCheckOut)
        );
        // lone check-out on an empty day is accepted by design
        assert_eq!(
            PunchState::Empty.admit(LogDirection::CheckOut),
            Ok(PunchState::AwaitingCheckIn)
        );
    }

    #[test]
    fn repeated_direction_is_rejected() {
        let after_in = PunchState::from_last_direction(Some(LogDirection::CheckIn));
        assert_eq!(
            after_in.admit(LogDirection::CheckIn),
            Err(LogDirection::CheckIn)
        );

        let after_out = PunchState::from_last_direction(Some(LogDirection::CheckOut));
        assert_eq!(
            after_out.admit(LogDirection::CheckOut),
            Err(LogDirection::CheckOut)
        );
    }

    #[test]
    fn alternating_sequence_walks_the_states() {
        let mut state = PunchState::Empty;
        for _ in 0..3 {
            state = state.admit(LogDirection::CheckIn).unwrap();
            assert_eq!(state, PunchState::AwaitingCheckOut);
            state = state.admit(LogDirection::CheckOut).unwrap();
            assert_eq!(state, PunchState::AwaitingCheckIn);
        }
    }
}
