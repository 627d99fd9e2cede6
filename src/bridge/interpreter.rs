//! Command interpretation
//!
//! Maps a validated [`Command`] plus the current supervisor status and pulse
//! deadline to the side effect to perform and the next deadline. Pure; the
//! caller applies the deadline under the pulse lock and performs the action
//! after releasing it.

use bridge_shared::{Command, ProcessState};

/// Side effect requested by a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
    /// Publish the current state immediately
    Report,
    /// Nothing to do (already in the requested state)
    Nothing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interpretation {
    pub action: Action,
    pub deadline: u32,
}

pub fn interpret(command: Command, deadline: u32, status: &ProcessState) -> Interpretation {
    match command {
        Command::Start => Interpretation {
            action: start_if_stopped(status),
            deadline,
        },
        Command::Stop => Interpretation {
            action: if status.is_running() {
                Action::Stop
            } else {
                Action::Nothing
            },
            deadline,
        },
        // Extension only: a stale or duplicated shorter pulse never cuts a
        // longer one short
        Command::Pulse(ticks) => Interpretation {
            action: start_if_stopped(status),
            deadline: deadline.max(ticks),
        },
        Command::Status => Interpretation {
            action: Action::Report,
            deadline,
        },
    }
}

fn start_if_stopped(status: &ProcessState) -> Action {
    if status.is_stopped() {
        Action::Start
    } else {
        Action::Nothing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_only_when_stopped() {
        assert_eq!(interpret(Command::Start, 0, &ProcessState::Stopped).action, Action::Start);
        assert_eq!(interpret(Command::Start, 0, &ProcessState::Running).action, Action::Nothing);
        assert_eq!(interpret(Command::Start, 0, &ProcessState::Unknown).action, Action::Nothing);
        assert_eq!(
            interpret(Command::Start, 0, &ProcessState::Other("STARTING".into())).action,
            Action::Nothing
        );
    }

    #[test]
    fn test_stop_only_when_running() {
        assert_eq!(interpret(Command::Stop, 0, &ProcessState::Running).action, Action::Stop);
        assert_eq!(interpret(Command::Stop, 0, &ProcessState::Stopped).action, Action::Nothing);
        assert_eq!(interpret(Command::Stop, 0, &ProcessState::Unknown).action, Action::Nothing);
    }

    #[test]
    fn test_start_and_stop_keep_deadline() {
        assert_eq!(interpret(Command::Start, 7, &ProcessState::Stopped).deadline, 7);
        assert_eq!(interpret(Command::Stop, 7, &ProcessState::Running).deadline, 7);
    }

    #[test]
    fn test_pulse_extends_but_never_shrinks() {
        let shorter = interpret(Command::Pulse(5), 10, &ProcessState::Running);
        assert_eq!(shorter.deadline, 10);
        assert_eq!(shorter.action, Action::Nothing);

        let longer = interpret(Command::Pulse(20), 10, &ProcessState::Running);
        assert_eq!(longer.deadline, 20);
    }

    #[test]
    fn test_pulse_starts_stopped_process() {
        let result = interpret(Command::Pulse(25), 0, &ProcessState::Stopped);
        assert_eq!(result, Interpretation { action: Action::Start, deadline: 25 });
    }

    #[test]
    fn test_pulse_zero_is_a_no_op_on_running_process() {
        let result = interpret(Command::Pulse(0), 0, &ProcessState::Running);
        assert_eq!(result, Interpretation { action: Action::Nothing, deadline: 0 });
    }

    #[test]
    fn test_status_reports() {
        let result = interpret(Command::Status, 3, &ProcessState::Unknown);
        assert_eq!(result, Interpretation { action: Action::Report, deadline: 3 });
    }
}
