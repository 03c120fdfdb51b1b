//! Turns controller status snapshots into state machine triggers.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::control::{send_timer, TimerSender};
use crate::fsm::{ActionState, State, StateMachine, TransitionError, Trigger};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MappingError {
    #[error("unknown primary state code {0:?}")]
    UnknownPrimaryState(String),
    #[error("unknown action state code {0:?}")]
    UnknownActionState(String),
    #[error("unknown effect {0:?}")]
    UnknownEffect(String),
    #[error("bad arguments for effect {effect}: {reason}")]
    BadArguments { effect: String, reason: String },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatusError {
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// One status report from the controller.
///
/// Codes arrive as strings or integers and are kept as strings. Fields the
/// mapper does not know about are kept in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct StatusSnapshot {
    #[serde(
        rename = "primaryState",
        alias = "FPGA Main State",
        default,
        deserialize_with = "code"
    )]
    pub primary_state: Option<String>,
    #[serde(
        rename = "secondaryState",
        alias = "Action State",
        default,
        deserialize_with = "code"
    )]
    pub secondary_state: Option<String>,
    #[serde(alias = "Timer", default)]
    pub timer: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StatusSnapshot {
    #[cfg(test)]
    pub fn new(primary: impl ToString, secondary: impl ToString, timer: impl Into<Value>) -> Self {
        Self {
            primary_state: Some(primary.to_string()),
            secondary_state: Some(secondary.to_string()),
            timer: timer.into(),
            extra: Map::new(),
        }
    }

    /// The timer as a number, if it is one or a string holding one.
    pub fn timer_value(&self) -> Option<f64> {
        match &self.timer {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCode {
    Int(i64),
    Text(String),
}

fn code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<RawCode>::deserialize(deserializer)?;
    Ok(raw.map(|raw| match raw {
        RawCode::Int(n) => n.to_string(),
        RawCode::Text(s) => s.trim().to_owned(),
    }))
}

/// Primary state code to trigger. `5` needs the action code to pick a child.
pub fn primary_trigger(primary: &str, secondary: Option<&str>) -> Result<Trigger, MappingError> {
    let trigger = match primary {
        "0" => Trigger::Default,
        "1" => Trigger::Start,
        "2" => Trigger::Configure,
        "3" => Trigger::Idle,
        "4" => Trigger::Error,
        "5" => Trigger::Action(action_state(secondary.unwrap_or_default())?),
        "6" => Trigger::Shutdown,
        other => return Err(MappingError::UnknownPrimaryState(other.to_owned())),
    };

    Ok(trigger)
}

pub fn action_state(secondary: &str) -> Result<ActionState, MappingError> {
    let child = match secondary {
        "0" => ActionState::Default,
        "1" => ActionState::Experiment,
        "2" | "3" | "4" | "5" | "6" | "8" | "9" => ActionState::Prepare,
        "7" => ActionState::Snap,
        "10" | "11" => ActionState::Mosaic,
        other => return Err(MappingError::UnknownActionState(other.to_owned())),
    };

    Ok(child)
}

/// Compares each snapshot with the one before it and reacts to what changed.
pub struct StatusMapper {
    baseline: Option<StatusSnapshot>,
    machine: StateMachine,
    timer: TimerSender,
}

impl StatusMapper {
    pub fn new(machine: StateMachine, timer: TimerSender) -> Self {
        Self {
            baseline: None,
            machine,
            timer,
        }
    }

    pub fn state(&self) -> State {
        self.machine.state()
    }

    #[cfg(test)]
    pub fn baseline(&self) -> Option<&StatusSnapshot> {
        self.baseline.as_ref()
    }

    /// Feeds one snapshot in. Returns the new state if a transition fired.
    ///
    /// The snapshot becomes the new baseline whatever happens, so an
    /// unmappable code is reported once and not on every poll after it.
    pub fn observe(&mut self, snapshot: StatusSnapshot) -> Result<Option<State>, StatusError> {
        let previous = self.baseline.replace(snapshot.clone());
        let previous = previous.as_ref();

        if previous.map(|p| &p.timer) != Some(&snapshot.timer) {
            self.push_timer(&snapshot);
        }

        let primary_changed =
            previous.map(|p| &p.primary_state) != Some(&snapshot.primary_state);
        let Some(primary) = snapshot.primary_state.as_deref().filter(|_| primary_changed) else {
            return Ok(None);
        };

        let trigger = primary_trigger(primary, snapshot.secondary_state.as_deref())?;
        debug!(%trigger, primary, "primary state changed");
        Ok(Some(self.machine.fire(trigger)?))
    }

    fn push_timer(&self, snapshot: &StatusSnapshot) {
        if snapshot.timer.is_null() {
            return;
        }

        match snapshot.timer_value() {
            Some(sample) => {
                if send_timer(&self.timer, sample).is_err() {
                    debug!("timer feed is gone");
                }
            }
            None => warn!(timer = %snapshot.timer, "ignoring unreadable timer value"),
        }
    }
}
