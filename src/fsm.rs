//! Hierarchical state machine tracking the controller's operating state.
//!
//! `action` is the only composite state; its children are only ever entered
//! as `action.<child>`. Entering a state runs the callback registered for it,
//! which may hand back one [`EffectCommand`] for the rendering worker.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::control::ControlSender;
use crate::effects::EffectCommand;
use crate::pixels::{RingIndex, Rgb};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionState {
    Default,
    Prepare,
    Snap,
    Experiment,
    Mosaic,
}

impl ActionState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Prepare => "prepare",
            Self::Snap => "snap",
            Self::Experiment => "experiment",
            Self::Mosaic => "mosaic",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    Default,
    Start,
    Configure,
    Idle,
    Error,
    Shutdown,
    Action(ActionState),
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Default => write!(f, "default"),
            State::Start => write!(f, "start"),
            State::Configure => write!(f, "configure"),
            State::Idle => write!(f, "idle"),
            State::Error => write!(f, "error"),
            State::Shutdown => write!(f, "shutdown"),
            State::Action(child) => write!(f, "action.{}", child.as_str()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Trigger {
    Default,
    Start,
    Configure,
    Idle,
    Error,
    Shutdown,
    Action(ActionState),
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Default => write!(f, "default"),
            Trigger::Start => write!(f, "start"),
            Trigger::Configure => write!(f, "configure"),
            Trigger::Idle => write!(f, "idle"),
            Trigger::Error => write!(f, "error"),
            Trigger::Shutdown => write!(f, "shutdown"),
            Trigger::Action(child) => write!(f, "action_{}", child.as_str()),
        }
    }
}

/// Which states a transition may leave from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Any,
    Exact(State),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub trigger: Trigger,
    pub source: Source,
    pub dest: State,
}

const fn transition(trigger: Trigger, source: Source, dest: State) -> Transition {
    Transition {
        trigger,
        source,
        dest,
    }
}

/// The controller's state graph.
pub const TRANSITIONS: [Transition; 10] = [
    transition(Trigger::Default, Source::Any, State::Default),
    transition(Trigger::Start, Source::Exact(State::Shutdown), State::Start),
    transition(Trigger::Configure, Source::Exact(State::Start), State::Configure),
    transition(Trigger::Idle, Source::Any, State::Idle),
    transition(Trigger::Error, Source::Any, State::Error),
    transition(
        Trigger::Action(ActionState::Prepare),
        Source::Exact(State::Idle),
        State::Action(ActionState::Prepare),
    ),
    transition(
        Trigger::Action(ActionState::Snap),
        Source::Exact(State::Idle),
        State::Action(ActionState::Snap),
    ),
    transition(
        Trigger::Action(ActionState::Experiment),
        Source::Exact(State::Idle),
        State::Action(ActionState::Experiment),
    ),
    transition(
        Trigger::Action(ActionState::Mosaic),
        Source::Exact(State::Idle),
        State::Action(ActionState::Mosaic),
    ),
    transition(Trigger::Shutdown, Source::Any, State::Shutdown),
];

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no transition for trigger {trigger} from state {state}")]
pub struct TransitionError {
    pub trigger: Trigger,
    pub state: State,
}

type OnEnter = Box<dyn Fn(State) -> Option<EffectCommand> + Send>;

pub struct StateMachine {
    state: State,
    exact: HashMap<(Trigger, State), State>,
    wildcard: HashMap<Trigger, State>,
    on_enter: HashMap<State, OnEnter>,
    control: ControlSender,
}

impl StateMachine {
    pub fn new(initial: State, transitions: &[Transition], control: ControlSender) -> Self {
        let mut exact = HashMap::new();
        let mut wildcard = HashMap::new();

        for t in transitions {
            match t.source {
                Source::Any => {
                    wildcard.insert(t.trigger, t.dest);
                }
                Source::Exact(source) => {
                    exact.insert((t.trigger, source), t.dest);
                }
            }
        }

        Self {
            state: initial,
            exact,
            wildcard,
            on_enter: HashMap::new(),
            control,
        }
    }

    /// The stock graph, starting in `start`, with every state's signature
    /// effect registered.
    pub fn with_signatures(control: ControlSender) -> Self {
        let mut machine = Self::new(State::Start, &TRANSITIONS, control);
        for (state, command) in signatures() {
            machine.on_enter(state, move |_| Some(command.clone()));
        }
        machine
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn on_enter(
        &mut self,
        state: State,
        callback: impl Fn(State) -> Option<EffectCommand> + Send + 'static,
    ) {
        self.on_enter.insert(state, Box::new(callback));
    }

    /// Where `trigger` leads from the current state, if anywhere.
    pub fn destination(&self, trigger: Trigger) -> Option<State> {
        self.exact
            .get(&(trigger, self.state))
            .or_else(|| self.wildcard.get(&trigger))
            .copied()
    }

    /// Fires `trigger`. On success the state changes and the new state's
    /// callback runs; otherwise nothing changes.
    pub fn fire(&mut self, trigger: Trigger) -> Result<State, TransitionError> {
        let dest = self.destination(trigger).ok_or(TransitionError {
            trigger,
            state: self.state,
        })?;

        info!(from = %self.state, to = %dest, %trigger, "state transition");
        self.state = dest;
        self.enter(dest);

        Ok(dest)
    }

    fn enter(&self, state: State) {
        let Some(command) = self.on_enter.get(&state).and_then(|callback| callback(state)) else {
            return;
        };

        debug!(%state, effect = command.name(), "queueing signature effect");
        if self.control.send(command).is_err() {
            warn!(%state, "rendering worker is gone, dropping effect");
        }
    }
}

/// What each state looks like on the lights.
pub fn signatures() -> Vec<(State, EffectCommand)> {
    vec![
        (
            State::Idle,
            EffectCommand::HeartbeatSine {
                color: Rgb::new(50, 50, 50),
                frequency: 2.0,
            },
        ),
        (
            State::Error,
            EffectCommand::HeartbeatSquare {
                color: Rgb::new(150, 0, 0),
                frequency: 1.5,
                duty: 0.2,
            },
        ),
        (State::Shutdown, EffectCommand::AllOff),
        (
            State::Action(ActionState::Prepare),
            EffectCommand::Chase {
                color: Rgb::new(0, 0, 128),
                decay: 2.0,
                ring: RingIndex::OUTER,
                frequency: 0.5,
            },
        ),
        (
            State::Action(ActionState::Snap),
            EffectCommand::Pulse {
                color: Rgb::new(0, 0, 128),
                duration: 0.2,
            },
        ),
        (
            State::Action(ActionState::Experiment),
            EffectCommand::ChaseWithTimer {
                chase_color: Rgb::new(128, 0, 0),
                timer_color: Rgb::new(0, 128, 0),
                decay: 5.0,
                chase_ring: RingIndex::OUTER,
                timer_ring: RingIndex(-2),
                frequency: 1.0,
            },
        ),
        (
            State::Action(ActionState::Mosaic),
            EffectCommand::ProgressStep {
                color: Rgb::new(0, 100, 0),
            },
        ),
    ]
}
