use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use crate::pixels::{RingIndex, Rgb};
use crate::status::MappingError;

const NAME_STEADY_FILL: &str = "steadyFill";
const NAME_PULSE: &str = "pulse";
const NAME_MULTI_PULSE: &str = "multiPulse";
const NAME_CHASE: &str = "chase";
const NAME_CHASE_WITH_TIMER: &str = "chaseWithTimer";
const NAME_HEARTBEAT_SINE: &str = "heartbeatSine";
const NAME_HEARTBEAT_SQUARE: &str = "heartbeatSquare";
const NAME_PROGRESS_STEP: &str = "progressStep";
const NAME_STOP_PROGRESS: &str = "stopProgress";
const NAME_RING_FILL: &str = "ringFill";
const NAME_ALL_OFF: &str = "allOff";
const NAME_CABINET_ON: &str = "cabinetOn";
const NAME_CABINET_OFF: &str = "cabinetOff";
const NAME_KILL: &str = "kill";

/// One step of a multi-pulse: the color and how many seconds it is held.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct PulseStep(pub Rgb, pub f64);

/// Everything the rendering worker can be asked to do.
#[derive(Clone, Debug, PartialEq)]
pub enum EffectCommand {
    SteadyFill {
        color: Rgb,
    },
    Pulse {
        color: Rgb,
        duration: f64,
    },
    MultiPulse {
        pattern: Vec<PulseStep>,
        ring: RingIndex,
    },
    Chase {
        color: Rgb,
        decay: f64,
        ring: RingIndex,
        frequency: f64,
    },
    ChaseWithTimer {
        chase_color: Rgb,
        timer_color: Rgb,
        decay: f64,
        chase_ring: RingIndex,
        timer_ring: RingIndex,
        frequency: f64,
    },
    HeartbeatSine {
        color: Rgb,
        frequency: f64,
    },
    HeartbeatSquare {
        color: Rgb,
        frequency: f64,
        duty: f64,
    },
    ProgressStep {
        color: Rgb,
    },
    StopProgress,
    RingFill {
        ring: RingIndex,
        color: Rgb,
    },
    AllOff,
    CabinetOn,
    CabinetOff,
    /// Stops the dispatcher.
    Kill,
}

impl EffectCommand {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SteadyFill { .. } => NAME_STEADY_FILL,
            Self::Pulse { .. } => NAME_PULSE,
            Self::MultiPulse { .. } => NAME_MULTI_PULSE,
            Self::Chase { .. } => NAME_CHASE,
            Self::ChaseWithTimer { .. } => NAME_CHASE_WITH_TIMER,
            Self::HeartbeatSine { .. } => NAME_HEARTBEAT_SINE,
            Self::HeartbeatSquare { .. } => NAME_HEARTBEAT_SQUARE,
            Self::ProgressStep { .. } => NAME_PROGRESS_STEP,
            Self::StopProgress => NAME_STOP_PROGRESS,
            Self::RingFill { .. } => NAME_RING_FILL,
            Self::AllOff => NAME_ALL_OFF,
            Self::CabinetOn => NAME_CABINET_ON,
            Self::CabinetOff => NAME_CABINET_OFF,
            Self::Kill => NAME_KILL,
        }
    }

    /// Builds a command from its wire name and positional arguments.
    ///
    /// An empty argument list selects the command's stock parameters.
    pub fn from_parts(name: &str, args: Vec<Value>) -> Result<EffectCommand, MappingError> {
        if args.is_empty() {
            return Self::stock(name);
        }

        let command = match name {
            NAME_STEADY_FILL => {
                let (color,): (Rgb,) = positional(name, args)?;
                Self::SteadyFill { color }
            }
            NAME_PULSE => {
                let (color, duration) = positional(name, args)?;
                Self::Pulse { color, duration }
            }
            NAME_MULTI_PULSE => {
                let (pattern, ring) = positional(name, args)?;
                Self::MultiPulse { pattern, ring }
            }
            NAME_CHASE => {
                let (color, decay, ring, frequency) = positional(name, args)?;
                Self::Chase {
                    color,
                    decay,
                    ring,
                    frequency,
                }
            }
            NAME_CHASE_WITH_TIMER => {
                let (chase_color, timer_color, decay, chase_ring, timer_ring, frequency) =
                    positional(name, args)?;
                Self::ChaseWithTimer {
                    chase_color,
                    timer_color,
                    decay,
                    chase_ring,
                    timer_ring,
                    frequency,
                }
            }
            NAME_HEARTBEAT_SINE => {
                let (color, frequency) = positional(name, args)?;
                Self::HeartbeatSine { color, frequency }
            }
            NAME_HEARTBEAT_SQUARE => {
                let (color, frequency, duty) = positional(name, args)?;
                Self::HeartbeatSquare {
                    color,
                    frequency,
                    duty,
                }
            }
            NAME_PROGRESS_STEP => {
                let (color,): (Rgb,) = positional(name, args)?;
                Self::ProgressStep { color }
            }
            NAME_RING_FILL => {
                let (ring, color) = positional(name, args)?;
                Self::RingFill { ring, color }
            }
            NAME_STOP_PROGRESS | NAME_ALL_OFF | NAME_CABINET_ON | NAME_CABINET_OFF | NAME_KILL => {
                return Err(MappingError::BadArguments {
                    effect: name.to_owned(),
                    reason: String::from("takes no arguments"),
                })
            }
            _ => return Err(MappingError::UnknownEffect(name.to_owned())),
        };

        Ok(command)
    }

    /// Stock parameters for every command name.
    pub fn stock(name: &str) -> Result<EffectCommand, MappingError> {
        let command = match name {
            NAME_STEADY_FILL => Self::SteadyFill {
                color: Rgb::new(128, 128, 128),
            },
            NAME_PULSE => Self::Pulse {
                color: Rgb::new(0, 0, 128),
                duration: 0.2,
            },
            NAME_MULTI_PULSE => Self::MultiPulse {
                pattern: vec![
                    PulseStep(Rgb::new(150, 0, 0), 0.2),
                    PulseStep(Rgb::new(0, 150, 0), 0.2),
                ],
                ring: RingIndex::OUTER,
            },
            NAME_CHASE => Self::Chase {
                color: Rgb::new(0, 0, 128),
                decay: 2.0,
                ring: RingIndex::OUTER,
                frequency: 0.5,
            },
            NAME_CHASE_WITH_TIMER => Self::ChaseWithTimer {
                chase_color: Rgb::new(128, 0, 0),
                timer_color: Rgb::new(0, 128, 0),
                decay: 5.0,
                chase_ring: RingIndex::OUTER,
                timer_ring: RingIndex(-2),
                frequency: 1.0,
            },
            NAME_HEARTBEAT_SINE => Self::HeartbeatSine {
                color: Rgb::new(50, 50, 50),
                frequency: 2.0,
            },
            NAME_HEARTBEAT_SQUARE => Self::HeartbeatSquare {
                color: Rgb::new(150, 0, 0),
                frequency: 1.5,
                duty: 0.2,
            },
            NAME_PROGRESS_STEP => Self::ProgressStep {
                color: Rgb::new(0, 100, 0),
            },
            NAME_STOP_PROGRESS => Self::StopProgress,
            NAME_RING_FILL => Self::RingFill {
                ring: RingIndex::INNER,
                color: Rgb::new(150, 0, 0),
            },
            NAME_ALL_OFF => Self::AllOff,
            NAME_CABINET_ON => Self::CabinetOn,
            NAME_CABINET_OFF => Self::CabinetOff,
            NAME_KILL => Self::Kill,
            _ => return Err(MappingError::UnknownEffect(name.to_owned())),
        };

        Ok(command)
    }
}

fn positional<T: DeserializeOwned>(name: &str, args: Vec<Value>) -> Result<T, MappingError> {
    serde_json::from_value(Value::Array(args)).map_err(|e| MappingError::BadArguments {
        effect: name.to_owned(),
        reason: e.to_string(),
    })
}
