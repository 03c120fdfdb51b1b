use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::control::{ControlQueue, TimerFeed};
use crate::pixels::{LayoutError, PixelBuffer, Rgb, ZoneLayout};
use crate::signal::SignalError;

pub mod chase;
pub mod command;
pub mod fill;
pub mod heartbeat;
pub mod progress;
pub mod pulse;
pub mod waves;

pub use command::{EffectCommand, PulseStep};

use chase::{Chase, ChaseWithTimer};
use fill::SteadyFill;
use heartbeat::{HeartbeatSine, HeartbeatSquare};
use progress::Progress;
use waves::Waves;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("pixel sink i/o failed")]
    Io(#[from] std::io::Error),
    #[error("frame of {0} pixels does not fit in one message")]
    FrameTooLarge(usize),
    #[error("pixel sink rejected the frame: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum EffectError {
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error(transparent)]
    Signal(#[from] SignalError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Destination for rendered frames.
pub trait PixelSink: Send {
    fn put_pixels(&mut self, pixels: &[Rgb]) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// A looping effect: binds its parameters once, then recomputes its pixels
/// every frame until the dispatcher has something else to run.
pub trait Animation: Sync {
    fn bind(&self, waves: &Waves);

    /// Whether frames follow the timer feed. Samples are only taken off the
    /// feed while such an animation runs.
    fn uses_timer(&self) -> bool {
        false
    }

    fn render(&self, waves: &Waves, frame: &mut PixelBuffer) -> Result<(), SignalError>;
}

/// Rendering settings that stay fixed for the life of the worker.
#[derive(Clone, Copy, Debug)]
pub struct RenderSettings {
    pub frame_interval: Duration,
    pub glow: Rgb,
    pub power: Rgb,
}

/// Everything the rendering worker owns: the sink, both frame layers and the
/// waveform bank.
///
/// `neutral` is what the lights show when no effect is running. Effects draw
/// into `frame` starting from a copy of it and copy it back when they stop.
pub struct Lights<S> {
    sink: S,
    layout: ZoneLayout,
    frame: PixelBuffer,
    neutral: PixelBuffer,
    waves: Waves,
    timer: TimerFeed,
    progress: Progress,
    frame_interval: Duration,
    started: Instant,
}

impl<S: PixelSink> Lights<S> {
    pub fn new(sink: S, layout: ZoneLayout, timer: TimerFeed, settings: RenderSettings) -> Self {
        Self {
            sink,
            frame: PixelBuffer::new(layout.total()),
            neutral: PixelBuffer::new(layout.total()),
            layout,
            waves: Waves::new(settings.glow, settings.power),
            timer,
            progress: Progress::default(),
            frame_interval: settings.frame_interval,
            started: Instant::now(),
        }
    }

    pub fn layout(&self) -> &ZoneLayout {
        &self.layout
    }

    #[cfg(test)]
    pub fn neutral(&self) -> &PixelBuffer {
        &self.neutral
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Pushes the working frame. The controller only latches a frame after
    /// receiving it twice.
    async fn show(&mut self) -> Result<(), SinkError> {
        self.sink.put_pixels(self.frame.pixels()).await?;
        self.sink.put_pixels(self.frame.pixels()).await
    }

    /// Drops whatever the effect drew and shows the neutral frame again.
    pub async fn restore(&mut self) -> Result<(), SinkError> {
        self.frame.copy_from(&self.neutral);
        self.show().await
    }

    fn tick(&mut self, follow_timer: bool) {
        self.waves.clock.set(self.started.elapsed().as_secs_f64());

        if !follow_timer {
            return;
        }
        if let Some(sample) = self.timer.latest() {
            self.waves.timer.set(sample);
        }
    }

    /// Runs `animation` until preempted, then restores the neutral frame.
    ///
    /// Preemption is only looked at after a whole frame has been shown.
    pub async fn animate<A: Animation>(
        &mut self,
        animation: &A,
        control: &mut ControlQueue,
    ) -> Result<(), EffectError> {
        animation.bind(&self.waves);
        self.frame.copy_from(&self.neutral);

        loop {
            self.tick(animation.uses_timer());
            animation.render(&self.waves, &mut self.frame)?;
            self.show().await?;

            if control.preempted() {
                break;
            }
            sleep(self.frame_interval).await;
        }

        self.restore().await?;
        Ok(())
    }

    /// Waits up to `seconds`, returning early with `true` if a new command
    /// shows up.
    async fn hold(&mut self, seconds: f64, control: &mut ControlQueue) -> bool {
        let budget = Duration::try_from_secs_f64(seconds).unwrap_or_default();
        let deadline = Instant::now() + budget;

        loop {
            if control.preempted() {
                return true;
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            sleep(self.frame_interval.min(deadline - now)).await;
        }
    }
}

impl EffectCommand {
    /// Runs this command on the worker's lights.
    ///
    /// `Kill` is handled by the dispatcher and is a no-op here.
    pub async fn run<S: PixelSink>(
        &self,
        lights: &mut Lights<S>,
        control: &mut ControlQueue,
    ) -> Result<(), EffectError> {
        debug!(effect = self.name(), "running effect");

        match self {
            Self::SteadyFill { color } => {
                let fill = SteadyFill::new(lights.layout(), *color);
                lights.animate(&fill, control).await
            }
            Self::Pulse { color, duration } => {
                let zone = lights.layout().all_rings();
                lights.pulse(zone, *color, *duration, control).await?;
                Ok(())
            }
            Self::MultiPulse { pattern, ring } => lights.multi_pulse(pattern, *ring, control).await,
            Self::Chase {
                color,
                decay,
                ring,
                frequency,
            } => {
                let chase = Chase::new(lights.layout(), *color, *decay, *ring, *frequency)?;
                lights.animate(&chase, control).await
            }
            Self::ChaseWithTimer {
                chase_color,
                timer_color,
                decay,
                chase_ring,
                timer_ring,
                frequency,
            } => {
                let chase = Chase::new(
                    lights.layout(),
                    *chase_color,
                    *decay,
                    *chase_ring,
                    *frequency,
                )?;
                let chase = ChaseWithTimer::new(lights.layout(), chase, *timer_color, *timer_ring)?;
                let result = lights.animate(&chase, control).await;
                // samples for a finished run must not leak into the next one
                lights.timer.clear();
                result
            }
            Self::HeartbeatSine { color, frequency } => {
                let beat = HeartbeatSine::new(lights.layout(), *color, *frequency);
                lights.animate(&beat, control).await
            }
            Self::HeartbeatSquare {
                color,
                frequency,
                duty,
            } => {
                let beat = HeartbeatSquare::new(lights.layout(), *color, *frequency, *duty);
                lights.animate(&beat, control).await
            }
            Self::ProgressStep { color } => lights.progress_step(*color).await,
            Self::StopProgress => Ok(lights.stop_progress().await?),
            Self::RingFill { ring, color } => lights.ring_fill(*ring, *color).await,
            Self::AllOff => Ok(lights.all_off().await?),
            Self::CabinetOn => Ok(lights.cabinet(Rgb::new(255, 255, 255)).await?),
            Self::CabinetOff => Ok(lights.cabinet(Rgb::OFF).await?),
            Self::Kill => Ok(()),
        }
    }
}
