use tracing::debug;

use crate::control::ControlQueue;
use crate::pixels::{RingIndex, Rgb, Zone};

use super::{EffectError, Lights, PixelSink, PulseStep, SinkError};

impl<S: PixelSink> Lights<S> {
    /// Neutral, then `color` on `zone` for `seconds`, then neutral again.
    ///
    /// Returns `true` when a new command cut the pulse short.
    pub async fn pulse(
        &mut self,
        zone: Zone,
        color: Rgb,
        seconds: f64,
        control: &mut ControlQueue,
    ) -> Result<bool, SinkError> {
        self.restore().await?;

        self.frame.fill(zone, color);
        self.show().await?;
        let preempted = self.hold(seconds, control).await;
        if !preempted {
            self.show().await?;
        }

        self.restore().await?;
        Ok(preempted)
    }

    /// Pulses each step of `pattern` in turn on one ring.
    pub async fn multi_pulse(
        &mut self,
        pattern: &[PulseStep],
        ring: RingIndex,
        control: &mut ControlQueue,
    ) -> Result<(), EffectError> {
        let zone = self.layout.ring(ring)?;

        for (i, PulseStep(color, seconds)) in pattern.iter().enumerate() {
            if self.pulse(zone, *color, *seconds, control).await? {
                debug!(step = i, "pulse pattern preempted");
                break;
            }
        }

        Ok(())
    }
}
