//! Solid fills, both as a running effect and as edits to the neutral frame.

use crate::pixels::{PixelBuffer, RingIndex, Rgb, Zone, ZoneLayout};
use crate::signal::SignalError;

use super::waves::Waves;
use super::{Animation, EffectError, Lights, PixelSink, SinkError};

/// Every ring pixel held at one color.
pub struct SteadyFill {
    zone: Zone,
    color: Rgb,
}

impl SteadyFill {
    pub fn new(layout: &ZoneLayout, color: Rgb) -> Self {
        Self {
            zone: layout.all_rings(),
            color,
        }
    }
}

impl Animation for SteadyFill {
    fn bind(&self, _waves: &Waves) {}

    fn render(&self, _waves: &Waves, frame: &mut PixelBuffer) -> Result<(), SignalError> {
        frame.fill(self.zone, self.color);
        Ok(())
    }
}

impl<S: PixelSink> Lights<S> {
    pub async fn ring_fill(&mut self, ring: RingIndex, color: Rgb) -> Result<(), EffectError> {
        let zone = self.layout.ring(ring)?;
        self.neutral.fill(zone, color);
        Ok(self.restore().await?)
    }

    pub async fn cabinet(&mut self, color: Rgb) -> Result<(), SinkError> {
        self.neutral.fill(self.layout.cabinet(), color);
        self.restore().await
    }

    /// Blanks the neutral frame, cabinet included, and forgets any progress
    /// cursor.
    pub async fn all_off(&mut self) -> Result<(), SinkError> {
        let everything = Zone::new(0, self.neutral.len());
        self.neutral.fill(everything, Rgb::OFF);
        self.progress.reset();
        self.restore().await
    }
}

#[cfg(test)]
mod tests {
    use crate::effects::testing::*;
    use crate::effects::EffectCommand;
    use crate::pixels::{RingIndex, Rgb};

    #[tokio::test]
    async fn neutral_edits_persist_under_effects() {
        let mut rig = rig(RecordingSink::default());

        EffectCommand::CabinetOn
            .run(&mut rig.lights, &mut rig.control)
            .await
            .unwrap();
        EffectCommand::RingFill {
            ring: RingIndex::INNER,
            color: Rgb::new(150, 0, 0),
        }
        .run(&mut rig.lights, &mut rig.control)
        .await
        .unwrap();

        let last = rig.lights.sink().last().to_vec();
        assert!(last[..30].iter().all(|p| *p == Rgb::new(255, 255, 255)));
        assert_eq!(last[448], Rgb::new(150, 0, 0));
        assert_eq!(last[449], Rgb::OFF);

        // a pulse over the rings comes back to the same neutral frame
        rig.control_tx.send(EffectCommand::Kill).unwrap();
        EffectCommand::Pulse {
            color: Rgb::new(0, 0, 128),
            duration: 0.2,
        }
        .run(&mut rig.lights, &mut rig.control)
        .await
        .unwrap();
        assert_eq!(rig.lights.sink().last(), last.as_slice());

        EffectCommand::AllOff
            .run(&mut rig.lights, &mut rig.control)
            .await
            .unwrap();
        assert!(rig.lights.sink().last().iter().all(|p| *p == Rgb::OFF));
    }

    #[tokio::test]
    async fn unknown_ring_is_reported() {
        let mut rig = rig(RecordingSink::default());
        let result = EffectCommand::RingFill {
            ring: RingIndex(7),
            color: Rgb::new(1, 1, 1),
        }
        .run(&mut rig.lights, &mut rig.control)
        .await;

        assert!(result.is_err());
        assert!(rig.lights.sink().frames.is_empty());
    }
}
