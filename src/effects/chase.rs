//! A comet running around a ring, optionally with a progress bar next to it.
//!
//! Each pixel of the ring gets the phase `i / n`, so a decay wave sampled
//! across the ring peaks at one pixel and trails off behind it. As the clock
//! advances the peak moves by `frequency` turns per second.

use crate::pixels::{LayoutError, PixelBuffer, RingIndex, Rgb, Zone, ZoneLayout};
use crate::signal::SignalError;

use super::waves::Waves;
use super::Animation;

pub struct Chase {
    zone: Zone,
    color: Rgb,
    decay: f64,
    frequency: f64,
}

impl Chase {
    pub fn new(
        layout: &ZoneLayout,
        color: Rgb,
        decay: f64,
        ring: RingIndex,
        frequency: f64,
    ) -> Result<Self, LayoutError> {
        Ok(Self {
            zone: layout.ring(ring)?,
            color,
            decay,
            frequency,
        })
    }
}

impl Animation for Chase {
    fn bind(&self, waves: &Waves) {
        waves.set_color(self.color);
        waves.frequency.set(self.frequency);
        waves.decay.set(self.decay);
    }

    fn render(&self, waves: &Waves, frame: &mut PixelBuffer) -> Result<(), SignalError> {
        for led in 0..self.zone.count {
            waves.set_pixel_phase(led, self.zone.count);
            frame.set(self.zone.offset + led, waves.decay_wave.rgb()?);
        }
        Ok(())
    }
}

/// A chase plus a second ring filled in proportion to the latest timer
/// sample.
pub struct ChaseWithTimer {
    chase: Chase,
    timer_zone: Zone,
    timer_color: Rgb,
}

impl ChaseWithTimer {
    pub fn new(
        layout: &ZoneLayout,
        chase: Chase,
        timer_color: Rgb,
        timer_ring: RingIndex,
    ) -> Result<Self, LayoutError> {
        Ok(Self {
            chase,
            timer_zone: layout.ring(timer_ring)?,
            timer_color,
        })
    }
}

impl Animation for ChaseWithTimer {
    fn bind(&self, waves: &Waves) {
        self.chase.bind(waves);
        waves.set_timer_color(self.timer_color);
        waves.timer.set(0.0);
    }

    fn uses_timer(&self) -> bool {
        true
    }

    fn render(&self, waves: &Waves, frame: &mut PixelBuffer) -> Result<(), SignalError> {
        self.chase.render(waves, frame)?;

        for led in 0..self.timer_zone.count {
            waves.set_pixel_phase(led, self.timer_zone.count);
            frame.set(self.timer_zone.offset + led, waves.timer_wave.rgb()?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::sleep;

    use crate::control::send_timer;
    use crate::effects::testing::*;
    use crate::effects::EffectCommand;
    use crate::pixels::{RingIndex, Rgb};

    fn brightest(pixels: &[Rgb]) -> usize {
        pixels
            .iter()
            .enumerate()
            .max_by_key(|(_, p)| p.r)
            .map(|(i, _)| i)
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn comet_moves_around_the_ring() {
        let mut rig = rig(RecordingSink::default());
        let control_tx = rig.control_tx.clone();

        tokio::spawn(async move {
            sleep(Duration::from_millis(300)).await;
            control_tx.send(EffectCommand::Kill).unwrap();
        });

        EffectCommand::Chase {
            color: Rgb::new(128, 0, 0),
            decay: 5.0,
            ring: RingIndex::OUTER,
            frequency: 1.0,
        }
        .run(&mut rig.lights, &mut rig.control)
        .await
        .unwrap();

        let shown = rig.lights.sink().shown();
        let first = &shown[0][467..491];
        let later = &shown[shown.len() - 2][467..491];

        // inner rings are left alone
        assert!(shown[0][448..467].iter().all(|p| *p == Rgb::OFF));
        assert_eq!(first[brightest(first)], Rgb::new(128, 0, 0));
        assert_ne!(brightest(first), brightest(later));
    }

    #[tokio::test(start_paused = true)]
    async fn timer_ring_tracks_latest_sample() {
        let mut rig = rig(RecordingSink::default());
        for sample in [0.1, 0.25, 0.5] {
            send_timer(&rig.timer_tx, sample).unwrap();
        }
        rig.control_tx.send(EffectCommand::Kill).unwrap();

        EffectCommand::ChaseWithTimer {
            chase_color: Rgb::new(128, 0, 0),
            timer_color: Rgb::new(0, 128, 0),
            decay: 5.0,
            chase_ring: RingIndex::OUTER,
            timer_ring: RingIndex(-2),
            frequency: 1.0,
        }
        .run(&mut rig.lights, &mut rig.control)
        .await
        .unwrap();

        let shown = rig.lights.sink().shown();
        let timer_ring = &shown[0][455..467];
        let lit = timer_ring
            .iter()
            .filter(|p| **p == Rgb::new(0, 128, 0))
            .count();
        assert_eq!(lit, 6);
        assert!(timer_ring[..6].iter().all(|p| *p == Rgb::new(0, 128, 0)));
        assert!(timer_ring[6..].iter().all(|p| *p == Rgb::OFF));
    }

    #[tokio::test(start_paused = true)]
    async fn sample_sent_during_another_effect_reaches_the_timer_ring() {
        let mut rig = rig(RecordingSink::default());
        send_timer(&rig.timer_tx, 0.5).unwrap();
        // stays pending, so each effect below shows exactly one frame
        rig.control_tx.send(EffectCommand::Kill).unwrap();

        EffectCommand::HeartbeatSine {
            color: Rgb::new(50, 50, 50),
            frequency: 2.0,
        }
        .run(&mut rig.lights, &mut rig.control)
        .await
        .unwrap();

        EffectCommand::ChaseWithTimer {
            chase_color: Rgb::new(128, 0, 0),
            timer_color: Rgb::new(0, 128, 0),
            decay: 5.0,
            chase_ring: RingIndex::OUTER,
            timer_ring: RingIndex(-2),
            frequency: 1.0,
        }
        .run(&mut rig.lights, &mut rig.control)
        .await
        .unwrap();

        let shown = rig.lights.sink().shown();
        let timer_ring = &shown[shown.len() - 2][455..467];
        let lit = timer_ring
            .iter()
            .filter(|p| **p == Rgb::new(0, 128, 0))
            .count();
        assert_eq!(lit, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_sample_is_kept_when_nothing_new_arrives() {
        let mut rig = rig(RecordingSink::default());
        let control_tx = rig.control_tx.clone();
        let timer_tx = rig.timer_tx.clone();

        tokio::spawn(async move {
            sleep(Duration::from_millis(30)).await;
            send_timer(&timer_tx, 0.25).unwrap();
            sleep(Duration::from_millis(200)).await;
            control_tx.send(EffectCommand::Kill).unwrap();
        });

        EffectCommand::ChaseWithTimer {
            chase_color: Rgb::new(128, 0, 0),
            timer_color: Rgb::new(0, 128, 0),
            decay: 5.0,
            chase_ring: RingIndex::OUTER,
            timer_ring: RingIndex(-2),
            frequency: 1.0,
        }
        .run(&mut rig.lights, &mut rig.control)
        .await
        .unwrap();

        let shown = rig.lights.sink().shown();
        let last_effect_frame = &shown[shown.len() - 2][455..467];
        let lit = last_effect_frame
            .iter()
            .filter(|p| **p == Rgb::new(0, 128, 0))
            .count();
        assert_eq!(lit, 3);
    }
}
