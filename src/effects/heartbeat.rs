use crate::pixels::{PixelBuffer, Rgb, Zone, ZoneLayout};
use crate::signal::SignalError;

use super::waves::Waves;
use super::Animation;

/// All rings breathing together on a sine.
pub struct HeartbeatSine {
    zone: Zone,
    color: Rgb,
    frequency: f64,
}

impl HeartbeatSine {
    pub fn new(layout: &ZoneLayout, color: Rgb, frequency: f64) -> Self {
        Self {
            zone: layout.all_rings(),
            color,
            frequency,
        }
    }
}

impl Animation for HeartbeatSine {
    fn bind(&self, waves: &Waves) {
        waves.set_color(self.color);
        waves.frequency.set(self.frequency);
        waves.pi_phase.set(0.0);
    }

    fn render(&self, waves: &Waves, frame: &mut PixelBuffer) -> Result<(), SignalError> {
        frame.fill(self.zone, waves.sine_wave.rgb()?);
        Ok(())
    }
}

/// All rings blinking together, on for `duty` of every period.
pub struct HeartbeatSquare {
    zone: Zone,
    color: Rgb,
    frequency: f64,
    duty: f64,
}

impl HeartbeatSquare {
    pub fn new(layout: &ZoneLayout, color: Rgb, frequency: f64, duty: f64) -> Self {
        Self {
            zone: layout.all_rings(),
            color,
            frequency,
            duty,
        }
    }
}

impl Animation for HeartbeatSquare {
    fn bind(&self, waves: &Waves) {
        waves.set_color(self.color);
        waves.frequency.set(self.frequency);
        waves.duty.set(self.duty);
        waves.pi_phase.set(0.0);
    }

    fn render(&self, waves: &Waves, frame: &mut PixelBuffer) -> Result<(), SignalError> {
        frame.fill(self.zone, waves.square_wave.rgb()?);
        Ok(())
    }
}
