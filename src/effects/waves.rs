use std::{array, f64::consts::PI};

use crate::pixels::Rgb;
use crate::signal::{
    DecayWave, Param, Signal, SignalResult, SineWave, SquareWave, TransformedSignal,
};

/// One transformed carrier per color channel.
pub struct Channels([TransformedSignal; 3]);

impl Channels {
    fn new(channel: impl FnMut(usize) -> TransformedSignal) -> Channels {
        Channels(array::from_fn(channel))
    }

    pub fn rgb(&self) -> SignalResult<Rgb> {
        let [r, g, b] = &self.0;
        Ok(Rgb::from_channels(r.value()?, g.value()?, b.value()?))
    }
}

/// Shared parameters and the waveform stacks built on top of them.
///
/// Built once per rendering worker. Effects only ever `set` the params; the
/// stacks read them on every call.
pub struct Waves {
    pub clock: Param,
    pub frequency: Param,
    pub decay: Param,
    pub duty: Param,
    pub timer: Param,
    /// Linear pixel phase `i / n`.
    pub phase: Param,
    /// Angular pixel phase `2π i / n`.
    pub pi_phase: Param,

    power: [Param; 3],
    timer_power: [Param; 3],

    pub decay_wave: Channels,
    pub sine_wave: Channels,
    pub square_wave: Channels,
    pub timer_wave: Channels,
}

impl Waves {
    pub fn new(glow: Rgb, power: Rgb) -> Waves {
        let clock = Param::default();
        let frequency = Param::new(1.0);
        let decay = Param::new(1.0);
        let duty = Param::new(0.5);
        let timer = Param::default();
        let phase = Param::default();
        let pi_phase = Param::default();

        let glow = rgb_params(glow);
        let power = rgb_params(power);
        let timer_power = rgb_params(power_of(&power));

        let decay_wave = Channels::new(|c| {
            TransformedSignal::new(
                DecayWave::new()
                    .time(&clock)
                    .frequency(&frequency)
                    .phase(&phase)
                    .decay(&decay),
                &glow[c],
                &power[c],
                true,
            )
        });

        let sine_wave = Channels::new(|c| {
            TransformedSignal::new(
                SineWave::new()
                    .time(&clock)
                    .frequency(&frequency)
                    .phase(&pi_phase),
                &glow[c],
                &power[c],
                true,
            )
        });

        let square_wave = Channels::new(|c| {
            TransformedSignal::new(
                SquareWave::new()
                    .time(&clock)
                    .frequency(&frequency)
                    .phase(&pi_phase)
                    .duty(&duty),
                &glow[c],
                &power[c],
                true,
            )
        });

        // a progress bar: pixel i is lit while i / n < timer
        let timer_wave = Channels::new(|c| {
            TransformedSignal::new(
                SquareWave::new().time(0.0).frequency(1.0).phase(&phase).duty(&timer),
                &glow[c],
                &timer_power[c],
                true,
            )
        });

        Waves {
            clock,
            frequency,
            decay,
            duty,
            timer,
            phase,
            pi_phase,
            power,
            timer_power,
            decay_wave,
            sine_wave,
            square_wave,
            timer_wave,
        }
    }

    pub fn set_color(&self, color: Rgb) {
        set_rgb(&self.power, color);
    }

    pub fn set_timer_color(&self, color: Rgb) {
        set_rgb(&self.timer_power, color);
    }

    /// Points both phase params at pixel `led` of a ring of `count` pixels.
    pub fn set_pixel_phase(&self, led: usize, count: usize) {
        let fraction = led as f64 / count as f64;
        self.phase.set(fraction);
        self.pi_phase.set(2.0 * PI * fraction);
    }
}

fn rgb_params(color: Rgb) -> [Param; 3] {
    color.to_bytes().map(|c| Param::new(f64::from(c)))
}

fn power_of(params: &[Param; 3]) -> Rgb {
    let [r, g, b] = params.each_ref().map(|p| p.get());
    Rgb::from_channels(r, g, b)
}

fn set_rgb(params: &[Param; 3], color: Rgb) {
    for (param, channel) in params.iter().zip(color.to_bytes()) {
        param.set(f64::from(channel));
    }
}
