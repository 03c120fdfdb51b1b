use std::f64::consts::PI;

use super::{period, Signal, SignalResult, SignalSource};

/// `amplitude * sin(2π * frequency * time + phase)`
#[derive(Clone)]
pub struct SineWave {
    pub time: SignalSource,
    pub amplitude: SignalSource,
    pub frequency: SignalSource,
    pub phase: SignalSource,
}

impl Default for SineWave {
    fn default() -> Self {
        Self {
            time: 0.0.into(),
            amplitude: 1.0.into(),
            frequency: 1.0.into(),
            phase: 0.0.into(),
        }
    }
}

impl SineWave {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time(mut self, time: impl Into<SignalSource>) -> Self {
        self.time = time.into();
        self
    }

    pub fn frequency(mut self, frequency: impl Into<SignalSource>) -> Self {
        self.frequency = frequency.into();
        self
    }

    pub fn phase(mut self, phase: impl Into<SignalSource>) -> Self {
        self.phase = phase.into();
        self
    }
}

impl Signal for SineWave {
    fn value(&self) -> SignalResult<f64> {
        let t = self.time.value()?;
        let f = self.frequency.value()?;
        let phase = self.phase.value()?;

        Ok(self.amplitude.value()? * f64::sin(2.0 * PI * f * t + phase))
    }

    fn range(&self) -> SignalResult<Option<(f64, f64)>> {
        let amplitude = self.amplitude.value()?;
        Ok(Some((-amplitude, amplitude)))
    }
}

/// `+amplitude` for the first `duty` fraction of every period, `-amplitude`
/// for the rest.
#[derive(Clone)]
pub struct SquareWave {
    pub time: SignalSource,
    pub amplitude: SignalSource,
    pub frequency: SignalSource,
    pub phase: SignalSource,
    pub duty: SignalSource,
}

impl Default for SquareWave {
    fn default() -> Self {
        Self {
            time: 0.0.into(),
            amplitude: 1.0.into(),
            frequency: 1.0.into(),
            phase: 0.0.into(),
            duty: 0.5.into(),
        }
    }
}

impl SquareWave {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time(mut self, time: impl Into<SignalSource>) -> Self {
        self.time = time.into();
        self
    }

    pub fn frequency(mut self, frequency: impl Into<SignalSource>) -> Self {
        self.frequency = frequency.into();
        self
    }

    pub fn phase(mut self, phase: impl Into<SignalSource>) -> Self {
        self.phase = phase.into();
        self
    }

    pub fn duty(mut self, duty: impl Into<SignalSource>) -> Self {
        self.duty = duty.into();
        self
    }
}

impl Signal for SquareWave {
    fn value(&self) -> SignalResult<f64> {
        let cycle = period(self.frequency.value()?)?;
        let reminder = (self.time.value()? + self.phase.value()?).rem_euclid(cycle);
        let amplitude = self.amplitude.value()?;

        if reminder < self.duty.value()? * cycle {
            Ok(amplitude)
        } else {
            Ok(-amplitude)
        }
    }

    fn range(&self) -> SignalResult<Option<(f64, f64)>> {
        let amplitude = self.amplitude.value()?;
        Ok(Some((-amplitude, amplitude)))
    }
}

/// Sawtooth-reset exponential decay: `amplitude * exp(-decay * r)` where `r`
/// restarts from zero at every period.
#[derive(Clone)]
pub struct DecayWave {
    pub time: SignalSource,
    pub amplitude: SignalSource,
    pub frequency: SignalSource,
    pub phase: SignalSource,
    pub decay: SignalSource,
}

impl Default for DecayWave {
    fn default() -> Self {
        Self {
            time: 0.0.into(),
            amplitude: 1.0.into(),
            frequency: 1.0.into(),
            phase: 0.0.into(),
            decay: 0.0.into(),
        }
    }
}

impl DecayWave {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time(mut self, time: impl Into<SignalSource>) -> Self {
        self.time = time.into();
        self
    }

    pub fn frequency(mut self, frequency: impl Into<SignalSource>) -> Self {
        self.frequency = frequency.into();
        self
    }

    pub fn phase(mut self, phase: impl Into<SignalSource>) -> Self {
        self.phase = phase.into();
        self
    }

    pub fn decay(mut self, decay: impl Into<SignalSource>) -> Self {
        self.decay = decay.into();
        self
    }
}

impl Signal for DecayWave {
    fn value(&self) -> SignalResult<f64> {
        let cycle = period(self.frequency.value()?)?;
        let reminder = (self.time.value()? + self.phase.value()?).rem_euclid(cycle);

        Ok(self.amplitude.value()? * f64::exp(-self.decay.value()? * reminder))
    }

    fn range(&self) -> SignalResult<Option<(f64, f64)>> {
        Ok(Some((0.0, self.amplitude.value()?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{Param, SignalError};

    #[test]
    fn sine_follows_formula_and_amplitude() {
        let time = Param::new(0.0);
        let amplitude = Param::new(2.0);
        let wave = SineWave {
            amplitude: (&amplitude).into(),
            ..SineWave::new().time(&time).frequency(0.5)
        };

        time.set(0.5);
        assert!((wave.value().unwrap() - 2.0 * f64::sin(PI * 0.5)).abs() < 1e-12);
        assert_eq!(wave.range().unwrap(), Some((-2.0, 2.0)));

        // amplitude is re-read on every call
        amplitude.set(3.0);
        assert!((wave.value().unwrap() - 3.0).abs() < 1e-12);
        assert_eq!(wave.range().unwrap(), Some((-3.0, 3.0)));
    }

    #[test]
    fn square_holds_high_for_duty_fraction() {
        let time = Param::new(0.0);
        let wave = SquareWave {
            amplitude: 5.0.into(),
            ..SquareWave::new().time(&time).frequency(2.0).duty(0.25)
        };

        let samples = 400;
        let mut high = 0;
        for i in 0..samples {
            time.set(0.5 * i as f64 / samples as f64);
            match wave.value().unwrap() {
                v if v == 5.0 => high += 1,
                v => assert_eq!(v, -5.0),
            }
        }
        assert_eq!(high, samples / 4);
    }

    #[test]
    fn square_is_invariant_under_whole_period_shift() {
        let time = Param::new(0.0);
        let wave = SquareWave::new().time(&time).frequency(4.0).duty(0.3);

        for &t in &[0.01, 0.05, 0.07, 0.2, 0.24] {
            time.set(t);
            let v = wave.value().unwrap();
            for k in 1..5 {
                time.set(t + k as f64 * 0.25);
                assert_eq!(wave.value().unwrap(), v, "t = {t}, k = {k}");
            }
        }
    }

    #[test]
    fn decay_starts_at_amplitude_and_falls_until_reset() {
        let time = Param::new(0.0);
        let wave = DecayWave {
            amplitude: 10.0.into(),
            ..DecayWave::new().time(&time).frequency(1.0).decay(3.0)
        };

        assert_eq!(wave.value().unwrap(), 10.0);
        assert_eq!(wave.range().unwrap(), Some((0.0, 10.0)));

        let mut last = wave.value().unwrap();
        for i in 1..100 {
            time.set(i as f64 / 100.0);
            let v = wave.value().unwrap();
            assert!(v < last);
            last = v;
        }

        time.set(1.0);
        assert_eq!(wave.value().unwrap(), 10.0);
    }

    #[test]
    fn negative_time_wraps_into_period() {
        let wave = DecayWave::new().time(-0.25).decay(1.0);
        assert!((wave.value().unwrap() - f64::exp(-0.75)).abs() < 1e-12);
    }

    #[test]
    fn zero_frequency_fails_fast() {
        let frequency = Param::new(0.0);
        let square = SquareWave::new().frequency(&frequency);
        let decay = DecayWave::new().frequency(&frequency);

        assert_eq!(square.value(), Err(SignalError::ZeroFrequency(0.0)));
        assert_eq!(decay.value(), Err(SignalError::ZeroFrequency(0.0)));
        assert!(SineWave::new().frequency(&frequency).value().is_ok());
    }
}
