use super::{Signal, SignalResult, SignalSource};

/// A carrier signal remapped into `y0..=y1`.
///
/// One of these drives each color channel of an effect: `y0` is the glow
/// floor and `y1` the power ceiling of that channel. Both ends may be live
/// signals themselves.
pub struct TransformedSignal {
    source: Box<dyn Signal>,
    y0: SignalSource,
    y1: SignalSource,
    discrete: bool,
}

impl TransformedSignal {
    pub fn new(
        source: impl Signal + 'static,
        y0: impl Into<SignalSource>,
        y1: impl Into<SignalSource>,
        discrete: bool,
    ) -> Self {
        Self {
            source: Box::new(source),
            y0: y0.into(),
            y1: y1.into(),
            discrete,
        }
    }
}

impl Signal for TransformedSignal {
    fn value(&self) -> SignalResult<f64> {
        let y0 = self.y0.value()?;
        let y1 = self.y1.value()?;

        if self.discrete {
            self.source.discrete_transform(y0, y1)
        } else {
            self.source.transform(y0, y1)
        }
    }

    fn range(&self) -> SignalResult<Option<(f64, f64)>> {
        Ok(Some((self.y0.value()?, self.y1.value()?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{DecayWave, Param, SineWave};

    #[test]
    fn maps_carrier_into_intensity_band() {
        let time = Param::new(0.25);
        let glow = Param::new(10.0);
        let power = Param::new(110.0);
        let channel = TransformedSignal::new(
            SineWave::new().time(&time),
            &glow,
            &power,
            false,
        );

        // sin(π/2) = 1 sits on the ceiling
        assert!((channel.value().unwrap() - 110.0).abs() < 1e-9);

        time.set(0.0);
        assert!((channel.value().unwrap() - 60.0).abs() < 1e-9);

        power.set(30.0);
        assert!((channel.value().unwrap() - 20.0).abs() < 1e-9);
        assert_eq!(channel.range().unwrap(), Some((10.0, 30.0)));
    }

    #[test]
    fn discrete_mode_truncates() {
        let time = Param::new(0.1);
        let carrier = DecayWave::new().time(&time).decay(1.0);
        let expected = (128.0 * f64::exp(-0.1)).trunc();

        let channel = TransformedSignal::new(carrier, 0.0, 128.0, true);
        assert_eq!(channel.value().unwrap(), expected);
    }
}
