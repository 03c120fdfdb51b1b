use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use thiserror::Error;

pub mod transformed;
pub mod wave;

pub use transformed::TransformedSignal;
pub use wave::{DecayWave, SineWave, SquareWave};

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum SignalError {
    #[error("frequency {0} has no usable period")]
    ZeroFrequency(f64),
    #[error("signal range ({0}, {1}) is degenerate")]
    DegenerateRange(f64, f64),
}

pub type SignalResult<T> = Result<T, SignalError>;

/// A scalar that can be read at any time.
///
/// Reading never mutates anything: signals change only when one of the
/// [`Param`]s they are built from is `set`.
pub trait Signal: Send + Sync {
    fn value(&self) -> SignalResult<f64>;

    /// Known bounds of `value()`, if any.
    fn range(&self) -> SignalResult<Option<(f64, f64)>> {
        Ok(None)
    }

    /// Maps the current value into `y0..=y1`.
    ///
    /// Interpolates linearly when the range is known, otherwise clamps.
    fn transform(&self, y0: f64, y1: f64) -> SignalResult<f64> {
        let x = self.value()?;

        match self.range()? {
            Some((lo, hi)) => {
                if hi == lo {
                    return Err(SignalError::DegenerateRange(lo, hi));
                }
                Ok(y0 + (x - lo) * ((y1 - y0) / (hi - lo)))
            }
            None => Ok(f64::max(y0, f64::min(y1, x))),
        }
    }

    fn discrete_transform(&self, y0: f64, y1: f64) -> SignalResult<f64> {
        Ok(self.transform(y0, y1)?.trunc())
    }
}

/// Either a fixed number or another signal, read through the same call.
#[derive(Clone)]
pub enum SignalSource {
    Constant(f64),
    Signal(Arc<dyn Signal>),
}

impl SignalSource {
    pub fn value(&self) -> SignalResult<f64> {
        match self {
            SignalSource::Constant(value) => Ok(*value),
            SignalSource::Signal(signal) => signal.value(),
        }
    }
}

impl Default for SignalSource {
    fn default() -> Self {
        SignalSource::Constant(0.0)
    }
}

impl From<f64> for SignalSource {
    fn from(value: f64) -> Self {
        SignalSource::Constant(value)
    }
}

impl From<Param> for SignalSource {
    fn from(param: Param) -> Self {
        SignalSource::Signal(Arc::new(param))
    }
}

impl From<&Param> for SignalSource {
    fn from(param: &Param) -> Self {
        param.clone().into()
    }
}

impl<S: Signal + 'static> From<Arc<S>> for SignalSource {
    fn from(signal: Arc<S>) -> Self {
        SignalSource::Signal(signal)
    }
}

/// Shared, settable scalar. Clones observe the same value.
///
/// The f64 is stored as raw bits so readers on the render loop never block.
#[derive(Clone, Debug)]
pub struct Param(Arc<AtomicU64>);

impl Param {
    pub fn new(value: f64) -> Param {
        Param(Arc::new(AtomicU64::new(value.to_bits())))
    }

    pub fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }
}

impl Default for Param {
    fn default() -> Self {
        Param::new(0.0)
    }
}

impl Signal for Param {
    fn value(&self) -> SignalResult<f64> {
        Ok(self.get())
    }
}

/// Period of a wave, refusing frequencies that would divide by zero.
pub(crate) fn period(frequency: f64) -> SignalResult<f64> {
    let period = 1.0 / frequency;
    if !(period.is_finite() && period > 0.0) {
        return Err(SignalError::ZeroFrequency(frequency));
    }
    Ok(period)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ranged {
        x: f64,
        lo: f64,
        hi: f64,
    }

    impl Signal for Ranged {
        fn value(&self) -> SignalResult<f64> {
            Ok(self.x)
        }

        fn range(&self) -> SignalResult<Option<(f64, f64)>> {
            Ok(Some((self.lo, self.hi)))
        }
    }

    #[test]
    fn transform_interpolates_known_range() {
        for &(x, lo, hi, y0, y1) in &[
            (0.0, -1.0, 1.0, 0.0, 128.0),
            (0.5, 0.0, 2.0, 10.0, 30.0),
            (-0.25, -1.0, 1.0, 255.0, 0.0),
            (3.0, 3.0, 7.0, 5.0, 9.0),
        ] {
            let signal = Ranged { x, lo, hi };
            let expected = y0 + (x - lo) * (y1 - y0) / (hi - lo);
            let got = signal.transform(y0, y1).unwrap();
            assert!((got - expected).abs() < 1e-9, "{got} != {expected}");
            assert_eq!(signal.discrete_transform(y0, y1).unwrap(), got.trunc());
        }
    }

    #[test]
    fn transform_clamps_without_range() {
        let param = Param::new(300.0);
        assert_eq!(param.transform(0.0, 255.0).unwrap(), 255.0);
        param.set(-4.0);
        assert_eq!(param.transform(0.0, 255.0).unwrap(), 0.0);
        param.set(17.5);
        assert_eq!(param.transform(0.0, 255.0).unwrap(), 17.5);
        assert_eq!(param.discrete_transform(0.0, 255.0).unwrap(), 17.0);
    }

    #[test]
    fn degenerate_range_is_an_error() {
        let signal = Ranged {
            x: 1.0,
            lo: 1.0,
            hi: 1.0,
        };
        assert_eq!(
            signal.transform(0.0, 1.0),
            Err(SignalError::DegenerateRange(1.0, 1.0))
        );
    }

    #[test]
    fn param_clones_share_state() {
        let a = Param::new(1.0);
        let source: SignalSource = (&a).into();
        a.set(2.5);
        assert_eq!(source.value().unwrap(), 2.5);
    }

    #[test]
    fn zero_frequency_has_no_period() {
        assert_eq!(period(0.0), Err(SignalError::ZeroFrequency(0.0)));
        assert_eq!(period(4.0), Ok(0.25));
    }
}
