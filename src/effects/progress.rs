use crate::pixels::{RingIndex, Rgb};

use super::{EffectError, Lights, PixelSink, SinkError};

/// Cursor for the step-wise progress indicator on the outermost ring.
#[derive(Debug, Default)]
pub struct Progress {
    cursor: usize,
    /// What the cursor pixel showed before it was lit.
    saved: Option<Rgb>,
}

impl Progress {
    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[cfg(test)]
    pub fn saved(&self) -> Option<Rgb> {
        self.saved
    }

    pub fn reset(&mut self) {
        *self = Progress::default();
    }
}

impl<S: PixelSink> Lights<S> {
    /// Moves the lit pixel one step along the outer ring, putting back the
    /// color it covered.
    pub async fn progress_step(&mut self, color: Rgb) -> Result<(), EffectError> {
        let zone = self.layout.ring(RingIndex::OUTER)?;
        if zone.count == 0 {
            return Ok(());
        }

        if let Some(saved) = self.progress.saved {
            self.neutral.set(zone.offset + self.progress.cursor, saved);
        }

        self.progress.cursor = (self.progress.cursor + 1) % zone.count;
        let index = zone.offset + self.progress.cursor;
        self.progress.saved = Some(self.neutral.get(index));
        self.neutral.set(index, color);

        Ok(self.restore().await?)
    }

    /// Takes the progress pixel down again.
    pub async fn stop_progress(&mut self) -> Result<(), SinkError> {
        if let (Some(saved), Ok(zone)) = (
            self.progress.saved.take(),
            self.layout.ring(RingIndex::OUTER),
        ) {
            self.neutral.set(zone.offset + self.progress.cursor, saved);
        }
        self.restore().await
    }

    #[cfg(test)]
    pub fn progress(&self) -> &Progress {
        &self.progress
    }
}
