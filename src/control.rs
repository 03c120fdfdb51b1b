//! The two channels between the status poller and the rendering worker.
//!
//! The control channel carries [`EffectCommand`]s in order. The timer channel
//! carries progress samples of which only the newest matters.

use tokio::sync::mpsc::{
    self,
    error::{SendError, TryRecvError},
    UnboundedReceiver, UnboundedSender,
};

use crate::effects::EffectCommand;

pub type ControlSender = UnboundedSender<EffectCommand>;
pub type TimerSender = UnboundedSender<f64>;

pub fn control_channel() -> (ControlSender, ControlQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, ControlQueue::new(rx))
}

pub fn timer_channel() -> (TimerSender, TimerFeed) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, TimerFeed::new(rx))
}

/// Clamps a sample into `0..=1` and sends it without waiting.
pub fn send_timer(tx: &TimerSender, sample: f64) -> Result<(), SendError<f64>> {
    tx.send(sample.clamp(0.0, 1.0))
}

/// The only reader of the control channel.
///
/// A running effect asks [`ControlQueue::preempted`] between frames; a command
/// seen there is parked in `pending` and handed back by the next
/// [`ControlQueue::next`], so a peek never loses a command.
pub struct ControlQueue {
    rx: UnboundedReceiver<EffectCommand>,
    pending: Option<EffectCommand>,
}

impl ControlQueue {
    fn new(rx: UnboundedReceiver<EffectCommand>) -> ControlQueue {
        ControlQueue { rx, pending: None }
    }

    /// True once another command is waiting. Never blocks.
    pub fn preempted(&mut self) -> bool {
        if self.pending.is_some() {
            return true;
        }

        match self.rx.try_recv() {
            Ok(command) => {
                self.pending = Some(command);
                true
            }
            Err(TryRecvError::Empty) => false,
            // every sender is gone, nothing can ever replace this effect
            Err(TryRecvError::Disconnected) => {
                self.pending = Some(EffectCommand::Kill);
                true
            }
        }
    }

    /// Waits for the next command. A closed channel reads as `Kill`.
    pub async fn next(&mut self) -> EffectCommand {
        if let Some(command) = self.pending.take() {
            return command;
        }

        self.rx.recv().await.unwrap_or(EffectCommand::Kill)
    }
}

/// Latest-value view over the timer channel.
pub struct TimerFeed {
    rx: UnboundedReceiver<f64>,
}

impl TimerFeed {
    fn new(rx: UnboundedReceiver<f64>) -> TimerFeed {
        TimerFeed { rx }
    }

    /// Drains the backlog and returns the newest sample, if any arrived.
    pub fn latest(&mut self) -> Option<f64> {
        let mut latest = None;
        while let Ok(sample) = self.rx.try_recv() {
            latest = Some(sample);
        }
        latest
    }

    /// Throws away anything queued.
    pub fn clear(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixels::Rgb;

    #[tokio::test]
    async fn peeked_command_is_not_lost() {
        let (tx, mut queue) = control_channel();
        assert!(!queue.preempted());

        tx.send(EffectCommand::AllOff).unwrap();
        tx.send(EffectCommand::ProgressStep {
            color: Rgb::new(0, 1, 0),
        })
        .unwrap();

        assert!(queue.preempted());
        assert!(queue.preempted());
        assert_eq!(queue.next().await, EffectCommand::AllOff);
        assert_eq!(
            queue.next().await,
            EffectCommand::ProgressStep {
                color: Rgb::new(0, 1, 0)
            }
        );
    }

    #[tokio::test]
    async fn closed_channel_reads_as_kill() {
        let (tx, mut queue) = control_channel();
        drop(tx);

        assert!(queue.preempted());
        assert_eq!(queue.next().await, EffectCommand::Kill);
        assert_eq!(queue.next().await, EffectCommand::Kill);
    }

    #[test]
    fn timer_keeps_only_newest_sample() {
        let (tx, mut feed) = timer_channel();
        assert_eq!(feed.latest(), None);

        for sample in [0.1, 0.2, 1.7] {
            send_timer(&tx, sample).unwrap();
        }
        assert_eq!(feed.latest(), Some(1.0));
        assert_eq!(feed.latest(), None);

        send_timer(&tx, 0.4).unwrap();
        feed.clear();
        assert_eq!(feed.latest(), None);
    }
}
