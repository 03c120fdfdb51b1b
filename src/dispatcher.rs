use tracing::{error, info, warn};

use crate::control::ControlQueue;
use crate::effects::{EffectCommand, Lights, PixelSink};

/// The rendering worker. Runs one command at a time, in arrival order, until
/// it is told to stop.
pub struct Dispatcher<S> {
    lights: Lights<S>,
    control: ControlQueue,
}

impl<S: PixelSink> Dispatcher<S> {
    pub fn new(lights: Lights<S>, control: ControlQueue) -> Self {
        Self { lights, control }
    }

    #[cfg(test)]
    pub fn lights(&self) -> &Lights<S> {
        &self.lights
    }

    pub async fn run(&mut self) {
        loop {
            let command = self.control.next().await;
            if command == EffectCommand::Kill {
                info!("rendering worker stopping");
                break;
            }

            if let Err(e) = command.run(&mut self.lights, &mut self.control).await {
                error!(effect = command.name(), "effect failed: {e:#}");

                if let Err(e) = self.lights.restore().await {
                    warn!("could not restore neutral frame: {e}");
                }
            }
        }
    }

    /// Runs until killed and hands the lights back.
    #[cfg(test)]
    pub async fn into_lights(mut self) -> Lights<S> {
        self.run().await;
        self.lights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::*;
    use crate::pixels::{RingIndex, Rgb};

    #[tokio::test(start_paused = true)]
    async fn commands_run_one_after_another() {
        let rig = rig(RecordingSink::default());
        for command in [
            EffectCommand::Pulse {
                color: Rgb::new(0, 0, 128),
                duration: 0.1,
            },
            EffectCommand::RingFill {
                ring: RingIndex::INNER,
                color: Rgb::new(150, 0, 0),
            },
            EffectCommand::Kill,
            EffectCommand::AllOff,
        ] {
            rig.control_tx.send(command).unwrap();
        }

        let mut dispatcher = Dispatcher::new(rig.lights, rig.control);
        dispatcher.run().await;

        let shown = dispatcher.lights().sink().shown();
        // the queued ring fill cuts the pulse short: off, on, off, then the
        // fill. Nothing runs after kill.
        assert_eq!(shown.len(), 4);
        assert!(shown[1][448..491].iter().all(|p| *p == Rgb::new(0, 0, 128)));
        assert!(shown[2].iter().all(|p| *p == Rgb::OFF));
        assert_eq!(shown[3][448], Rgb::new(150, 0, 0));
        assert!(shown[3][449..].iter().all(|p| *p == Rgb::OFF));
    }

    #[tokio::test(start_paused = true)]
    async fn pending_command_runs_after_the_one_it_preempted() {
        let rig = rig(RecordingSink::default());
        rig.control_tx
            .send(EffectCommand::SteadyFill {
                color: Rgb::new(9, 9, 9),
            })
            .unwrap();
        rig.control_tx.send(EffectCommand::CabinetOn).unwrap();
        rig.control_tx.send(EffectCommand::Kill).unwrap();

        let lights = Dispatcher::new(rig.lights, rig.control).into_lights().await;

        let shown = lights.sink().shown();
        assert_eq!(shown.len(), 3);
        assert_eq!(shown[0][448], Rgb::new(9, 9, 9));
        assert_eq!(shown[1][448], Rgb::OFF);
        assert!(shown[2][..30].iter().all(|p| *p == Rgb::new(255, 255, 255)));
    }

    #[tokio::test]
    async fn failed_effect_does_not_stop_the_worker() {
        let rig = rig(RecordingSink::default());
        rig.control_tx
            .send(EffectCommand::Chase {
                color: Rgb::new(128, 0, 0),
                decay: 1.0,
                ring: RingIndex(7),
                frequency: 1.0,
            })
            .unwrap();
        rig.control_tx.send(EffectCommand::AllOff).unwrap();
        rig.control_tx.send(EffectCommand::Kill).unwrap();

        let lights = Dispatcher::new(rig.lights, rig.control).into_lights().await;

        // the restore after the failure, then allOff
        assert_eq!(lights.sink().shown().len(), 2);
    }

    #[tokio::test]
    async fn sink_failures_are_survived() {
        let rig = rig(FailingSink);
        rig.control_tx.send(EffectCommand::AllOff).unwrap();
        rig.control_tx.send(EffectCommand::CabinetOn).unwrap();
        rig.control_tx.send(EffectCommand::Kill).unwrap();

        let lights = Dispatcher::new(rig.lights, rig.control).into_lights().await;
        assert_eq!(lights.neutral().get(0), Rgb::new(255, 255, 255));
    }

    #[tokio::test]
    async fn closed_channel_stops_the_worker() {
        let rig = rig(RecordingSink::default());
        drop(rig.control_tx);

        let lights = Dispatcher::new(rig.lights, rig.control).into_lights().await;
        assert!(lights.sink().frames.is_empty());
    }
}
