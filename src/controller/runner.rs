// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{error::Error, io, thread, time::Duration};

use tokio::sync::mpsc::{error::TryRecvError, Receiver};
use tracing::{error, info, span, Level};

use crate::{cancel::CancelHandle, transport::Transport};

use super::{Event, LedController};

/// Drives the scheduler on its own thread. Each cycle first applies any queued events, then
/// ticks once, then waits for the tick interval or a cancel request.
pub struct Runner<T: Transport + 'static> {
    cancel_handle: CancelHandle,
    join: thread::JoinHandle<LedController<T>>,
}

impl<T: Transport + 'static> Runner<T> {
    /// Starts the scheduler thread. Cancelling the handle stops it after the current cycle.
    pub fn start(
        controller: LedController<T>,
        tick_interval: Duration,
        events_rx: Receiver<Event>,
        cancel_handle: CancelHandle,
    ) -> io::Result<Runner<T>> {
        let join = {
            let cancel_handle = cancel_handle.clone();
            thread::Builder::new()
                .name("scheduler".to_string())
                .spawn(move || run(controller, tick_interval, events_rx, cancel_handle))?
        };

        Ok(Runner {
            cancel_handle,
            join,
        })
    }

    /// Stops the scheduler and hands the controller back for shutdown.
    pub fn stop(self) -> Result<LedController<T>, Box<dyn Error>> {
        self.cancel_handle.cancel();
        self.join
            .join()
            .map_err(|_| "scheduler thread panicked".into())
    }
}

fn run<T: Transport>(
    mut controller: LedController<T>,
    tick_interval: Duration,
    mut events_rx: Receiver<Event>,
    cancel_handle: CancelHandle,
) -> LedController<T> {
    let span = span!(Level::INFO, "scheduler");
    let _enter = span.enter();

    info!(
        effect = %controller.scheduler().active(),
        tick_interval = format!("{:?}", tick_interval),
        "Scheduler started."
    );

    loop {
        loop {
            match events_rx.try_recv() {
                Ok(Event::Quit) => {
                    info!("Quit requested.");
                    cancel_handle.cancel();
                }
                Ok(event) => {
                    info!(event = format!("{:?}", event), "Received event.");
                    if let Err(e) = controller.apply(event) {
                        error!(err = %e, "Unable to apply event.");
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        if cancel_handle.is_cancelled() {
            break;
        }
        controller.tick();
        if cancel_handle.wait_timeout(tick_interval) {
            break;
        }
    }

    info!("Scheduler stopped.");
    controller
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        effects::EffectKind,
        protocol::{vocabulary, Client},
        testutil::eventually,
        transport::test::Device,
    };

    fn start(device: &Device) -> (Runner<Device>, mpsc::Sender<Event>, CancelHandle) {
        let client = Client::new(
            Device::clone(device),
            vocabulary::codec().unwrap(),
            Some(Duration::from_millis(50)),
            Duration::from_millis(1),
        );
        let controller = LedController::from_client(client, 30, 128, EffectKind::Rainbow).unwrap();
        let (events_tx, events_rx) = mpsc::channel(10);
        let cancel_handle = CancelHandle::new();
        let runner = Runner::start(
            controller,
            Duration::from_millis(5),
            events_rx,
            cancel_handle.clone(),
        )
        .unwrap();
        (runner, events_tx, cancel_handle)
    }

    fn sent(device: &Device, name: &str) -> bool {
        device.received().iter().any(|frame| frame.name() == name)
    }

    #[test]
    fn test_runner_repeats_active_effect() {
        let device = Device::idle("mock").unwrap();
        let (runner, _events_tx, _cancel_handle) = start(&device);

        eventually(
            || {
                device
                    .received()
                    .iter()
                    .filter(|frame| frame.name() == vocabulary::SET_PATTERN_RAINBOW)
                    .count()
                    >= 3
            },
            "Rainbow was never repeated",
        );
        assert_eq!(vocabulary::SET_BRIGHTNESS_ALL, device.received()[0].name());

        let controller = runner.stop().unwrap();
        assert_eq!(EffectKind::Rainbow, controller.scheduler().active());
    }

    #[test]
    fn test_runner_applies_events() {
        let device = Device::idle("mock").unwrap();
        let (runner, events_tx, _cancel_handle) = start(&device);

        events_tx
            .blocking_send(Event::SetEffect(EffectKind::Scanner))
            .unwrap();
        eventually(
            || sent(&device, vocabulary::SET_PATTERN_SCANNER),
            "Scanner was never sent",
        );

        let controller = runner.stop().unwrap();
        assert_eq!(EffectKind::Scanner, controller.scheduler().active());
    }

    #[test]
    fn test_runner_quits_on_event() {
        let device = Device::idle("mock").unwrap();
        let (runner, events_tx, cancel_handle) = start(&device);

        events_tx.blocking_send(Event::Quit).unwrap();
        eventually(|| cancel_handle.is_cancelled(), "Quit was never handled");

        let controller = runner.stop().unwrap();
        controller.shutdown();
        assert_eq!(
            vocabulary::SET_LEDS_OFF,
            device.received().last().unwrap().name()
        );
    }
}
