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
use std::error::Error;

use tracing::{debug, info, span, warn, Level};

use crate::{
    catalog::{Catalog, Command},
    config,
    effects::{Breathe, ColorSlot, EffectKind, EffectParameters, ParameterError},
    protocol::{vocabulary, Client, ProtocolError},
    readiness,
    scheduler::{Scheduler, Selection},
    transport::Transport,
};

pub mod keyboard;
mod runner;

pub use runner::Runner;

/// Changes requested by a UI collaborator. They are applied between scheduler cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Makes the given effect the one that repeats.
    SetEffect(EffectKind),

    /// Sets one of the two colors from a hex string.
    SetColor { slot: ColorSlot, hex: String },

    /// Sets the brightness, which is applied once on the next ready cycle.
    SetBrightness(i64),

    /// Sets the total duration of one effect cycle in milliseconds.
    SetInterval(i64),

    /// Sets the first LED addressed by single and range effects.
    SetStartIndex(i64),

    /// Sets the step count used by range and fade effects.
    SetStepCount(i64),

    /// Stops the scheduler.
    Quit,
}

/// The outcome of one scheduler cycle.
#[derive(Debug)]
pub enum Tick {
    /// The device did not report itself idle. Nothing was sent.
    NotReady,

    /// The command was sent and acknowledged.
    Invoked(Command),

    /// The command could not be completed. It is retried on the next cycle.
    Skipped(ProtocolError),
}

/// Owns the link to the strip and everything the repeat scheduler needs: the parameter
/// store, the override state machine and the breathe phase.
pub struct LedController<T: Transport> {
    catalog: Catalog<T>,
    params: EffectParameters,
    scheduler: Scheduler,
    breathe: Breathe,
    cycle: u64,
}

impl<T: Transport> LedController<T> {
    /// Creates a controller over the given link using the configured timings. Stale input is
    /// discarded and the configured brightness is applied on the first ready cycle.
    pub fn new(
        transport: T,
        config: &config::Controller,
    ) -> Result<LedController<T>, Box<dyn Error>> {
        let client = Client::new(
            transport,
            vocabulary::codec()?,
            config.ack_timeout()?,
            config.poll_interval()?,
        );
        Ok(LedController::from_client(
            client,
            config.leds(),
            config.brightness(),
            config.effect()?,
        )?)
    }

    /// Creates a controller from an existing client.
    pub fn from_client(
        mut client: Client<T>,
        leds: u8,
        brightness: u8,
        effect: EffectKind,
    ) -> Result<LedController<T>, ProtocolError> {
        client.clear_input()?;
        info!(
            link = client.transport().name(),
            leds,
            brightness,
            effect = %effect,
            "Controller ready."
        );

        let mut scheduler = Scheduler::new(effect);
        scheduler.request_override();

        Ok(LedController {
            catalog: Catalog::new(client, leds),
            params: EffectParameters::new(leds, brightness),
            scheduler,
            breathe: Breathe::new(),
            cycle: 0,
        })
    }

    pub fn params(&self) -> &EffectParameters {
        &self.params
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The number of cycles that found the device ready.
    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    pub fn breathe(&self) -> &Breathe {
        &self.breathe
    }

    /// Makes the given effect the one that repeats.
    pub fn set_active_command(&mut self, kind: EffectKind) {
        if kind == EffectKind::Breathe && self.scheduler.active() != EffectKind::Breathe {
            self.breathe.reset();
        }
        info!(effect = %kind, "Active effect changed.");
        self.scheduler.set_active(kind);
    }

    /// Sets the total duration of one effect cycle.
    pub fn set_interval(&mut self, interval_ms: i64) {
        self.params.set_interval(interval_ms);
        debug!(interval_ms = self.params.interval_ms(), "Interval changed.");
    }

    /// Sets a color from a hex string such as "#FF8800".
    pub fn set_color(&mut self, hex: &str, slot: ColorSlot) -> Result<(), ParameterError> {
        self.params.set_color_hex(slot, hex)?;
        debug!(
            slot = ?slot,
            color = format!("{:06X}", self.params.color(slot)),
            "Color changed."
        );
        Ok(())
    }

    /// Stores the brightness and schedules it to be applied on the next ready cycle.
    pub fn set_brightness(&mut self, brightness: i64) {
        self.params.set_brightness(brightness);
        debug!(brightness = self.params.brightness(), "Brightness changed.");
        self.scheduler.request_override();
    }

    pub fn set_start_index(&mut self, start_index: i64) {
        self.params.set_start_index(start_index);
    }

    pub fn set_step_count(&mut self, step_count: i64) {
        self.params.set_step_count(step_count);
    }

    /// Applies a collaborator event. Quit is left to whoever drives the scheduler.
    pub fn apply(&mut self, event: Event) -> Result<(), ParameterError> {
        match event {
            Event::SetEffect(kind) => self.set_active_command(kind),
            Event::SetColor { slot, hex } => self.set_color(&hex, slot)?,
            Event::SetBrightness(brightness) => self.set_brightness(brightness),
            Event::SetInterval(interval_ms) => self.set_interval(interval_ms),
            Event::SetStartIndex(start_index) => self.set_start_index(start_index),
            Event::SetStepCount(step_count) => self.set_step_count(step_count),
            Event::Quit => {}
        }
        Ok(())
    }

    /// Returns true if the device has sent anything that hasn't been read yet.
    pub fn has_pending_data(&self) -> bool {
        self.catalog.client().has_pending_data().unwrap_or_else(|e| {
            warn!(err = %e, "Unable to poll the device.");
            false
        })
    }

    /// Runs one scheduler cycle: waits for the device to report idle, then sends either the
    /// pending brightness or the active effect.
    pub fn tick(&mut self) -> Tick {
        let cycle = self.cycle + 1;
        let span = span!(Level::DEBUG, "tick", cycle);
        let _enter = span.enter();

        let trace_tag = format!("cycle {}", cycle);
        if !readiness::is_ready(self.catalog.client_mut(), &trace_tag) {
            return Tick::NotReady;
        }
        self.cycle = cycle;

        let selection = self.scheduler.select();
        let command = match selection {
            Selection::Brightness => Command::SetBrightness {
                brightness: self.params.brightness(),
            },
            Selection::Effect(kind) => self
                .params
                .command(kind)
                .unwrap_or_else(|| self.breathe.command(&self.params)),
        };

        match self.catalog.execute(&command) {
            Ok(ack) => {
                debug!(command = command.name(), ack = %ack, "Cycle complete.");
                self.scheduler.complete(selection);
                if selection == Selection::Effect(EffectKind::Breathe) {
                    self.breathe.advance();
                }
                Tick::Invoked(command)
            }
            Err(e) => {
                if e.is_link_failure() {
                    warn!(command = command.name(), err = %e, "Skipping cycle.");
                } else {
                    warn!(command = command.name(), err = %e, "Unable to send command.");
                }
                Tick::Skipped(e)
            }
        }
    }

    /// Switches the LEDs off and releases the link.
    pub fn shutdown(mut self) -> T {
        if let Err(e) = self.catalog.leds_off(0) {
            warn!(err = %e, "Unable to switch the LEDs off.");
        }
        info!("program end");
        self.catalog.into_client().into_transport()
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;
    use crate::{
        effects::Phase,
        protocol::{Frame, Value},
        scheduler::SchedulerState,
        transport::test::Device,
    };

    const WHITE: u32 = 0xFF_FFFF;

    fn controller(device: &Device, effect: EffectKind) -> LedController<Device> {
        let client = Client::new(
            device.clone(),
            vocabulary::codec().unwrap(),
            Some(Duration::from_millis(50)),
            Duration::from_millis(1),
        );
        LedController::from_client(client, 60, 255, effect).unwrap()
    }

    /// Runs one ready cycle and returns the single frame it sent.
    fn ready_cycle(device: &Device, controller: &mut LedController<Device>) -> Frame {
        let before = device.received().len();
        device.push_status(false);
        assert!(matches!(controller.tick(), Tick::Invoked(_)));
        let received = device.received();
        assert_eq!(before + 1, received.len());
        received[before].clone()
    }

    fn brightness_frame(brightness: u8) -> Frame {
        Frame::new(vocabulary::SET_BRIGHTNESS_ALL, vec![Value::U8(brightness)])
    }

    #[test]
    fn test_initial_brightness_applied_first() {
        let device = Device::get("mock");
        let mut controller = controller(&device, EffectKind::Rainbow);

        assert_eq!(brightness_frame(255), ready_cycle(&device, &mut controller));
        assert_eq!(
            vocabulary::SET_PATTERN_RAINBOW,
            ready_cycle(&device, &mut controller).name()
        );
    }

    #[test]
    fn test_brightness_override_resumes_effect() {
        let device = Device::get("mock");
        let mut controller = controller(&device, EffectKind::Rainbow);
        ready_cycle(&device, &mut controller);

        let rainbow = ready_cycle(&device, &mut controller);
        assert_eq!(vocabulary::SET_PATTERN_RAINBOW, rainbow.name());

        controller.set_brightness(100);
        assert_eq!(
            SchedulerState::OverridePending {
                resume: EffectKind::Rainbow
            },
            controller.scheduler().state()
        );

        assert_eq!(brightness_frame(100), ready_cycle(&device, &mut controller));
        assert_eq!(rainbow, ready_cycle(&device, &mut controller));
        assert_eq!(
            SchedulerState::Normal {
                active: EffectKind::Rainbow
            },
            controller.scheduler().state()
        );
    }

    #[test]
    fn test_busy_tick_sends_nothing() {
        let device = Device::get("mock");
        let mut controller = controller(&device, EffectKind::Wipe);
        let state = controller.scheduler().state();
        let params = controller.params().clone();

        device.push_status(true);
        assert!(matches!(controller.tick(), Tick::NotReady));
        assert!(matches!(controller.tick(), Tick::NotReady));

        assert!(device.received().is_empty());
        assert_eq!(0, controller.cycles());
        assert_eq!(state, controller.scheduler().state());
        assert_eq!(&params, controller.params());
    }

    #[test]
    fn test_stall_skips_cycle_and_retries() {
        let device = Device::get("mock");
        let mut controller = controller(&device, EffectKind::Rainbow);

        device.set_silent(true);
        device.push_status(false);
        assert!(matches!(
            controller.tick(),
            Tick::Skipped(ProtocolError::LinkStall(_))
        ));
        assert!(controller.scheduler().is_override_pending());

        device.set_silent(false);
        assert_eq!(brightness_frame(255), ready_cycle(&device, &mut controller));
        assert!(!controller.scheduler().is_override_pending());
    }

    #[test]
    fn test_device_error_is_returned() {
        let device = Device::get("mock");
        let mut controller = controller(&device, EffectKind::Off);

        device.fail_next("bad command");
        device.push_status(false);
        assert!(matches!(controller.tick(), Tick::Invoked(_)));
        assert!(!controller.scheduler().is_override_pending());
    }

    #[test]
    fn test_breathe_alternates() {
        let device = Device::get("mock");
        let mut controller = controller(&device, EffectKind::Breathe);
        controller.set_color("#FFFFFF", ColorSlot::Primary).unwrap();
        controller.set_color("#000000", ColorSlot::Secondary).unwrap();
        ready_cycle(&device, &mut controller);

        let inhale = ready_cycle(&device, &mut controller);
        assert_eq!(vocabulary::SET_PATTERN_FADE, inhale.name());
        assert_eq!(&[Value::U32(WHITE), Value::U32(0)], &inhale.values()[..2]);
        assert_eq!(Phase::Exhale, controller.breathe().phase());

        let exhale = ready_cycle(&device, &mut controller);
        assert_eq!(&[Value::U32(0), Value::U32(WHITE)], &exhale.values()[..2]);
        assert_eq!(Phase::Inhale, controller.breathe().phase());
    }

    #[test]
    fn test_breathe_waits_for_acknowledgement() {
        let device = Device::get("mock");
        let mut controller = controller(&device, EffectKind::Breathe);
        ready_cycle(&device, &mut controller);

        device.set_silent(true);
        device.push_status(false);
        assert!(matches!(controller.tick(), Tick::Skipped(_)));
        assert_eq!(Phase::Inhale, controller.breathe().phase());
    }

    #[test]
    fn test_switching_to_breathe_resets_phase() {
        let device = Device::get("mock");
        let mut controller = controller(&device, EffectKind::Breathe);
        ready_cycle(&device, &mut controller);
        ready_cycle(&device, &mut controller);
        assert_eq!(Phase::Exhale, controller.breathe().phase());

        controller.set_active_command(EffectKind::Rainbow);
        controller.set_active_command(EffectKind::Breathe);
        assert_eq!(Phase::Inhale, controller.breathe().phase());
    }

    #[test]
    fn test_effect_change_during_override() {
        let device = Device::get("mock");
        let mut controller = controller(&device, EffectKind::Rainbow);

        controller.set_active_command(EffectKind::Scanner);
        assert_eq!(brightness_frame(255), ready_cycle(&device, &mut controller));
        assert_eq!(
            vocabulary::SET_PATTERN_SCANNER,
            ready_cycle(&device, &mut controller).name()
        );
    }

    #[test]
    fn test_apply_events() {
        let device = Device::get("mock");
        let mut controller = controller(&device, EffectKind::Off);
        ready_cycle(&device, &mut controller);

        controller
            .apply(Event::SetColor {
                slot: ColorSlot::Primary,
                hex: "#FF8800".to_string(),
            })
            .unwrap();
        controller.apply(Event::SetInterval(6000)).unwrap();
        controller.apply(Event::SetStartIndex(5)).unwrap();
        controller.apply(Event::SetStepCount(10)).unwrap();
        controller
            .apply(Event::SetEffect(EffectKind::SetRange))
            .unwrap();

        assert_eq!(
            Frame::new(
                vocabulary::SET_COLOR_RANGE,
                vec![
                    Value::U8(5),
                    Value::U8(10),
                    Value::U32(0xFF8800),
                    Value::U32(6000)
                ]
            ),
            ready_cycle(&device, &mut controller)
        );

        assert_eq!(
            Err(ParameterError::InvalidColor("orange".to_string())),
            controller.apply(Event::SetColor {
                slot: ColorSlot::Secondary,
                hex: "orange".to_string(),
            })
        );

        controller.apply(Event::SetBrightness(300)).unwrap();
        assert_eq!(brightness_frame(255), ready_cycle(&device, &mut controller));
    }

    #[test]
    fn test_has_pending_data() {
        let device = Device::get("mock");
        let controller = controller(&device, EffectKind::Off);

        assert!(!controller.has_pending_data());
        device.push_status(false);
        assert!(controller.has_pending_data());
    }

    #[test]
    fn test_stale_input_cleared() {
        let device = Device::get("mock");
        device.push_bytes(b"garbage;11,");
        let _controller = controller(&device, EffectKind::Off);
        assert_eq!(0, device.unread());
    }

    #[test]
    fn test_shutdown_switches_leds_off() {
        let device = Device::get("mock");
        let controller = controller(&device, EffectKind::Rainbow);

        controller.shutdown();
        assert_eq!(
            vec![Frame::new(vocabulary::SET_LEDS_OFF, vec![Value::U32(0)])],
            device.received()
        );
    }
}
