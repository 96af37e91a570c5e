//! The ECU main loop.
//!
//! One iteration: refresh telemetry timers, apply GUI input (chassis),
//! step the vehicle model, run the observer's value checks, emit telemetry,
//! poll the inner bus once and dispatch, snapshot the state, then transmit
//! every due periodic message.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use ve_canbus::{Clock, MessageRegistry, Observation, Scheduler, SecureBus, TimingMonitor};
use ve_protocol::ids::*;
use ve_protocol::{CanMessage, Diagnostic, EcuRole, MessageDefinition, VehicleState};

use crate::config::NodeConfig;
use crate::console::{apply_gui_input, parse_exd};
use crate::dynamics::Dynamics;
use crate::error::{NodeError, NodeResult};
use crate::gateway::{Gateway, Segment};
use crate::handlers;
use crate::serial::GuiPort;
use crate::telemetry::TelemetryWriter;
use crate::values::check_values;

const FAST_DLC: u8 = 64;
const SLOW_DLC: u8 = 8;

/// Periodic messages `role` transmits: `(id, dlc, period_ms)`.
fn periodic_table(role: EcuRole) -> &'static [(u32, u8, u32)] {
    match role {
        EcuRole::Powertrain => &[
            (BRAKE_OUTPUT_IND_MSG, FAST_DLC, 10),
            (ENGINE_RPM_MSG, FAST_DLC, 10),
            (POWER_STEERING_OUT_IND_MSG, FAST_DLC, 10),
            (SHIFT_POSITION_MSG, FAST_DLC, 10),
            (ENGINE_STATUS_MSG, SLOW_DLC, 50),
            (PARKING_BRAKE_STATUS_MSG, SLOW_DLC, 50),
        ],
        EcuRole::Chassis => &[
            (BRAKE_OPERATION_MSG, SLOW_DLC, 10),
            (ACCELERATION_OPERATION_MSG, SLOW_DLC, 10),
            (STEERING_WHEEL_POS_MSG, SLOW_DLC, 10),
            (SHIFT_POSITION_SWITCH_MSG, SLOW_DLC, 10),
            (ENGINE_START_MSG, SLOW_DLC, 10),
            (TURN_SWITCH_MSG, SLOW_DLC, 10),
            (HORN_SWITCH_MSG, SLOW_DLC, 10),
            (LIGHT_SWITCH_MSG, SLOW_DLC, 50),
            (PARKING_BRAKE_MSG, SLOW_DLC, 50),
            (WIPER_SWITCH_FRONT_MSG, SLOW_DLC, 100),
            (WIPER_SWITCH_REAR_MSG, SLOW_DLC, 100),
            (DOOR_LOCK_UNLOCK_MSG, SLOW_DLC, 100),
            (L_WINDOW_SWITCH_MSG, SLOW_DLC, 100),
            (R_WINDOW_SWITCH_MSG, SLOW_DLC, 100),
            (L_DOOR_HANDLE_MSG, SLOW_DLC, 100),
            (R_DOOR_HANDLE_MSG, SLOW_DLC, 100),
        ],
        EcuRole::Body => &[
            (TURN_SIGNAL_INDICATOR_MSG, SLOW_DLC, 10),
            (DOOR_LOCK_STATUS_MSG, SLOW_DLC, 100),
            (L_DOOR_POSITION_MSG, SLOW_DLC, 500),
            (R_DOOR_POSITION_MSG, SLOW_DLC, 500),
        ],
        EcuRole::Gateway | EcuRole::Observer => &[],
    }
}

/// Registry holding the periodic messages `role` transmits.
pub fn setup_registry(role: EcuRole) -> MessageRegistry {
    let mut registry = MessageRegistry::new();
    for &(id, dlc, period_ms) in periodic_table(role) {
        registry.define(MessageDefinition::new(id, dlc, true, period_ms));
    }
    registry
}

/// What one main-loop iteration did with the frame it received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Nothing arrived within the poll timeout.
    Idle,
    /// The role decoded the frame into its state.
    Applied(u32),
    /// The role has no use for this id.
    Ignored(u32),
    Relayed(u32),
    Observed(Observation),
}

/// Summary of one main-loop iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub dispatch: Dispatch,
    /// Periodic messages transmitted.
    pub sent: usize,
    /// Telemetry line produced, if any.
    pub telemetry: Option<String>,
}

pub struct EcuNode {
    role: EcuRole,
    clock: Clock,
    inner: SecureBus,
    gateway: Option<Arc<Gateway>>,
    scheduler: Scheduler,
    monitor: TimingMonitor,
    dynamics: Dynamics,
    telemetry: TelemetryWriter,
    gui: Option<Box<dyn GuiPort>>,
    poll_timeout: Duration,
    state: VehicleState,
    previous: VehicleState,
}

impl EcuNode {
    /// Build a node for `role`. The gateway role requires an outer bus.
    pub fn new(
        role: EcuRole,
        config: &NodeConfig,
        inner: SecureBus,
        outer: Option<SecureBus>,
    ) -> NodeResult<Self> {
        let gateway = match (role, outer) {
            (EcuRole::Gateway, Some(outer)) => Some(Arc::new(Gateway::new(
                inner.clone(),
                outer,
                Arc::new(config.gateway_policy()),
            ))),
            (EcuRole::Gateway, None) => {
                return Err(NodeError::Config(
                    "gateway role requires an outer interface".into(),
                ));
            }
            (_, _) => None,
        };

        let scheduler = Scheduler::new(setup_registry(role))
            .with_timing(config.scheduler.early_fire_us, config.spacing());
        let monitor = TimingMonitor::reference_defaults().with_limits(
            config.observer.tolerance_us,
            config.observer.reset_window_ms * 1000,
        );

        tracing::info!(
            role = %role,
            bus = inner.name(),
            encrypted = inner.codec().is_encrypted(),
            periodic = scheduler.registry().len(),
            "ECU node configured"
        );

        Ok(Self {
            role,
            clock: Clock::start(),
            inner,
            gateway,
            scheduler,
            monitor,
            dynamics: Dynamics::new(),
            telemetry: TelemetryWriter::new(role, config.telemetry_refresh_ms),
            gui: None,
            poll_timeout: config.poll_timeout(),
            state: VehicleState::default(),
            previous: VehicleState::default(),
        })
    }

    pub fn with_gui(mut self, gui: Box<dyn GuiPort>) -> Self {
        self.gui = Some(gui);
        self
    }

    pub fn role(&self) -> EcuRole {
        self.role
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut VehicleState {
        &mut self.state
    }

    /// Gateway relay, present only in the gateway role.
    pub fn gateway(&self) -> Option<&Arc<Gateway>> {
        self.gateway.as_ref()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn monitor(&self) -> &TimingMonitor {
        &self.monitor
    }

    /// Run one iteration at the node's own clock.
    pub async fn step(&mut self) -> StepReport {
        let now_us = self.clock.micros();
        self.step_at(now_us).await
    }

    /// Run one iteration as if `now_us` microseconds had elapsed since start.
    pub async fn step_at(&mut self, now_us: u64) -> StepReport {
        let now_ms = now_us / 1000;
        self.telemetry.refresh(now_ms);

        if self.role == EcuRole::Chassis {
            self.apply_gui_input();
        }
        self.dynamics.step(self.role, &mut self.state);

        match self.role {
            EcuRole::Observer => {
                if let Some(field) = check_values(&self.state) {
                    self.monitor.raise(Diagnostic::BadValue(field), now_us);
                }
                self.state.observer = self.monitor.diagnostic();
            }
            EcuRole::Gateway => {
                if let Some(gateway) = &self.gateway {
                    self.state.gateway = gateway.last_outcome().await;
                }
            }
            _ => {}
        }

        let telemetry = self
            .telemetry
            .render(now_ms, &self.state, &self.previous);
        if let Some(line) = &telemetry {
            self.send_telemetry(line);
        }

        let dispatch = match self.inner.poll(self.poll_timeout).await {
            Some(msg) => self.dispatch(&msg, now_us).await,
            None => Dispatch::Idle,
        };

        self.previous = self.state;

        let sent = self.scheduler.tick(now_us, &self.state, &self.inner).await;

        StepReport {
            dispatch,
            sent,
            telemetry,
        }
    }

    fn apply_gui_input(&mut self) {
        let Some(gui) = self.gui.as_mut() else {
            return;
        };
        for line in gui.poll_lines() {
            match parse_exd(&line) {
                Some(pairs) => {
                    for (id, value) in pairs {
                        apply_gui_input(id, value, &mut self.state);
                    }
                }
                None => tracing::debug!(line, "ignoring non-EXD GUI line"),
            }
        }
    }

    fn send_telemetry(&mut self, line: &str) {
        match self.gui.as_mut() {
            Some(gui) => {
                if let Err(e) = gui.send_line(line) {
                    tracing::warn!(error = %e, "failed to write GUI telemetry");
                }
            }
            None => tracing::trace!(line = line.trim_end(), "telemetry"),
        }
    }

    async fn dispatch(&mut self, msg: &CanMessage, now_us: u64) -> Dispatch {
        let role = self.role;
        match role {
            EcuRole::Gateway => match &self.gateway {
                Some(gateway) => {
                    gateway.relay(msg, Segment::Inner).await;
                    Dispatch::Relayed(msg.id)
                }
                None => Dispatch::Ignored(msg.id),
            },
            EcuRole::Observer => {
                let state = &mut self.state;
                let previous = &self.previous;
                let observation = self
                    .monitor
                    .observe(msg.id, now_us, || handlers::apply(role, msg, state, previous));
                self.state.observer = self.monitor.diagnostic();
                Dispatch::Observed(observation)
            }
            _ => {
                if handlers::apply(role, msg, &mut self.state, &self.previous) {
                    Dispatch::Applied(msg.id)
                } else {
                    tracing::trace!(id = %format_args!("0x{:03X}", msg.id), "ignoring frame");
                    Dispatch::Ignored(msg.id)
                }
            }
        }
    }

    /// Spawn the gateway's outer-segment relay, if this node has one.
    pub fn spawn_outer_relay(
        &self,
        shutdown: watch::Receiver<bool>,
    ) -> Option<tokio::task::JoinHandle<()>> {
        let gateway = self.gateway.clone()?;
        Some(tokio::spawn(gateway.run_outer(self.poll_timeout, shutdown)))
    }

    /// Iterate until `shutdown` flips to `true`.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(role = %self.role, "main loop started");
        loop {
            if *shutdown.borrow_and_update() {
                break;
            }
            self.step().await;
            tokio::task::yield_now().await;
        }
        tracing::info!(role = %self.role, "main loop stopped");
        if let Ok(state) = serde_json::to_string(&self.state) {
            tracing::debug!(%state, "final vehicle state");
        }
    }
}
