//! Cycle orchestrator: the periodic control loop.
//!
//! One cycle:
//!
//! 1. fetch the inventory
//! 2. run the transfer physics and write the sensor levels (plus threshold logs)
//! 3. fetch again and diff against the last known state
//! 4. run the safety rules, enforcing the pump interlock
//! 5. publish a [`Snapshot`]
//!
//! Cycles never overlap. The cycle state sits behind a [`Mutex`]: timer ticks
//! give up when it is held, user commands wait for it.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;

use twintank_domain::device::{Device, DevicePatch, Level, on_off_label};
use twintank_domain::error::{NotFoundError, TwinTankError};
use twintank_domain::history::{ActivityFeed, HistoryEntry, RECENT_LIMIT, most_recent};
use twintank_domain::id::DeviceId;
use twintank_domain::roles::ResolvedRoles;
use twintank_domain::safety::{
    EVENT_SAFETY_SHUTOFF, SafetyLimits, SafetyReport, SafetySupervisor, Shutoff,
};
use twintank_domain::snapshot::{DeviceView, Snapshot, TankCapacities};
use twintank_domain::threshold::Thresholds;
use twintank_domain::time::{self, Timestamp};
use twintank_domain::tracker::ChangeTracker;
use twintank_domain::transfer::{self, EVENT_CONSUMPTION, LevelChange, TransferRates};

use crate::ports::{DeviceStore, Inventory, SnapshotPublisher};

pub const EVENT_MANUAL_ON: &str = "Manual on";
pub const EVENT_MANUAL_OFF: &str = "Manual off";

/// Tunables of the control cycle.
#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub thresholds: Thresholds,
    pub rates: TransferRates,
    pub limits: SafetyLimits,
    pub capacities: TankCapacities,
    /// Upper bound on every single store call.
    pub store_timeout: Duration,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            rates: TransferRates::default(),
            limits: SafetyLimits::default(),
            capacities: TankCapacities::default(),
            store_timeout: Duration::from_secs(2),
        }
    }
}

/// A request coming from a user rather than the timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    SetPump { device: DeviceId, on: bool },
    TogglePump { device: DeviceId },
    SimulateConsumption { device: DeviceId },
}

impl UserCommand {
    #[must_use]
    pub fn device(&self) -> &DeviceId {
        match self {
            Self::SetPump { device, .. }
            | Self::TogglePump { device }
            | Self::SimulateConsumption { device } => device,
        }
    }
}

/// How a cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    Completed(Box<Snapshot>),
    /// A timer tick found another cycle in flight.
    Skipped,
    /// The store failed; nothing was published.
    Aborted(TwinTankError),
}

impl CycleOutcome {
    #[must_use]
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            Self::Completed(snapshot) => Some(snapshot),
            Self::Skipped | Self::Aborted(_) => None,
        }
    }
}

/// Result of a user command: the device as written, and the re-run cycle.
#[derive(Debug)]
pub struct CommandReport {
    pub device: Device,
    pub cycle: CycleOutcome,
}

#[derive(Debug)]
struct CycleState {
    tracker: ChangeTracker,
    supervisor: SafetySupervisor,
    activity: ActivityFeed,
}

/// Drives the installation: owns the cycle state, talks to the store and
/// pushes snapshots to the publisher.
pub struct ControlCycle<S, P> {
    store: S,
    publisher: P,
    settings: CycleSettings,
    state: Mutex<CycleState>,
}

impl<S: DeviceStore, P: SnapshotPublisher> ControlCycle<S, P> {
    pub fn new(store: S, publisher: P, settings: CycleSettings) -> Self {
        let state = CycleState {
            tracker: ChangeTracker::new(),
            supervisor: SafetySupervisor::new(settings.limits),
            activity: ActivityFeed::default(),
        };
        Self {
            store,
            publisher,
            settings,
            state: Mutex::new(state),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &CycleSettings {
        &self.settings
    }

    /// Timer entry point: runs a cycle unless one is already in flight.
    pub async fn tick(&self) -> CycleOutcome {
        let Ok(mut state) = self.state.try_lock() else {
            tracing::debug!("previous cycle still running, skipping tick");
            return CycleOutcome::Skipped;
        };
        self.cycle(&mut state).await
    }

    /// Run a cycle, waiting for any in-flight one to finish first.
    pub async fn run(&self) -> CycleOutcome {
        let mut state = self.state.lock().await;
        self.cycle(&mut state).await
    }

    /// Apply a user command, then immediately re-run the cycle.
    ///
    /// The command waits for any in-flight cycle and holds the cycle lock
    /// until its own re-run has finished.
    ///
    /// # Errors
    ///
    /// Returns [`TwinTankError::NotFound`] for an unknown device,
    /// [`TwinTankError::Validation`] when the command does not fit the
    /// device kind, and [`TwinTankError::StoreUnavailable`] when the
    /// command could not be written. A failing re-run is reported in the
    /// returned [`CycleOutcome`], not as an error.
    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, command: UserCommand) -> Result<CommandReport, TwinTankError> {
        let mut state = self.state.lock().await;
        let device = self.apply_command(&command).await?;
        let cycle = self.cycle(&mut state).await;
        Ok(CommandReport { device, cycle })
    }

    async fn apply_command(&self, command: &UserCommand) -> Result<Device, TwinTankError> {
        let devices = self.bounded(self.store.list_devices()).await?;
        let mut device = devices
            .into_iter()
            .find(|d| d.id == *command.device())
            .ok_or_else(|| NotFoundError {
                entity: "Device",
                id: command.device().to_string(),
            })?;
        let at = time::now();
        match command {
            UserCommand::SetPump { on, .. } => self.switch_pump(&mut device, *on, at).await?,
            UserCommand::TogglePump { .. } => {
                let on = !device.state;
                self.switch_pump(&mut device, on, at).await?;
            }
            UserCommand::SimulateConsumption { .. } => self.consume(&mut device, at).await?,
        }
        Ok(device)
    }

    async fn switch_pump(
        &self,
        device: &mut Device,
        on: bool,
        at: Timestamp,
    ) -> Result<(), TwinTankError> {
        device.expect_actuator()?;
        let event = if on { EVENT_MANUAL_ON } else { EVENT_MANUAL_OFF };
        let patch = DevicePatch::state(on, event, at);
        self.bounded(self.store.update_device(device.id.clone(), patch.clone()))
            .await?;
        device.apply(&patch);
        let entry = HistoryEntry::new(device.name.clone(), event, on_off_label(on), at);
        self.bounded(self.store.append_log(entry)).await?;
        tracing::info!(device = %device.name, on, "pump switched manually");
        Ok(())
    }

    async fn consume(&self, device: &mut Device, at: Timestamp) -> Result<(), TwinTankError> {
        device.expect_main_sensor()?;
        let before = device.level;
        let after = before.shifted(-i64::from(self.settings.rates.consumption_step));
        let patch = DevicePatch::level(after, EVENT_CONSUMPTION, at);
        self.bounded(self.store.update_device(device.id.clone(), patch.clone()))
            .await?;
        device.apply(&patch);

        let entry = HistoryEntry::new(
            device.name.clone(),
            EVENT_CONSUMPTION,
            after.to_string(),
            at,
        );
        self.bounded(self.store.append_log(entry)).await?;
        self.log_thresholds(&device.name, before, after, at).await?;
        tracing::info!(device = %device.name, %before, %after, "simulated consumption");
        Ok(())
    }

    async fn cycle(&self, state: &mut CycleState) -> CycleOutcome {
        match self.try_cycle(state).await {
            Ok(snapshot) => {
                if let Err(err) = self.publisher.publish(snapshot.clone()).await {
                    tracing::warn!(%err, "failed to publish snapshot");
                }
                CycleOutcome::Completed(Box::new(snapshot))
            }
            Err(err) => {
                tracing::warn!(%err, "control cycle aborted, retrying next tick");
                CycleOutcome::Aborted(err)
            }
        }
    }

    async fn try_cycle(&self, state: &mut CycleState) -> Result<Snapshot, TwinTankError> {
        let inventory = self.bounded(self.store.list_all()).await?;
        match ResolvedRoles::from_devices(&inventory.devices) {
            Ok(roles) => self.transfer(&roles).await?,
            Err(err) => tracing::debug!(%err, "skipping transfer"),
        }

        let Inventory {
            mut devices,
            mut history,
        } = self.bounded(self.store.list_all()).await?;
        let activity = state.tracker.detect(&devices, &self.settings.thresholds);

        let (report, roles_resolved) = match ResolvedRoles::from_devices(&devices) {
            Ok(roles) => (state.supervisor.evaluate(&roles), true),
            Err(err) => {
                tracing::debug!(%err, "skipping safety rules");
                (SafetyReport::default(), false)
            }
        };

        let mut shutoff_patch = None;
        if let Some(shutoff) = &report.shutoff {
            match self.enforce(shutoff).await {
                Ok((patch, entry)) => {
                    history.extend(entry);
                    shutoff_patch = Some((shutoff.pump.clone(), patch));
                }
                Err(err) => {
                    state.supervisor.release();
                    return Err(err);
                }
            }
        }

        // Remember what the store said, so the shutoff shows up as a change
        // on the next cycle.
        state.tracker.remember(&devices);
        for entry in activity {
            state.activity.push(entry);
        }
        if let Some((pump, patch)) = shutoff_patch
            && let Some(device) = devices.iter_mut().find(|d| d.id == pump)
        {
            device.apply(&patch);
        }

        let capacities = self.settings.capacities;
        Ok(Snapshot {
            devices: devices
                .into_iter()
                .map(|device| DeviceView::new(device, capacities))
                .collect(),
            history: most_recent(&history, RECENT_LIMIT),
            activity: state.activity.to_vec(),
            alerts: report.alerts,
            generated_at: time::now(),
            roles_resolved,
        })
    }

    async fn transfer(&self, roles: &ResolvedRoles<'_>) -> Result<(), TwinTankError> {
        let plan = transfer::simulate(roles, self.settings.rates);
        if plan.is_empty() {
            return Ok(());
        }
        let at = time::now();
        let (main, backup) = tokio::join!(
            self.write_level(plan.main.as_ref(), at),
            self.write_level(plan.backup.as_ref(), at),
        );
        // A level that reached the store keeps its threshold logs even when
        // the other write failed.
        let written = [(plan.main.as_ref(), &main), (plan.backup.as_ref(), &backup)];
        for (change, result) in written {
            let (Some(change), Ok(())) = (change, result) else {
                continue;
            };
            tracing::debug!(
                device = %change.device_name,
                before = %change.before,
                after = %change.after,
                "level changed"
            );
            self.log_thresholds(&change.device_name, change.before, change.after, at)
                .await?;
        }
        main?;
        backup
    }

    async fn write_level(
        &self,
        change: Option<&LevelChange>,
        at: Timestamp,
    ) -> Result<(), TwinTankError> {
        let Some(change) = change else {
            return Ok(());
        };
        let patch = DevicePatch::level(change.after, change.event, at);
        self.bounded(self.store.update_device(change.device.clone(), patch))
            .await
    }

    async fn log_thresholds(
        &self,
        device_name: &str,
        before: Level,
        after: Level,
        at: Timestamp,
    ) -> Result<(), TwinTankError> {
        for entry in self
            .settings
            .thresholds
            .log_entries(device_name, before, after, at)
        {
            self.bounded(self.store.append_log(entry)).await?;
        }
        Ok(())
    }

    /// Force the main pump off; the history entry is only written on the
    /// first tick of an episode.
    async fn enforce(
        &self,
        shutoff: &Shutoff,
    ) -> Result<(DevicePatch, Option<HistoryEntry>), TwinTankError> {
        let at = time::now();
        let patch = DevicePatch::state(false, EVENT_SAFETY_SHUTOFF, at);
        self.bounded(self.store.update_device(shutoff.pump.clone(), patch.clone()))
            .await?;
        if !shutoff.log {
            return Ok((patch, None));
        }
        tracing::warn!(pump = %shutoff.pump_name, "backup tank empty, main pump shut off");
        let entry = HistoryEntry::new(
            shutoff.pump_name.clone(),
            EVENT_SAFETY_SHUTOFF,
            on_off_label(false),
            at,
        );
        let entry = self.bounded(self.store.append_log(entry)).await?;
        Ok((patch, Some(entry)))
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, TwinTankError>>,
    ) -> Result<T, TwinTankError> {
        tokio::time::timeout(self.settings.store_timeout, call)
            .await
            .map_err(TwinTankError::store)?
    }
}
