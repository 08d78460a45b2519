//! Simulation Engine
//!
//! Owns every piece of mutable game state and drives the tick loop:
//!
//! ```text
//! For each tick(dt):
//! 1. Advance the clock by dt
//! 2. Roll for / age demand spikes
//! 3. Generate a job if the spawn timer is due (with backpressure)
//! 4. Advance active jobs; settle and release the ones that finished
//! 5. Run the scheduler (auto-assign mode only)
//! 6. Charge electricity for the interval
//! 7. Accrue contract income; expire finished contracts
//! 8. Evaluate achievements and victory
//! ```
//!
//! Player actions (purchases, manual placement, clustering, contracts,
//! marketing) are methods on [`Simulation`] returning `Result<_, ActionError>`.
//! Every action validates fully before it mutates anything.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use gpu_tycoon_core::catalog::{Catalog, GpuModel};
//! use gpu_tycoon_core::orchestrator::{Simulation, SimulationConfig};
//!
//! let mut sim = Simulation::new(SimulationConfig::default(), Arc::new(Catalog::standard())).unwrap();
//! sim.purchase_accelerator(GpuModel::L4).unwrap();
//! assert_eq!(sim.cash(), 0.0);
//!
//! for _ in 0..600 {
//!     sim.tick(0.1).unwrap();
//! }
//! assert!(sim.jobs_completed() > 0);
//! ```

use crate::arrivals::{self, JobGenerator};
use crate::catalog::{Catalog, CatalogError, GpuModel};
use crate::core::time::SimClock;
use crate::economy::{self, PurchaseError};
use crate::events::{DemandSpike, SpikeKind, SpikeMonitor};
use crate::models::accelerator::AcceleratorId;
use crate::models::cluster::{ClusterError, ClusterId};
use crate::models::contract::{select_reservation, ContractError, ContractStatus};
use crate::models::event::{Event, EventLog};
use crate::models::job::{JobError, JobId};
use crate::models::marketing::{MarketingError, MarketingManager};
use crate::models::state::SimulationState;
use crate::orchestrator::config::SimulationConfig;
use crate::orchestrator::milestones::{self, Achievement, Progress, Victory};
use crate::rng::RngManager;
use crate::scheduler::{self, AssignError, PlacementPlan};
use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Throughput assumed by the revenue-per-hour estimate (one job per 10s)
const JOBS_PER_HOUR_PER_ACCELERATOR: f64 = 360.0;
const HOURS_PER_MONTH: f64 = 30.0 * 24.0;

// ============================================================================
// Errors
// ============================================================================

/// Construction and tick failures
#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Tick delta must be finite and non-negative (got {0})")]
    InvalidDelta(f64),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Job error: {0}")]
    Job(#[from] JobError),

    #[error("Scheduling error: {0}")]
    Scheduling(#[from] AssignError),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// A rejected player action; the Display text is shown to the player as-is
#[derive(Debug, Error, PartialEq)]
pub enum ActionError {
    #[error("GPU #{0} is not available (reserved or doesn't exist)")]
    Unavailable(AcceleratorId),

    #[error(transparent)]
    Purchase(#[from] PurchaseError),

    #[error(transparent)]
    Assign(#[from] AssignError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Marketing(#[from] MarketingError),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Flat success/message pair for transports that cannot carry typed errors
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
}

impl ActionOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Convert a result, describing the success value with `describe`
    pub fn from_result<T>(
        result: Result<T, ActionError>,
        describe: impl FnOnce(T) -> String,
    ) -> Self {
        match result {
            Ok(value) => Self::ok(describe(value)),
            Err(err) => err.into(),
        }
    }
}

impl From<ActionError> for ActionOutcome {
    fn from(err: ActionError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Tick Result
// ============================================================================

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickResult {
    /// Simulated time at the end of the tick
    pub time: f64,
    pub spawned: usize,
    /// A generation attempt was skipped by backpressure
    pub suppressed: bool,
    pub started: usize,
    pub completed: usize,
    pub payouts: f64,
    pub power_cost: f64,
    pub contract_income: f64,
    pub achievements: Vec<Achievement>,
    pub victory: Option<Victory>,
}

// ============================================================================
// Simulation
// ============================================================================

/// Root of one game
///
/// # Determinism
///
/// Every random draw goes through a single seeded [`RngManager`] and time
/// only moves through `tick(dt)`, so the same config, catalog and call
/// sequence always produce the same state.
#[derive(Debug, Clone)]
pub struct Simulation {
    catalog: Arc<Catalog>,
    config: SimulationConfig,
    state: SimulationState,
    clock: SimClock,
    rng: RngManager,
    generator: JobGenerator,
    spikes: SpikeMonitor,
    marketing: MarketingManager,

    cash: f64,
    total_revenue: f64,
    total_power_cost: f64,
    jobs_completed: u64,
    sla_misses: u64,

    /// Most recent completions, true = on time
    sla_history: VecDeque<bool>,

    achievements: BTreeSet<Achievement>,
    victory: Option<Victory>,
    auto_assign: bool,
    event_log: EventLog,
}

impl Simulation {
    /// Create a simulation from a validated config and catalog
    ///
    /// # Errors
    /// `InvalidConfig` for bad config values, `Catalog` for an inconsistent
    /// catalog.
    pub fn new(config: SimulationConfig, catalog: Arc<Catalog>) -> Result<Self, SimulationError> {
        catalog.validate()?;
        config.validate(&catalog)?;

        let clock = SimClock::new();
        let mut sim = Self {
            state: SimulationState::new(&catalog),
            rng: RngManager::new(config.rng_seed),
            generator: JobGenerator::new(config.base_spawn_interval, clock.now()),
            spikes: SpikeMonitor::new(clock.now()),
            marketing: MarketingManager::new(catalog.marketing.clone()),
            cash: config.starting_cash,
            total_revenue: 0.0,
            total_power_cost: 0.0,
            jobs_completed: 0,
            sla_misses: 0,
            sla_history: VecDeque::with_capacity(config.sla_history_window),
            achievements: BTreeSet::new(),
            victory: None,
            auto_assign: config.auto_assign,
            event_log: EventLog::with_capacity(config.event_log_capacity),
            clock,
            catalog,
            config,
        };

        if let Some(model) = sim.config.starter_accelerator {
            let spec = sim
                .catalog
                .accelerator(model)
                .ok_or_else(|| SimulationError::InvalidConfig(format!("unknown model {model:?}")))?;
            let id = sim.state.add_accelerator(spec);
            debug!(accelerator = id, ?model, "starter accelerator installed");
        }

        Ok(sim)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Direct state access for tests and tools
    ///
    /// Changes made here bypass action validation.
    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn ticks(&self) -> u64 {
        self.clock.ticks()
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn total_revenue(&self) -> f64 {
        self.total_revenue
    }

    pub fn total_power_cost(&self) -> f64 {
        self.total_power_cost
    }

    pub fn jobs_completed(&self) -> u64 {
        self.jobs_completed
    }

    pub fn sla_misses(&self) -> u64 {
        self.sla_misses
    }

    pub fn auto_assign(&self) -> bool {
        self.auto_assign
    }

    pub fn marketing(&self) -> &MarketingManager {
        &self.marketing
    }

    pub fn active_spike(&self) -> Option<&DemandSpike> {
        self.spikes.active()
    }

    pub fn achievements(&self) -> &BTreeSet<Achievement> {
        &self.achievements
    }

    pub fn victory(&self) -> Option<Victory> {
        self.victory
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    pub fn rng_state(&self) -> u64 {
        self.rng.state()
    }

    /// Seconds until the next generation attempt is allowed
    pub fn spawn_interval(&self) -> f64 {
        self.generator.interval()
    }

    /// On-time percentage over the recent completion window (100 when empty)
    pub fn sla_compliance(&self) -> f64 {
        if self.sla_history.is_empty() {
            return 100.0;
        }
        let on_time = self.sla_history.iter().filter(|&&ok| ok).count();
        on_time as f64 / self.sla_history.len() as f64 * 100.0
    }

    /// Rough income rate from recent job value, utilization and contracts
    pub fn revenue_per_hour(&self) -> f64 {
        let mut rate = 0.0;
        if self.jobs_completed > 0 {
            let avg_job_value = self.total_revenue / self.jobs_completed as f64;
            rate = avg_job_value
                * JOBS_PER_HOUR_PER_ACCELERATOR
                * self.state.unreserved_count() as f64
                * self.state.average_utilization();
        }
        rate + self.state.contracts.total_monthly_income() / HOURS_PER_MONTH
    }

    /// Aggregate totals the milestone predicates read
    pub fn progress(&self) -> Progress {
        Progress {
            accelerators: self.state.num_accelerators(),
            total_revenue: self.total_revenue,
            jobs_completed: self.jobs_completed,
            sla_misses: self.sla_misses,
            utilization: self.state.average_utilization(),
            pue: economy::current_pue(&self.state.fleet),
            active_contracts: self.state.contracts.active_count(),
            all_contracts_active: self.state.contracts.all_active(),
        }
    }

    fn log_event(&mut self, event: Event) {
        self.event_log.log(event);
    }

    // ========================================================================
    // Tick Loop
    // ========================================================================

    /// Advance the simulation by `dt` seconds
    ///
    /// # Errors
    /// `InvalidDelta` for a negative or non-finite `dt` (state untouched).
    /// The remaining variants indicate a broken internal invariant.
    pub fn tick(&mut self, dt: f64) -> Result<TickResult, SimulationError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(SimulationError::InvalidDelta(dt));
        }

        self.clock.advance(dt);
        let now = self.clock.now();
        let mut result = TickResult {
            time: now,
            ..Default::default()
        };

        // STEP 1: DEMAND SPIKES
        self.update_spikes(now, dt);

        // STEP 2: ARRIVALS
        self.spawn_job(now, &mut result);

        // STEP 3: JOB PROGRESS AND COMPLETION
        self.advance_jobs(now, dt, &mut result)?;

        // STEP 4: SCHEDULING
        if self.auto_assign {
            let placed = scheduler::schedule_pending(&mut self.state, now)?;
            result.started = placed.len();
            for plan in &placed {
                self.log_placement(plan, now);
            }
        }

        // STEP 5: POWER
        let pue = economy::current_pue(&self.state.fleet);
        let power = economy::power_cost(
            &self.state.fleet,
            pue,
            dt,
            self.config.electricity_price_per_kwh,
        );
        self.cash -= power;
        self.total_power_cost += power;
        result.power_cost = power;

        // STEP 6: CONTRACTS
        let (income, expired) = self.state.contracts.update(dt);
        if income > 0.0 {
            self.cash += income;
            self.total_revenue += income;
        }
        result.contract_income = income;
        for contract in expired {
            info!(contract = %contract.id, released = contract.released.len(), "contract expired");
            self.log_event(Event::ContractExpired {
                time: now,
                contract_id: contract.id,
                released: contract.released,
            });
        }

        // STEP 7: MILESTONES
        self.check_milestones(now, &mut result);

        Ok(result)
    }

    fn update_spikes(&mut self, now: f64, dt: f64) {
        let update = self.spikes.update(now, dt, self.total_revenue, &mut self.rng);
        if let Some(kind) = update.started {
            self.log_spike_started(kind, now);
        }
        if let Some(kind) = update.ended {
            info!(spike = kind.name(), "demand spike ended");
            self.log_event(Event::SpikeEnded {
                time: now,
                name: kind.name().to_string(),
            });
        }
    }

    fn log_spike_started(&mut self, kind: SpikeKind, now: f64) {
        info!(spike = kind.name(), duration = kind.duration(), "demand spike started");
        self.log_event(Event::SpikeStarted {
            time: now,
            name: kind.name().to_string(),
            duration: kind.duration(),
        });
    }

    /// At most one generation attempt per tick
    fn spawn_job(&mut self, now: f64, result: &mut TickResult) {
        if !self.generator.is_due(now) {
            return;
        }

        let available = self.state.unreserved_count();
        let backlog = self.state.pending.len();
        let plan = arrivals::plan_spawn(
            backlog,
            available,
            self.generator.base_interval(),
            self.marketing.spawn_multiplier() * self.spikes.spawn_multiplier(),
        );

        if plan.generate {
            let request = JobGenerator::generate_job(
                self.total_revenue,
                self.marketing.value_multiplier() * self.spikes.value_multiplier(),
                self.marketing.sla_extension() + plan.backlog_sla_extension,
                available,
                &mut self.rng,
            );
            let job_id = self.state.enqueue_job(request, now);
            if let Some(job) = self.state.pending_job(job_id) {
                let event = Event::JobArrival {
                    time: now,
                    job_id,
                    customer: job.customer().to_string(),
                    gpu_count: job.gpu_count(),
                    vram_per_gpu: job.vram_per_gpu(),
                    payout: job.base_payout(),
                    sla_deadline: job.sla_deadline(),
                };
                self.log_event(event);
            }
            result.spawned += 1;
        } else {
            let limit = plan.target_queue_depth * 2;
            debug!(backlog, limit, "arrival suppressed by backpressure");
            self.log_event(Event::ArrivalSuppressed {
                time: now,
                backlog,
                limit,
            });
            result.suppressed = true;
        }

        self.generator.record_attempt(now, plan.next_interval);
    }

    fn advance_jobs(
        &mut self,
        now: f64,
        dt: f64,
        result: &mut TickResult,
    ) -> Result<(), SimulationError> {
        let mut finished = Vec::new();
        let mut syncs = Vec::new();
        for job in &mut self.state.active {
            let update = job.update(dt)?;
            for checkpoint in update.synced {
                debug!(job = job.id(), checkpoint, "job synchronized");
                syncs.push((job.id(), checkpoint));
            }
            if update.completed {
                finished.push(job.id());
            }
        }
        for (job_id, checkpoint) in syncs {
            self.log_event(Event::JobSync {
                time: now,
                job_id,
                checkpoint,
            });
        }

        for job_id in finished {
            let payout = self.complete_job(job_id, now)?;
            result.completed += 1;
            result.payouts += payout;
        }
        Ok(())
    }

    /// Settle a finished job, pay for it and free its accelerators
    fn complete_job(&mut self, job_id: JobId, now: f64) -> Result<f64, SimulationError> {
        let Some(position) = self.state.active.iter().position(|j| j.id() == job_id) else {
            return Ok(0.0);
        };
        let mut job = self.state.active.remove(position);
        let payout = job.settle(now)?;
        let sla_missed = job.is_sla_missed(now);

        self.cash += payout;
        self.total_revenue += payout;
        self.jobs_completed += 1;
        if sla_missed {
            self.sla_misses += 1;
        }
        if self.sla_history.len() >= self.config.sla_history_window {
            self.sla_history.pop_front();
        }
        self.sla_history.push_back(!sla_missed);

        for id in job.assigned() {
            if let Some(accel) = self.state.fleet.get_mut(id) {
                if accel.current_job() == Some(job_id) {
                    accel.release();
                }
            }
        }
        self.state.clusters.release_job(job_id);

        info!(job = job_id, payout, sla_missed, "job completed");
        self.log_event(Event::JobCompleted {
            time: now,
            job_id,
            payout,
            sla_missed,
        });
        Ok(payout)
    }

    fn log_placement(&mut self, plan: &PlacementPlan, now: f64) {
        let duration = self
            .state
            .active_job(plan.job_id)
            .map_or(0.0, |job| job.duration());
        self.log_event(Event::JobStarted {
            time: now,
            job_id: plan.job_id,
            accelerators: plan.accelerator_ids(),
            cluster_id: plan.cluster_id,
            duration,
            network_penalty: plan.network_penalty,
        });
    }

    fn check_milestones(&mut self, now: f64, result: &mut TickResult) {
        let progress = self.progress();

        let unlocked: Vec<Achievement> =
            milestones::newly_unlocked(&progress, &self.achievements).collect();
        for achievement in unlocked {
            self.achievements.insert(achievement);
            info!(achievement = achievement.id(), "achievement unlocked");
            self.log_event(Event::AchievementUnlocked {
                time: now,
                achievement,
            });
            result.achievements.push(achievement);
        }

        if self.victory.is_none() {
            if let Some(victory) = Victory::evaluate(&progress) {
                self.victory = Some(victory);
                info!(victory = %victory, "victory achieved");
                self.log_event(Event::VictoryAchieved { time: now, victory });
                result.victory = Some(victory);
            }
        }
    }

    // ========================================================================
    // Player Actions
    // ========================================================================

    /// Buy one accelerator of `model`
    ///
    /// # Errors
    /// Unknown model, insufficient cash, or revenue unlock not reached.
    pub fn purchase_accelerator(&mut self, model: GpuModel) -> Result<AcceleratorId, ActionError> {
        let catalog = Arc::clone(&self.catalog);
        let spec = catalog
            .accelerator(model)
            .ok_or(PurchaseError::UnknownModel(model))?;
        economy::check_purchase(spec, self.cash, self.total_revenue)?;

        self.cash -= spec.cost;
        let id = self.state.add_accelerator(spec);

        info!(accelerator = id, ?model, cost = spec.cost, "accelerator purchased");
        let now = self.now();
        self.log_event(Event::AcceleratorPurchased {
            time: now,
            accelerator_id: id,
            model,
            cost: spec.cost,
        });
        Ok(id)
    }

    /// Place a queued job on the given accelerators
    ///
    /// Selecting exactly a cluster's members runs the job on the whole
    /// cluster. Works in both assignment modes.
    pub fn assign_job(&mut self, job_id: JobId, ids: &[AcceleratorId]) -> Result<(), ActionError> {
        let now = self.now();
        let penalty = economy::network_penalty(self.state.num_accelerators());
        let plan = scheduler::plan_manual(&self.state, job_id, ids, penalty)?;
        scheduler::commit(&mut self.state, &plan, now)?;
        self.log_placement(&plan, now);
        Ok(())
    }

    /// Flip between automatic and manual assignment; returns the new mode
    pub fn toggle_auto_assign(&mut self) -> bool {
        self.auto_assign = !self.auto_assign;
        let now = self.now();
        debug!(enabled = self.auto_assign, "auto-assign toggled");
        self.log_event(Event::AutoAssignToggled {
            time: now,
            enabled: self.auto_assign,
        });
        self.auto_assign
    }

    /// Accelerator exists and no contract holds it
    fn check_unreserved(&self, id: AcceleratorId) -> Result<(), ActionError> {
        if self.state.accelerator(id).is_none() || self.state.is_reserved(id) {
            return Err(ActionError::Unavailable(id));
        }
        Ok(())
    }

    /// Group unreserved accelerators of one model into a new cluster
    pub fn create_cluster(&mut self, ids: &[AcceleratorId]) -> Result<ClusterId, ActionError> {
        for &id in ids {
            self.check_unreserved(id)?;
        }
        let cluster_id = self.state.clusters.create(ids, &self.state.fleet)?;

        info!(cluster = cluster_id, members = ?ids, "cluster created");
        let now = self.now();
        self.log_event(Event::ClusterCreated {
            time: now,
            cluster_id,
            members: ids.to_vec(),
        });
        Ok(cluster_id)
    }

    pub fn add_to_cluster(
        &mut self,
        cluster_id: ClusterId,
        id: AcceleratorId,
    ) -> Result<(), ActionError> {
        self.check_unreserved(id)?;
        self.state.clusters.add_member(cluster_id, id, &self.state.fleet)?;

        debug!(cluster = cluster_id, accelerator = id, "cluster member added");
        let now = self.now();
        self.log_event(Event::ClusterMemberAdded {
            time: now,
            cluster_id,
            accelerator_id: id,
        });
        Ok(())
    }

    /// Remove a member; returns true if the cluster became empty and was deleted
    pub fn remove_from_cluster(
        &mut self,
        cluster_id: ClusterId,
        id: AcceleratorId,
    ) -> Result<bool, ActionError> {
        let deleted = self.state.clusters.remove_member(cluster_id, id)?;

        debug!(cluster = cluster_id, accelerator = id, deleted, "cluster member removed");
        let now = self.now();
        self.log_event(Event::ClusterMemberRemoved {
            time: now,
            cluster_id,
            accelerator_id: id,
            cluster_deleted: deleted,
        });
        Ok(deleted)
    }

    pub fn disband_cluster(&mut self, cluster_id: ClusterId) -> Result<(), ActionError> {
        let cluster = self.state.clusters.disband(cluster_id)?;

        info!(cluster = cluster_id, members = cluster.len(), "cluster disbanded");
        let now = self.now();
        self.log_event(Event::ClusterDisbanded { time: now, cluster_id });
        Ok(())
    }

    /// Open negotiation on a contract the fleet qualifies for
    pub fn start_contract_negotiation(&mut self, contract_id: &str) -> Result<(), ActionError> {
        let now = self.now();
        let profile = self.state.profile(self.total_revenue);
        self.state
            .contracts
            .get_mut(contract_id)?
            .start_negotiation(&profile, now)?;

        info!(contract = contract_id, "contract negotiation started");
        self.log_event(Event::ContractNegotiationStarted {
            time: now,
            contract_id: contract_id.to_string(),
        });
        Ok(())
    }

    /// Pay toward a negotiation; returns true if the contract activated
    ///
    /// An investment that would finish negotiation is refused up front when
    /// there are not enough unreserved accelerators to hand over.
    pub fn invest_in_contract(&mut self, contract_id: &str, amount: f64) -> Result<bool, ActionError> {
        let contract = self
            .state
            .contracts
            .get(contract_id)
            .ok_or_else(|| ContractError::NotFound(contract_id.to_string()))?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ContractError::InvalidAmount.into());
        }
        if self.cash < amount {
            return Err(ContractError::InsufficientFunds {
                needed: amount,
                available: self.cash,
            }
            .into());
        }
        if !matches!(contract.status(), ContractStatus::Negotiating { .. }) {
            return Err(ContractError::NotNegotiating.into());
        }

        let reservation = if contract.would_complete(amount) {
            let needed = contract.spec().reserves_gpus;
            let reserved = self.state.reserved_ids();
            let selected = select_reservation(&self.state.fleet, &reserved, needed).ok_or(
                ContractError::NotEnoughAccelerators {
                    needed,
                    available: self.state.unreserved_count(),
                },
            )?;
            Some(selected)
        } else {
            None
        };

        let now = self.now();
        let contract = self.state.contracts.get_mut(contract_id)?;
        let complete = contract.invest(amount)?;
        let progress = contract.negotiation_progress();
        let mut activated = None;
        if let (true, Some(ids)) = (complete, reservation) {
            contract.activate(ids.clone())?;
            activated = Some(ids);
        }
        self.cash -= amount;

        debug!(contract = contract_id, amount, progress, "contract investment");
        self.log_event(Event::ContractInvestment {
            time: now,
            contract_id: contract_id.to_string(),
            amount,
            progress,
        });

        match activated {
            Some(reserved) => {
                info!(contract = contract_id, reserved = ?reserved, "contract activated");
                self.log_event(Event::ContractActivated {
                    time: now,
                    contract_id: contract_id.to_string(),
                    reserved,
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Start a demand spike outside the random roll (scenario scripting)
    ///
    /// Returns false, changing nothing, while another spike is running.
    pub fn trigger_spike(&mut self, kind: SpikeKind) -> bool {
        if !self.spikes.trigger(kind) {
            return false;
        }
        let now = self.now();
        self.log_spike_started(kind, now);
        true
    }

    /// Buy the next marketing tier; returns the new level
    pub fn upgrade_marketing(&mut self) -> Result<u32, ActionError> {
        let tier = self.marketing.upgrade(self.cash, self.total_revenue)?;
        self.cash -= tier.cost;

        info!(level = tier.level, name = %tier.name, cost = tier.cost, "marketing upgraded");
        let now = self.now();
        self.log_event(Event::MarketingUpgraded {
            time: now,
            level: tier.level,
            name: tier.name,
            cost: tier.cost,
        });
        Ok(self.marketing.level())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobRequest;

    fn sim() -> Simulation {
        Simulation::new(SimulationConfig::default(), Arc::new(Catalog::standard())).unwrap()
    }

    #[test]
    fn test_rejects_invalid_delta() {
        let mut sim = sim();
        assert_eq!(sim.tick(-1.0), Err(SimulationError::InvalidDelta(-1.0)));
        assert!(matches!(sim.tick(f64::NAN), Err(SimulationError::InvalidDelta(_))));
        assert_eq!(sim.now(), 0.0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SimulationConfig {
            sla_history_window: 0,
            ..Default::default()
        };
        assert!(matches!(
            Simulation::new(config, Arc::new(Catalog::standard())),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_starter_accelerator_is_free() {
        let config = SimulationConfig {
            starter_accelerator: Some(GpuModel::L4),
            ..Default::default()
        };
        let sim = Simulation::new(config, Arc::new(Catalog::standard())).unwrap();
        assert_eq!(sim.state().num_accelerators(), 1);
        assert_eq!(sim.cash(), 3000.0);
    }

    #[test]
    fn test_purchase_failure_leaves_cash() {
        let mut sim = sim();
        let err = sim.purchase_accelerator(GpuModel::A100).unwrap_err();
        assert_eq!(err.to_string(), "Need $18000");
        assert_eq!(sim.cash(), 3000.0);
        assert_eq!(sim.state().num_accelerators(), 0);
    }

    #[test]
    fn test_first_job_due_after_base_interval() {
        let mut sim = sim();
        sim.tick(1.0).unwrap();
        assert!(sim.state().pending_jobs().is_empty());
        let result = sim.tick(1.0).unwrap();
        assert_eq!(result.spawned, 1);
        assert_eq!(sim.state().pending_jobs().len(), 1);
    }

    #[test]
    fn test_completion_pays_and_releases() {
        let mut sim = sim();
        let id = sim.purchase_accelerator(GpuModel::L4).unwrap();
        sim.toggle_auto_assign();
        let job = sim
            .state_mut()
            .enqueue_job(JobRequest::new(1, 16, 5.0, 45.0, 20.0), 0.0);
        sim.assign_job(job, &[id]).unwrap();

        let mut total = 0.0;
        for _ in 0..5 {
            total += sim.tick(1.0).unwrap().payouts;
        }
        assert_eq!(total, 45.0);
        assert_eq!(sim.jobs_completed(), 1);
        assert!(sim.state().accelerator(id).unwrap().is_available());
        assert_eq!(sim.sla_compliance(), 100.0);
    }

    #[test]
    fn test_sla_history_window_is_bounded() {
        let config = SimulationConfig {
            sla_history_window: 2,
            auto_assign: false,
            base_spawn_interval: 1e9,
            ..Default::default()
        };
        let mut sim = Simulation::new(config, Arc::new(Catalog::standard())).unwrap();
        let id = sim.purchase_accelerator(GpuModel::L4).unwrap();

        // one late job, then two on-time jobs push it out of the window
        let late = sim
            .state_mut()
            .enqueue_job(JobRequest::new(1, 16, 1.0, 10.0, 0.5), 0.0);
        sim.tick(1.0).unwrap();
        sim.assign_job(late, &[id]).unwrap();
        sim.tick(1.0).unwrap();
        assert_eq!(sim.sla_compliance(), 0.0);

        for _ in 0..2 {
            let now = sim.now();
            let job = sim
                .state_mut()
                .enqueue_job(JobRequest::new(1, 16, 1.0, 10.0, 30.0), now);
            sim.assign_job(job, &[id]).unwrap();
            sim.tick(1.0).unwrap();
        }
        assert_eq!(sim.sla_compliance(), 100.0);
        assert_eq!(sim.sla_misses(), 1);
    }

    #[test]
    fn test_create_cluster_rejects_reserved_or_missing() {
        let mut sim = sim();
        let a = sim.purchase_accelerator(GpuModel::L4).unwrap();
        let err = sim.create_cluster(&[a, 99]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "GPU #99 is not available (reserved or doesn't exist)"
        );
        assert!(sim.state().clusters().is_empty());
    }

    #[test]
    fn test_marketing_requires_revenue() {
        let mut sim = sim();
        let err = sim.upgrade_marketing().unwrap_err();
        assert_eq!(err.to_string(), "Unlock at $5000 total revenue");
        assert_eq!(sim.marketing().level(), 0);
    }

    #[test]
    fn test_action_outcome_carries_message() {
        let mut sim = sim();
        let outcome = ActionOutcome::from_result(sim.disband_cluster(3), |_| "ok".to_string());
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Cluster not found");

        let outcome = ActionOutcome::from_result(sim.purchase_accelerator(GpuModel::L4), |id| {
            format!("Purchased GPU #{id}")
        });
        assert_eq!(outcome, ActionOutcome::ok("Purchased GPU #1"));
    }
}
