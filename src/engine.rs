/*
 *  engine.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	display state engine loop
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

//! The display state engine.
//!
//! One task owns `DisplayState` and everything derived from it. Control
//! input (resize, debug toggle, demo trigger) and fetch completions arrive
//! on a single unbounded queue; periodic work and animations run off the
//! engine's own timer table. Fetches are spawned with a timeout and report
//! back through the queue, so state is only ever touched from `run`.

use crate::air_quality::{caqi_status, position_from_score, score_from_reading, AirQualityReading};
use crate::clock::{format_clock, WallClock};
use crate::config::Config;
use crate::demo::{DemoSequence, DemoStage, DemoStep};
use crate::display::layout::{Layout, LayoutEngine, LayoutInput};
use crate::display::render::{Frame, Renderer};
use crate::error::{KioskError, Result};
use crate::gradient::{compute_gradient, phase_at, GradientAnimator, Tick};
use crate::location::Location;
use crate::scheduler::{AirQualityGate, Completion, Debouncer, JobKind, JobSlot, JobStats, TimerKey, TimerQueue};
use crate::services::{CurrentWeather, Services};
use crate::state::{DisplayState, Gradient, Row, PLACEHOLDER};
use crate::transit::{aggregate, Departure};
use crate::weather::{describe, format_temperature};
use chrono::Timelike;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

pub const WEATHER_ERROR: &str = "Error";
pub const WEATHER_ERROR_DESCRIPTION: &str = "Unable to fetch weather";
pub const NO_AQI_DATA: &str = "No AQI data";
pub const AQI_UNAVAILABLE: &str = "AQI unavailable";

/// Timing and identity knobs of a running engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub weather_every: Duration,
    pub clock_every: Duration,
    pub transit_every: Duration,
    /// How often the air quality hour window is checked.
    pub air_quality_check_every: Duration,
    pub air_quality_hours: Vec<u32>,
    pub fetch_timeout: Duration,
    pub resize_quiet: Duration,
    pub indicator_retry: Duration,
    pub indicator_retry_limit: u32,
    pub transition: Duration,
    pub transition_steps: u32,
    pub demo_stage: Duration,
    pub station_id: String,
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weather_every: Duration::from_secs(30 * 60),
            clock_every: Duration::from_secs(60),
            transit_every: Duration::from_secs(5 * 60),
            air_quality_check_every: Duration::from_secs(60),
            air_quality_hours: crate::config::DEFAULT_AQ_HOURS.to_vec(),
            fetch_timeout: Duration::from_secs(10),
            resize_quiet: Duration::from_millis(150),
            indicator_retry: Duration::from_millis(100),
            indicator_retry_limit: 50,
            transition: Duration::from_secs(2),
            transition_steps: 40,
            demo_stage: Duration::from_secs(3),
            station_id: crate::config::DEFAULT_STATION_ID.to_string(),
            debug: false,
        }
    }
}

impl From<&Config> for EngineConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            weather_every: cfg.weather_interval(),
            clock_every: cfg.clock_interval(),
            transit_every: cfg.transit_interval(),
            air_quality_hours: cfg.aq_hours(),
            fetch_timeout: cfg.fetch_timeout(),
            transition: cfg.transition(),
            demo_stage: cfg.demo_stage(),
            station_id: cfg.station_id(),
            debug: cfg.debug(),
            ..Default::default()
        }
    }
}

/// Result of a spawned fetch.
#[derive(Debug)]
pub enum JobOutcome {
    Weather(Result<CurrentWeather>),
    AirQuality(Result<AirQualityReading>),
    Transit(Result<Vec<Departure>>),
}

#[derive(Debug)]
pub enum Message {
    Resized { width: u32, height: u32 },
    ToggleDebug,
    TriggerDemo,
    JobFinished(JobOutcome),
    Shutdown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub weather: JobStats,
    pub clock: JobStats,
    pub air_quality: JobStats,
    pub transit: JobStats,
    pub layout_passes: u64,
    /// Layout passes caused by a (debounced) resize.
    pub resize_layouts: u64,
    pub animation_ticks: u64,
    pub indicator_retries: u64,
    pub frames_presented: u64,
}

/// Published after every loop iteration.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub state: DisplayState,
    pub layout: Option<Layout>,
    pub surface: (u32, u32),
    pub animating: bool,
    pub demo_running: bool,
    pub stats: EngineStats,
}

/// Cheap, cloneable control surface of a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<Message>,
    snapshots: watch::Receiver<Snapshot>,
}

impl EngineHandle {
    pub fn resize(&self, width: u32, height: u32) -> bool {
        self.send(Message::Resized { width, height })
    }

    pub fn toggle_debug(&self) -> bool {
        self.send(Message::ToggleDebug)
    }

    pub fn trigger_demo(&self) -> bool {
        self.send(Message::TriggerDemo)
    }

    pub fn shutdown(&self) -> bool {
        self.send(Message::Shutdown)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    fn send(&self, msg: Message) -> bool {
        self.tx.send(msg).is_ok()
    }
}

pub struct Engine {
    config: EngineConfig,
    services: Services,
    location: Location,
    clock: Arc<dyn WallClock>,
    renderer: Box<dyn Renderer>,
    layout_engine: LayoutEngine,

    state: DisplayState,
    animator: GradientAnimator,
    demo: DemoSequence,
    timers: TimerQueue,
    jobs: HashMap<JobKind, JobSlot>,
    aq_gate: AirQualityGate,
    resize: Debouncer<(u32, u32)>,
    surface: (u32, u32),
    layout: Option<Layout>,
    last_input: Option<LayoutInput>,
    indicator_attempts: u32,
    departures: Option<Vec<Departure>>,
    last_frame: Option<Frame>,
    stats: EngineStats,

    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
    snapshot_tx: watch::Sender<Snapshot>,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        services: Services,
        location: Location,
        clock: Arc<dyn WallClock>,
        renderer: Box<dyn Renderer>,
    ) -> (Self, EngineHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = DisplayState::new(config.debug);
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot {
            state: state.clone(),
            layout: None,
            surface: (0, 0),
            animating: false,
            demo_running: false,
            stats: EngineStats::default(),
        });

        let jobs = [
            (JobKind::Weather, config.weather_every),
            (JobKind::Clock, config.clock_every),
            (JobKind::AirQuality, config.air_quality_check_every),
            (JobKind::Transit, config.transit_every),
        ]
        .into_iter()
        .map(|(kind, period)| (kind, JobSlot::new(kind, period)))
        .collect();

        let engine = Self {
            aq_gate: AirQualityGate::new(&config.air_quality_hours),
            resize: Debouncer::new(config.resize_quiet),
            animator: GradientAnimator::new(state.gradient),
            config,
            services,
            location,
            clock,
            renderer,
            layout_engine: LayoutEngine::default(),
            state,
            demo: DemoSequence::new(),
            timers: TimerQueue::new(),
            jobs,
            surface: (0, 0),
            layout: None,
            last_input: None,
            indicator_attempts: 0,
            departures: None,
            last_frame: None,
            stats: EngineStats::default(),
            tx: tx.clone(),
            rx,
            snapshot_tx,
        };
        (engine, EngineHandle { tx, snapshots: snapshot_rx })
    }

    pub fn with_layout_engine(mut self, layout_engine: LayoutEngine) -> Self {
        self.layout_engine = layout_engine;
        self
    }

    /// Drive the engine until `Shutdown` arrives.
    pub async fn run(mut self) {
        let now = Instant::now();
        self.bootstrap(now);
        self.present(now);

        loop {
            let deadline = self.timers.next_deadline();
            tokio::select! {
                msg = self.rx.recv() => match msg {
                    Some(Message::Shutdown) | None => break,
                    Some(msg) => self.handle_message(msg, Instant::now()),
                },
                _ = wait_until(deadline) => {
                    let now = Instant::now();
                    for key in self.timers.drain_due(now) {
                        self.fire(key, now);
                    }
                }
            }
            self.present(Instant::now());
        }
        info!("engine stopped after {} frames", self.stats.frames_presented);
    }

    fn bootstrap(&mut self, now: Instant) {
        info!("engine starting at {}", self.location);
        self.state.location_label = self.location.label.clone();
        for kind in JobKind::ALL {
            if kind == JobKind::AirQuality && self.services.air_quality.is_none() {
                warn!("no air quality API key configured, air quality disabled");
                continue;
            }
            self.timers.schedule(TimerKey::Job(kind), now);
        }
        if self.state.debug_mode {
            self.start_demo(now);
        }
    }

    fn handle_message(&mut self, msg: Message, now: Instant) {
        match msg {
            Message::Resized { width, height } => {
                let at = self.resize.notify((width, height), now);
                self.timers.schedule(TimerKey::LayoutDebounce, at);
            }
            Message::ToggleDebug => {
                self.state.debug_mode = !self.state.debug_mode;
                info!("debug overlay {}", if self.state.debug_mode { "on" } else { "off" });
            }
            Message::TriggerDemo if self.state.debug_mode => self.start_demo(now),
            Message::TriggerDemo => debug!("demo needs debug mode, trigger ignored"),
            Message::JobFinished(outcome) => self.finish_fetch(outcome, now),
            Message::Shutdown => {}
        }
    }

    fn fire(&mut self, key: TimerKey, now: Instant) {
        match key {
            TimerKey::Job(kind) => self.run_job(kind, now),
            TimerKey::AnimationTick => self.animation_tick(now),
            TimerKey::DemoStage => self.advance_demo(now),
            TimerKey::LayoutDebounce => self.apply_resize(now),
            TimerKey::IndicatorRetry => {
                let input = self.layout_input();
                self.relayout(input, false, now);
            }
        }
    }

    // --- jobs -----------------------------------------------------------

    fn run_job(&mut self, kind: JobKind, now: Instant) {
        if kind == JobKind::AirQuality && !self.aq_gate.should_fetch(self.clock.now().hour()) {
            self.arm_job(kind, now);
            return;
        }
        let Some(slot) = self.jobs.get_mut(&kind) else { return };
        if !slot.try_begin() {
            return;
        }
        match kind {
            JobKind::Clock => {
                self.tick_clock(now);
                self.complete_job(kind, true, now);
            }
            JobKind::Weather => {
                let client = Arc::clone(&self.services.weather);
                let at = self.location.coordinates;
                self.spawn_fetch(async move { client.fetch_current(at).await }, JobOutcome::Weather);
            }
            JobKind::AirQuality => match self.services.air_quality.clone() {
                Some(client) => {
                    let at = self.location.coordinates;
                    self.spawn_fetch(async move { client.fetch_nearest(at).await }, JobOutcome::AirQuality);
                }
                None => {
                    self.complete_job(kind, true, now);
                }
            },
            JobKind::Transit => {
                let client = Arc::clone(&self.services.transit);
                let station = self.config.station_id.clone();
                self.spawn_fetch(async move { client.fetch_departures(&station).await }, JobOutcome::Transit);
            }
        }
    }

    fn spawn_fetch<T, F>(&self, fetch: F, wrap: fn(Result<T>) -> JobOutcome)
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let tx = self.tx.clone();
        let limit = self.config.fetch_timeout;
        tokio::spawn(async move {
            let result = match tokio::time::timeout(limit, fetch).await {
                Ok(result) => result,
                Err(elapsed) => Err(elapsed.into()),
            };
            if tx.send(Message::JobFinished(wrap(result))).is_err() {
                debug!("engine gone, fetch result dropped");
            }
        });
    }

    fn arm_job(&mut self, kind: JobKind, now: Instant) {
        if let Some(period) = self.jobs.get(&kind).map(|slot| slot.period) {
            self.timers.schedule(TimerKey::Job(kind), now + period);
        }
    }

    /// Running → Idle, then arm the next run one period from now.
    fn complete_job(&mut self, kind: JobKind, ok: bool, now: Instant) -> Completion {
        let completion = match self.jobs.get_mut(&kind) {
            Some(slot) => slot.finish(ok),
            None => Completion::Succeeded,
        };
        self.arm_job(kind, now);
        completion
    }

    fn log_failure(kind: JobKind, e: &KioskError) {
        if e.is_job_failure() {
            warn!("{} refresh failed: {}", kind, e);
        } else {
            debug!("{} refresh deferred: {}", kind, e);
        }
    }

    fn finish_fetch(&mut self, outcome: JobOutcome, now: Instant) {
        match outcome {
            JobOutcome::Weather(result) => {
                let completion = self.complete_job(JobKind::Weather, result.is_ok(), now);
                match result {
                    Ok(current) => self.apply_weather(current, now),
                    Err(e) => {
                        Self::log_failure(JobKind::Weather, &e);
                        if completion == Completion::FailedFirst {
                            self.state.temperature_text = WEATHER_ERROR.to_string();
                            self.state.description = WEATHER_ERROR_DESCRIPTION.to_string();
                        }
                    }
                }
            }
            JobOutcome::AirQuality(result) => {
                let completion = self.complete_job(JobKind::AirQuality, result.is_ok(), now);
                match result {
                    Ok(reading) => self.apply_air_quality(&reading, now),
                    Err(e) => {
                        Self::log_failure(JobKind::AirQuality, &e);
                        if completion == Completion::FailedFirst {
                            let text = match e {
                                KioskError::NotFound(_) => NO_AQI_DATA,
                                _ => AQI_UNAVAILABLE,
                            };
                            self.state.aq_status = text.to_string();
                        }
                    }
                }
            }
            JobOutcome::Transit(result) => {
                let completion = self.complete_job(JobKind::Transit, result.is_ok(), now);
                match result {
                    Ok(departures) => {
                        self.departures = Some(departures);
                        self.refresh_transit_rows();
                    }
                    Err(e) => {
                        Self::log_failure(JobKind::Transit, &e);
                        if completion == Completion::FailedFirst {
                            self.state.transit_rows = [Row::unavailable(), Row::unavailable()];
                        }
                    }
                }
            }
        }
    }

    fn apply_weather(&mut self, current: CurrentWeather, now: Instant) {
        info!("weather: {:.1}°C code {}", current.temperature_c, current.weather_code);
        self.state.temperature_c = Some(current.temperature_c);
        self.state.temperature_text = format_temperature(current.temperature_c);
        self.state.weather_code = current.weather_code;
        self.state.description = describe(current.weather_code).to_string();
        self.retarget_gradient(now);
    }

    fn apply_air_quality(&mut self, reading: &AirQualityReading, now: Instant) {
        let Some(score) = score_from_reading(reading) else {
            debug!("air quality reading had no usable score, keeping previous");
            if self.state.caqi_score.is_none() {
                self.state.aq_status = AQI_UNAVAILABLE.to_string();
            }
            return;
        };
        info!("air quality score {:.1}", score);
        self.state.caqi_score = Some(score);
        self.state.aq_status = caqi_status(score).to_string();
        self.state.aq_position = Some(position_from_score(score));
        self.indicator_attempts = 0;
        let input = self.layout_input();
        self.relayout(input, false, now);
    }

    fn tick_clock(&mut self, now: Instant) {
        self.state.clock = format_clock(&self.clock.now());
        self.refresh_transit_rows();
        self.retarget_gradient(now);
    }

    /// Re-derive the minutes from the last good departure list.
    fn refresh_transit_rows(&mut self) {
        if let Some(departures) = self.departures.as_ref() {
            self.state.transit_rows = aggregate(departures, &self.clock.now());
        }
    }

    // --- gradient -------------------------------------------------------

    fn retarget_gradient(&mut self, now: Instant) {
        if self.demo.is_running() {
            return;
        }
        let phase = phase_at(&self.clock.now(), self.state.phase_override);
        let target = compute_gradient(phase, self.state.weather_code);
        if self.animator.target() != target {
            debug!("gradient retarget: {} / code {} -> {}", phase, self.state.weather_code, target);
            self.animate_to(target, self.config.transition, self.config.transition_steps, now);
        }
    }

    fn animate_to(&mut self, target: Gradient, duration: Duration, steps: u32, now: Instant) {
        match self.animator.animate_to(target, duration, steps) {
            Some(interval) => {
                self.timers.schedule(TimerKey::AnimationTick, now + interval);
            }
            None => {
                self.timers.cancel(TimerKey::AnimationTick);
                self.state.gradient = self.animator.current();
            }
        }
    }

    fn animation_tick(&mut self, now: Instant) {
        self.stats.animation_ticks += 1;
        match self.animator.tick() {
            Tick::Continue(gradient) => {
                self.state.gradient = gradient;
                self.timers.schedule(TimerKey::AnimationTick, now + self.animator.tick_interval());
            }
            Tick::Finished(gradient) => {
                self.state.gradient = gradient;
                debug!("gradient settled at {}", gradient);
            }
            Tick::Idle => {}
        }
    }

    fn start_demo(&mut self, now: Instant) {
        match self.demo.start() {
            Some(stage) => self.enter_demo_stage(stage, now),
            None => debug!("demo already running, trigger ignored"),
        }
    }

    fn enter_demo_stage(&mut self, stage: DemoStage, now: Instant) {
        info!("demo: {} / code {}", stage.phase, stage.weather_code);
        self.state.phase_override = Some(stage.phase);
        let target = compute_gradient(stage.phase, stage.weather_code);
        self.animate_to(target, self.config.transition, self.config.transition_steps, now);
        // a stage never cuts its own transition short
        let hold = self.config.demo_stage.max(self.config.transition);
        self.timers.schedule(TimerKey::DemoStage, now + hold);
    }

    fn advance_demo(&mut self, now: Instant) {
        match self.demo.advance() {
            DemoStep::Stage(stage) => self.enter_demo_stage(stage, now),
            DemoStep::Finished => {
                self.state.phase_override = None;
                self.retarget_gradient(now);
            }
        }
    }

    // --- layout ---------------------------------------------------------

    fn apply_resize(&mut self, now: Instant) {
        let Some((width, height)) = self.resize.fire() else { return };
        debug!("surface resized to {}x{}", width, height);
        self.surface = (width, height);
        let input = self.layout_input();
        self.relayout(input, true, now);
    }

    fn relayout(&mut self, input: LayoutInput, from_resize: bool, now: Instant) {
        let (width, height) = self.surface;
        match self.layout_engine.compute(width, height, &input) {
            Ok(layout) => {
                self.stats.layout_passes += 1;
                if from_resize {
                    self.stats.resize_layouts += 1;
                }
                self.layout = Some(layout);
                self.indicator_attempts = 0;
                self.timers.cancel(TimerKey::IndicatorRetry);
            }
            Err(e) => {
                debug!("layout deferred: {}", e);
                if input.aq_position.is_some() {
                    self.schedule_indicator_retry(now);
                }
            }
        }
        self.last_input = Some(input);
    }

    fn schedule_indicator_retry(&mut self, now: Instant) {
        let limit = self.config.indicator_retry_limit;
        if self.indicator_attempts >= limit {
            if self.indicator_attempts == limit {
                warn!("air quality indicator not placed after {} attempts, waiting for a resize", limit);
                self.indicator_attempts += 1;
            }
            return;
        }
        self.indicator_attempts += 1;
        self.stats.indicator_retries += 1;
        self.timers.schedule(TimerKey::IndicatorRetry, now + self.config.indicator_retry);
    }

    fn overlay_text(&self) -> Option<String> {
        if !self.state.debug_mode {
            return None;
        }
        let phase = phase_at(&self.clock.now(), self.state.phase_override);
        let caqi = self
            .state
            .caqi_score
            .map(|s| format!("{:.0}", s))
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        let demo = if self.demo.is_running() { " | demo" } else { "" };
        Some(format!(
            "phase {} | code {} | caqi {} | {}x{}{}",
            phase, self.state.weather_code, caqi, self.surface.0, self.surface.1, demo
        ))
    }

    fn layout_input(&self) -> LayoutInput {
        LayoutInput {
            location: self.state.location_label.clone(),
            clock: self.state.clock.clone(),
            temperature: self.state.temperature_text.clone(),
            description: self.state.description.clone(),
            aq_status: self.state.aq_status.clone(),
            transit: [self.state.transit_rows[0].to_string(), self.state.transit_rows[1].to_string()],
            aq_position: self.state.aq_position,
            debug_overlay: self.overlay_text(),
        }
    }

    // --- output ---------------------------------------------------------

    /// Relayout if any text changed, repaint if the frame changed, publish.
    fn present(&mut self, now: Instant) {
        let input = self.layout_input();
        if self.last_input.as_ref() != Some(&input) {
            self.relayout(input, false, now);
        }

        let frame = Frame::from_state(&self.state, self.overlay_text(), self.layout.clone());
        if self.last_frame.as_ref() != Some(&frame) {
            if let Err(e) = self.renderer.present(&frame) {
                warn!("renderer failed: {}", e);
            }
            self.stats.frames_presented += 1;
            self.last_frame = Some(frame);
        }
        self.publish();
    }

    fn job_stats(&self, kind: JobKind) -> JobStats {
        self.jobs.get(&kind).map(|slot| slot.stats()).unwrap_or_default()
    }

    fn publish(&mut self) {
        self.stats.weather = self.job_stats(JobKind::Weather);
        self.stats.clock = self.job_stats(JobKind::Clock);
        self.stats.air_quality = self.job_stats(JobKind::AirQuality);
        self.stats.transit = self.job_stats(JobKind::Transit);
        self.snapshot_tx.send_replace(Snapshot {
            state: self.state.clone(),
            layout: self.layout.clone(),
            surface: self.surface,
            animating: self.animator.is_animating(),
            demo_running: self.demo.is_running(),
            stats: self.stats.clone(),
        });
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_from_defaults() {
        let cfg = EngineConfig::from(&Config::default());
        assert_eq!(cfg.weather_every, Duration::from_secs(1800));
        assert_eq!(cfg.air_quality_hours, vec![6, 15, 20]);
        assert_eq!(cfg.resize_quiet, Duration::from_millis(150));
        assert_eq!(cfg.indicator_retry, Duration::from_millis(100));
        assert!(!cfg.debug);
    }
}
