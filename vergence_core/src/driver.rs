// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame session state machine.
//!
//! [`FrameDriver`] owns the runtime and every piece of session state. The
//! host calls [`tick`](FrameDriver::tick) once per frame:
//!
//! - While **disconnected**, the tick only polls for a headset, and only when
//!   [`hardware_poll_interval`](SessionConfig::hardware_poll_interval) has
//!   elapsed since the last poll. The first tick always polls.
//! - Once **active**, the tick runs the full cycle: capability recompute,
//!   connection check, tracking fetch, per-frame hooks, event diff, layer
//!   resolution, rendering and submission, and finally the render-pose
//!   barrier. A lost headset returns the driver to polling immediately.
//!
//! No runtime error escapes `tick`: failures are logged and the affected
//! values keep their previous contents. The returned [`TickOutcome`] tells
//! the host how far the tick got.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::capability::{Capabilities, CapabilityAggregator};
use crate::config::SessionConfig;
use crate::consumer::{EyeTarget, SharedConsumer};
use crate::event::{DeviceEvent, DeviceEventKind, EventBus, SubscriptionId};
use crate::eye::Eye;
use crate::image::{ImageFrame, ImageKind};
use crate::layer::{EyeTextureCache, LayerConfig, LayerRegistry, Removal};
use crate::pose::{Pose, Quat, Ray, Vec3};
use crate::runtime::HmdRuntime;
use crate::state::FrameState;
use crate::time::HostTime;
use crate::trace::{
    CapabilityChangeEvent, FrameBeginEvent, FrameEndEvent, LayerSubmitEvent, PhaseEvent,
    PhaseKind, TraceSink, Tracer,
};
use crate::tracking::{CalibrationState, EyeOpenness, FrameSnapshot, TrackingState};

/// Connection state of the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DriverState {
    /// No headset; polling has not failed yet.
    Disconnected,
    /// No headset after at least one poll.
    AwaitingHardware,
    /// A headset is connected and frames are being driven.
    Active,
}

/// How far one [`FrameDriver::tick`] got.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TickOutcome {
    /// No headset; the tick polled or waited for the next poll.
    Polling,
    /// The headset was lost during this tick.
    Disconnected,
    /// A transient fetch error skipped the rest of the tick.
    Transient,
    /// Tracking data was updated but the compositor is not ready.
    DataOnly,
    /// The full cycle ran.
    Rendered {
        /// Layers the compositor accepted this frame.
        layers_submitted: u32,
    },
}

/// Read-only view handed to per-frame hooks.
#[derive(Debug)]
pub struct FrameView<'a> {
    /// Driver frame counter.
    pub frame_index: u64,
    /// Runtime time at the start of the tick.
    pub now: HostTime,
    /// This frame's tracking values.
    pub tracking: &'a TrackingState,
    /// Capabilities registered this frame.
    pub capabilities: Capabilities,
}

/// Identifies a hook for [`FrameDriver::remove_frame_hook`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u32);

impl fmt::Debug for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HookId({})", self.0)
    }
}

type FrameHook = Box<dyn FnMut(&FrameView<'_>)>;

/// Drives an HMD session one host frame at a time.
///
/// `FrameDriver` is `!Send`: it holds shared consumer handles and must stay
/// on the thread that renders. Other threads receive
/// [`snapshot`](Self::snapshot) copies.
pub struct FrameDriver<R: HmdRuntime> {
    runtime: R,
    config: SessionConfig,
    state: DriverState,
    now: HostTime,
    last_poll: Option<HostTime>,
    last_absent_log: Option<HostTime>,
    frame_index: u64,
    aggregator: CapabilityAggregator,
    registry: LayerRegistry,
    textures: EyeTextureCache,
    tracking: TrackingState,
    frame_state: FrameState,
    bus: EventBus,
    events: Vec<DeviceEvent>,
    hooks: Vec<(HookId, FrameHook)>,
    next_hook: u32,
    tracer: Tracer,
}

impl<R: HmdRuntime> fmt::Debug for FrameDriver<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameDriver")
            .field("state", &self.state)
            .field("frame_index", &self.frame_index)
            .field("capabilities", &self.aggregator.current())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl<R: HmdRuntime> FrameDriver<R> {
    /// Creates a disconnected driver. Nothing is sent to the runtime until
    /// the first [`tick`](Self::tick).
    pub fn new(runtime: R, config: SessionConfig) -> Self {
        Self {
            runtime,
            config,
            state: DriverState::Disconnected,
            now: HostTime::ZERO,
            last_poll: None,
            last_absent_log: None,
            frame_index: 0,
            aggregator: CapabilityAggregator::new(),
            registry: LayerRegistry::new(),
            textures: EyeTextureCache::new(),
            tracking: TrackingState::default(),
            frame_state: FrameState::default(),
            bus: EventBus::new(),
            events: Vec::new(),
            hooks: Vec::new(),
            next_hook: 0,
            tracer: Tracer::none(),
        }
    }

    /// Routes trace events to `sink` (effective with the `trace` feature).
    #[must_use]
    pub fn with_trace_sink(mut self, sink: Box<dyn TraceSink>) -> Self {
        self.tracer = Tracer::new(sink);
        self
    }

    /// Replaces the trace sink, returning the previous one.
    pub fn set_trace_sink(&mut self, sink: Option<Box<dyn TraceSink>>) -> Option<Box<dyn TraceSink>> {
        let previous = self.tracer.take();
        self.tracer = sink.map_or_else(Tracer::none, Tracer::new);
        previous
    }

    // -- Consumers ---------------------------------------------------------

    /// Queues `consumer` to render into the layer for `config`.
    ///
    /// The consumer joins its layer during the next rendered frame. Returns
    /// `false` if it is already registered.
    pub fn register(&mut self, config: LayerConfig, consumer: SharedConsumer) -> bool {
        self.registry.register(config, consumer)
    }

    /// Removes `consumer`, releasing its layer if it was the last one.
    ///
    /// Returns `false` if it was not registered.
    pub fn unregister(&mut self, consumer: &SharedConsumer) -> bool {
        match self.registry.unregister(consumer, &mut self.runtime) {
            Removal::ReleasedLayer(id) => {
                self.textures.release(id, &mut self.runtime);
                true
            }
            Removal::Pending | Removal::FromLayer(_) => true,
            Removal::NotFound => false,
        }
    }

    // -- Events and hooks --------------------------------------------------

    /// Calls `listener` for every event of `kind`.
    pub fn subscribe(
        &mut self,
        kind: DeviceEventKind,
        listener: impl FnMut(&DeviceEvent) + 'static,
    ) -> SubscriptionId {
        self.bus.subscribe(kind, listener)
    }

    /// Calls `listener` for every event.
    pub fn subscribe_all(&mut self, listener: impl FnMut(&DeviceEvent) + 'static) -> SubscriptionId {
        self.bus.subscribe_all(listener)
    }

    /// Removes an event subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Calls `hook` every active frame, after tracking data is updated and
    /// before events are raised.
    pub fn add_frame_hook(&mut self, hook: impl FnMut(&FrameView<'_>) + 'static) -> HookId {
        let id = HookId(self.next_hook);
        self.next_hook = self.next_hook.wrapping_add(1);
        self.hooks.push((id, Box::new(hook)));
        id
    }

    /// Removes a frame hook. Returns `false` if it was not found.
    pub fn remove_frame_hook(&mut self, id: HookId) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|(h, _)| *h != id);
        self.hooks.len() != before
    }

    // -- Configuration -----------------------------------------------------

    /// Changes the render scale. Cached surfaces are reallocated on the next
    /// rendered frame if their size changes.
    pub fn set_render_scale(&mut self, scale: f64) {
        self.config.render_scale = scale;
    }

    /// Changes the world scale and rescales the current world values.
    pub fn set_world_scale(&mut self, scale: f64) {
        self.config.world_scale = scale;
        self.tracking.derive_world(scale);
    }

    /// Replaces the forced capability set; applied on the next active frame.
    pub fn set_forced_capabilities(&mut self, caps: Capabilities) {
        self.config.forced_capabilities = caps;
    }

    // -- Frame loop --------------------------------------------------------

    /// Runs one frame.
    pub fn tick(&mut self) -> TickOutcome {
        self.now = self.runtime.now();
        self.events.clear();
        self.tracer.frame_begin(&FrameBeginEvent {
            frame_index: self.frame_index,
            now: self.now,
        });

        let outcome = match self.state {
            DriverState::Disconnected | DriverState::AwaitingHardware => self.tick_disconnected(),
            DriverState::Active => self.tick_active(false),
        };

        if self.tracer.is_active() {
            let timestamp = self.runtime.now();
            self.tracer.frame_end(&FrameEndEvent {
                frame_index: self.frame_index,
                timestamp,
                outcome,
            });
        }
        self.frame_index += 1;
        outcome
    }

    fn tick_disconnected(&mut self) -> TickOutcome {
        let interval = self.config.hardware_poll_interval;
        let now = self.now;
        if !self.last_poll.is_none_or(|last| now - last >= interval) {
            return TickOutcome::Polling;
        }
        self.last_poll = Some(now);

        self.phase_begin(PhaseKind::Poll);
        let present = self.runtime.is_hardware_connected();
        self.phase_end(PhaseKind::Poll);

        if !present {
            self.state = DriverState::AwaitingHardware;
            let log_interval = self.config.absent_log_interval;
            if self.last_absent_log.is_none_or(|last| now - last >= log_interval) {
                log::warn!("no headset detected; is the runtime service running?");
                self.last_absent_log = Some(now);
            }
            return TickOutcome::Polling;
        }

        log::info!("headset detected; session active");
        self.state = DriverState::Active;
        self.last_absent_log = None;
        self.tick_active(true)
    }

    fn tick_active(&mut self, connection_confirmed: bool) -> TickOutcome {
        self.phase_begin(PhaseKind::Capabilities);
        self.registry.refresh_requirements();
        let delta = self.aggregator.recompute(
            self.registry.requirements(),
            self.config.forced_capabilities,
            &mut self.runtime,
        );
        if !delta.is_empty() {
            self.tracer.capabilities_changed(&CapabilityChangeEvent {
                frame_index: self.frame_index,
                added: delta.added,
                removed: delta.removed,
                current: self.aggregator.current(),
            });
        }
        self.phase_end(PhaseKind::Capabilities);

        if !connection_confirmed && !self.runtime.is_hardware_connected() {
            self.lose_hardware();
            return TickOutcome::Disconnected;
        }

        self.phase_begin(PhaseKind::Fetch);
        let fetched = self.fetch();
        self.phase_end(PhaseKind::Fetch);
        let Some(ready) = fetched else {
            return TickOutcome::Transient;
        };

        if !self.hooks.is_empty() {
            let view = FrameView {
                frame_index: self.frame_index,
                now: self.now,
                tracking: &self.tracking,
                capabilities: self.aggregator.current(),
            };
            for (_, hook) in &mut self.hooks {
                hook(&view);
            }
        }

        self.phase_begin(PhaseKind::Events);
        let eye = &self.tracking.eye;
        let next = FrameState {
            connected: true,
            ready,
            calibration: eye.calibration,
            shifting_attention: eye.shifting_attention,
            user_present: eye.user_present,
            eyes: eye.eyes.map(|_, sample| sample.openness),
            adjustment_visible: self.tracking.pose.adjustment_visible,
        };
        self.frame_state.diff(&next, &mut self.events);
        self.frame_state = next;
        self.publish_events();
        self.phase_end(PhaseKind::Events);

        if !self.runtime.is_compositor_ready() {
            return TickOutcome::DataOnly;
        }

        self.phase_begin(PhaseKind::Resolve);
        self.runtime.await_end_of_frame();
        self.registry.resolve_pending(&mut self.runtime);
        self.phase_end(PhaseKind::Resolve);

        self.phase_begin(PhaseKind::Render);
        let layers_submitted = self.render_layers();
        self.phase_end(PhaseKind::Render);

        self.phase_begin(PhaseKind::WaitPose);
        if let Err(err) = self.runtime.wait_for_render_pose() {
            log::warn!("wait_for_render_pose failed: {err}");
        }
        self.phase_end(PhaseKind::WaitPose);

        TickOutcome::Rendered { layers_submitted }
    }

    /// Updates tracking values. Returns the hardware-ready flag, or `None`
    /// if a transient error ended the tick.
    fn fetch(&mut self) -> Option<bool> {
        match self.runtime.fetch_eye_tracking_data() {
            Ok(data) => self.tracking.eye = data,
            Err(err) if err.is_transient() => {
                log::debug!("eye tracking fetch: {err}; skipping frame");
                return None;
            }
            Err(err) => log::warn!("eye tracking fetch failed: {err}"),
        }
        match self.runtime.fetch_pose_data() {
            Ok(data) => self.tracking.pose = data,
            Err(err) if err.is_transient() => {
                log::debug!("pose fetch: {err}; skipping frame");
                return None;
            }
            Err(err) => log::warn!("pose fetch failed: {err}"),
        }
        let ready = self.runtime.is_hardware_ready().unwrap_or_else(|err| {
            log::warn!("hardware ready query failed: {err}");
            self.frame_state.ready
        });

        match self.runtime.transport().last_submitted_pose() {
            Ok(pose) => self.tracking.render_pose = pose,
            Err(err) => log::warn!("last submitted pose unavailable: {err}"),
        }
        self.tracking.derive_world(self.config.world_scale);

        let registered = self.aggregator.current();
        for kind in [ImageKind::EyeCamera, ImageKind::PositionCamera] {
            if !registered.contains(kind.capability()) {
                continue;
            }
            let slot = match kind {
                ImageKind::EyeCamera => &mut self.tracking.eye_image,
                ImageKind::PositionCamera => &mut self.tracking.position_image,
            };
            match self.runtime.image(kind, slot.latest()) {
                Ok(Some(frame)) => {
                    slot.refresh(frame);
                }
                Ok(None) => {}
                Err(err) => log::debug!("{kind:?} image unavailable: {err}"),
            }
        }
        Some(ready)
    }

    fn render_layers(&mut self) -> u32 {
        let scale = self.config.effective_render_scale();
        let pose = self.tracking.render_pose;
        let mut submitted = 0;
        for layer in self.registry.layers() {
            if layer.is_empty() {
                continue;
            }
            let id = layer.id();
            let Some(pair) =
                self.textures
                    .get_or_create(id, &mut self.runtime, scale, layer.config().depth)
            else {
                continue;
            };
            pair.clear(&mut self.runtime);
            if !pair.is_ready() {
                self.runtime.flush();
                pair.poll_ready(id, &mut self.runtime);
                continue;
            }

            let surfaces = *pair.surfaces();
            let extent = pair.extent();
            let mut rendered = 0_u32;
            for consumer in layer.consumers() {
                let Ok(mut consumer) = consumer.try_borrow_mut() else {
                    log::warn!("consumer in {id:?} is borrowed elsewhere; skipped");
                    continue;
                };
                let mask = consumer.eye_mask();
                for eye in Eye::ALL {
                    if !mask.contains(eye) {
                        continue;
                    }
                    let target = EyeTarget {
                        layer: id,
                        eye,
                        surface: surfaces[eye],
                        extent,
                        pose,
                    };
                    consumer.render_into(eye, &target);
                }
                rendered += 1;
            }

            let accepted = match self.runtime.submit(id, &pose) {
                Ok(()) => true,
                Err(err) => {
                    log::warn!("submit {id:?} failed: {err}");
                    false
                }
            };
            if accepted {
                submitted += 1;
            }
            self.tracer.layer_submitted(&LayerSubmitEvent {
                frame_index: self.frame_index,
                layer: id,
                consumers: rendered,
                extent,
                accepted,
            });
            if !self.config.custom_desktop_view {
                self.runtime.blit_to_display(&surfaces);
            }
        }
        submitted
    }

    fn lose_hardware(&mut self) {
        log::warn!("headset disconnected");
        // Nothing else can be read back, so the other fields keep their
        // last known values.
        let next = FrameState {
            connected: false,
            ..self.frame_state
        };
        self.frame_state.diff(&next, &mut self.events);
        self.frame_state = next;
        self.publish_events();
        self.state = DriverState::Disconnected;
        self.last_poll = Some(self.now);
        self.last_absent_log = None;
    }

    fn publish_events(&mut self) {
        for event in &self.events {
            log::debug!("device event: {event:?}");
            self.tracer.device_event(self.frame_index, event);
            self.bus.dispatch(event);
        }
    }

    fn phase_begin(&mut self, phase: PhaseKind) {
        if self.tracer.is_active() {
            let e = self.phase_event(phase);
            self.tracer.phase_begin(&e);
        }
    }

    fn phase_end(&mut self, phase: PhaseKind) {
        if self.tracer.is_active() {
            let e = self.phase_event(phase);
            self.tracer.phase_end(&e);
        }
    }

    fn phase_event(&self, phase: PhaseKind) -> PhaseEvent {
        PhaseEvent {
            frame_index: self.frame_index,
            phase,
            timestamp: self.runtime.now(),
        }
    }

    /// Releases every layer and surface, unregisters all capabilities, and
    /// closes the session. Returns the runtime.
    pub fn shutdown(mut self) -> R {
        for id in self.registry.clear(&mut self.runtime) {
            self.textures.release(id, &mut self.runtime);
        }
        self.textures.clear(&mut self.runtime);
        self.aggregator.reset(&mut self.runtime);
        self.runtime.shutdown();
        log::info!("session shut down after {} frames", self.frame_index);
        self.runtime
    }

    // -- Queries -----------------------------------------------------------

    /// Connection state.
    #[must_use]
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Number of ticks run so far.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Events raised by the most recent tick.
    #[must_use]
    pub fn events(&self) -> &[DeviceEvent] {
        &self.events
    }

    /// The pose consumers rendered with this frame.
    #[must_use]
    pub fn current_pose(&self) -> Pose {
        self.tracking.render_pose
    }

    /// Head position in world units.
    #[must_use]
    pub fn world_position(&self) -> Vec3 {
        self.tracking.world_position
    }

    /// Standing position in world units.
    #[must_use]
    pub fn standing_position(&self) -> Vec3 {
        self.tracking.standing_position
    }

    /// Head orientation.
    #[must_use]
    pub fn orientation(&self) -> Quat {
        self.tracking.orientation
    }

    /// Combined gaze ray.
    #[must_use]
    pub fn current_gaze(&self) -> Ray {
        self.tracking.gaze()
    }

    /// Point where the two gaze rays converge.
    #[must_use]
    pub fn current_gaze_convergence(&self) -> Vec3 {
        self.tracking.eye.convergence
    }

    /// Whether `eye` is open.
    #[must_use]
    pub fn current_eye_state(&self, eye: Eye) -> EyeOpenness {
        self.tracking.eye_openness(eye)
    }

    /// Calibration status.
    #[must_use]
    pub fn calibration(&self) -> CalibrationState {
        self.tracking.eye.calibration
    }

    /// The edge-tracked device state as of the last fetch.
    #[must_use]
    pub fn frame_state(&self) -> &FrameState {
        &self.frame_state
    }

    /// All tracking values.
    #[must_use]
    pub fn tracking(&self) -> &TrackingState {
        &self.tracking
    }

    /// Latest eye-camera image.
    #[must_use]
    pub fn eye_image(&self) -> Option<&ImageFrame> {
        self.tracking.eye_image.frame()
    }

    /// Latest position-camera image.
    #[must_use]
    pub fn position_image(&self) -> Option<&ImageFrame> {
        self.tracking.position_image.frame()
    }

    /// Capabilities currently registered with the runtime.
    #[must_use]
    pub fn registered_capabilities(&self) -> Capabilities {
        self.aggregator.current()
    }

    /// An owned copy of the current query surface for another thread.
    #[must_use]
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            frame_index: self.frame_index,
            now: self.now,
            state: self.frame_state,
            eye: self.tracking.eye,
            render_pose: self.tracking.render_pose,
            world_position: self.tracking.world_position,
            standing_position: self.tracking.standing_position,
        }
    }

    /// The layer registry.
    #[must_use]
    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    /// The eye-texture cache.
    #[must_use]
    pub fn textures(&self) -> &EyeTextureCache {
        &self.textures
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The runtime.
    #[must_use]
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// The runtime, mutably.
    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::RefCell;

    use super::*;
    use crate::mock::{MockCall, MockRuntime};
    use crate::time::Duration;

    struct Camera {
        priority: f32,
        caps: Capabilities,
        renders: u32,
    }

    impl crate::consumer::RenderConsumer for Camera {
        fn priority(&self) -> f32 {
            self.priority
        }

        fn required_capabilities(&self) -> Capabilities {
            self.caps
        }

        fn render_into(&mut self, _eye: Eye, _target: &EyeTarget) {
            self.renders += 1;
        }
    }

    fn camera(caps: Capabilities) -> Rc<RefCell<Camera>> {
        Rc::new(RefCell::new(Camera {
            priority: 0.0,
            caps,
            renders: 0,
        }))
    }

    #[test]
    fn first_tick_polls_then_waits_for_interval() {
        let mut rt = MockRuntime::new();
        rt.connected = false;
        let mut driver = FrameDriver::new(rt, SessionConfig::new());

        assert_eq!(driver.tick(), TickOutcome::Polling);
        assert_eq!(driver.state(), DriverState::AwaitingHardware);

        driver.runtime_mut().connected = true;
        driver.runtime_mut().now = HostTime(Duration::from_millis(500).nanos());
        assert_eq!(driver.tick(), TickOutcome::Polling, "interval not elapsed");
        assert_eq!(driver.state(), DriverState::AwaitingHardware);

        driver.runtime_mut().now = HostTime(Duration::from_secs(1).nanos());
        assert!(matches!(driver.tick(), TickOutcome::Rendered { .. }));
        assert_eq!(driver.state(), DriverState::Active);
        assert_eq!(
            driver.events(),
            &[
                DeviceEvent::ConnectedChanged(true),
                DeviceEvent::ReadyChanged(true)
            ]
        );
    }

    #[test]
    fn pending_pair_is_cleared_but_not_submitted() {
        let mut driver = FrameDriver::new(MockRuntime::new(), SessionConfig::new());
        let cam = camera(Capabilities::NONE);
        driver.register(LayerConfig::BASE, cam.clone());

        assert_eq!(driver.tick(), TickOutcome::Rendered { layers_submitted: 0 });
        assert_eq!(cam.borrow().renders, 0);
        assert_eq!(driver.runtime().count(|c| matches!(c, MockCall::Clear(_))), 2);

        assert_eq!(driver.tick(), TickOutcome::Rendered { layers_submitted: 1 });
        assert_eq!(cam.borrow().renders, 2, "one render per eye");
    }

    #[test]
    fn unregistering_last_consumer_releases_surfaces() {
        let mut driver = FrameDriver::new(MockRuntime::new(), SessionConfig::new());
        let cam: SharedConsumer = camera(Capabilities::GAZE);
        driver.register(LayerConfig::BASE, cam.clone());
        driver.tick();
        assert_eq!(driver.textures().len(), 1);
        assert_eq!(driver.registered_capabilities(), Capabilities::GAZE);

        assert!(driver.unregister(&cam));
        assert!(!driver.unregister(&cam));
        assert!(driver.textures().is_empty());
        assert_eq!(driver.runtime().live_surface_count(), 0);
    }

    #[test]
    fn borrowed_consumer_keeps_capabilities_registered() {
        let mut driver = FrameDriver::new(MockRuntime::new(), SessionConfig::new());
        let cam = camera(Capabilities::GAZE);
        driver.register(LayerConfig::BASE, cam.clone());
        driver.tick();
        assert_eq!(driver.registered_capabilities(), Capabilities::GAZE);
        driver.runtime_mut().calls.clear();

        {
            let _held = cam.borrow_mut();
            assert!(matches!(driver.tick(), TickOutcome::Rendered { .. }));
        }
        driver.tick();

        let churn = driver
            .runtime()
            .count(|c| matches!(c, MockCall::Register(_) | MockCall::Unregister(_)));
        assert_eq!(churn, 0, "no registration calls while the consumer is borrowed");
        assert_eq!(driver.registered_capabilities(), Capabilities::GAZE);
        assert_eq!(driver.runtime().transport.registered, Capabilities::GAZE);
    }

    #[test]
    fn disconnect_keeps_last_known_state() {
        let mut driver = FrameDriver::new(MockRuntime::new(), SessionConfig::new());
        driver.tick();
        let before = *driver.frame_state();
        assert!(before.connected && before.ready, "{before:?}");

        driver.runtime_mut().connected = false;
        assert_eq!(driver.tick(), TickOutcome::Disconnected);
        assert_eq!(driver.events(), &[DeviceEvent::ConnectedChanged(false)]);
        assert_eq!(
            *driver.frame_state(),
            FrameState {
                connected: false,
                ..before
            }
        );

        driver.runtime_mut().connected = true;
        driver.runtime_mut().now = HostTime(Duration::from_secs(1).nanos());
        assert!(matches!(driver.tick(), TickOutcome::Rendered { .. }));
        assert_eq!(
            driver.events(),
            &[DeviceEvent::ConnectedChanged(true)],
            "ready did not change while away"
        );
    }

    #[test]
    fn shutdown_releases_everything() {
        let mut driver = FrameDriver::new(
            MockRuntime::new(),
            SessionConfig::new().with_forced_capabilities(Capabilities::USER_PRESENCE),
        );
        driver.register(LayerConfig::BASE, camera(Capabilities::POSITION));
        driver.tick();
        let rt = driver.shutdown();

        assert_eq!(rt.registered, Capabilities::NONE);
        assert_eq!(rt.transport.registered, Capabilities::NONE);
        assert_eq!(rt.live_surface_count(), 0);
        assert_eq!(rt.count(|c| matches!(c, MockCall::DeleteLayer(_))), 1);
    }

    #[test]
    fn hooks_see_fresh_tracking_before_events() {
        let mut driver = FrameDriver::new(MockRuntime::new(), SessionConfig::new());
        let seen = Rc::new(RefCell::new(vec![]));
        let s = seen.clone();
        let id = driver.add_frame_hook(move |view| s.borrow_mut().push(view.frame_index));
        driver.tick();
        driver.tick();
        assert!(driver.remove_frame_hook(id));
        driver.tick();
        assert_eq!(*seen.borrow(), vec![0, 1]);
    }
}
