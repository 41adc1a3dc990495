// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scripted runtime.

use std::collections::{HashMap, VecDeque};

use vergence_core::capability::Capabilities;
use vergence_core::eye::{Eye, PerEye};
use vergence_core::image::{ImageFrame, ImageKind};
use vergence_core::layer::{Extent, LayerConfig, LayerId, NativeHandle, SurfaceDesc, SurfaceId};
use vergence_core::pose::{Pose, Ray, Vec3};
use vergence_core::runtime::{
    CapabilityRegistrar, HmdRuntime, RuntimeCall, RuntimeError, Transport,
};
use vergence_core::time::{Duration, HostTime};
use vergence_core::tracking::{EyeTrackingData, PoseData};

use crate::call::{Call, CallLog};

/// Runtime calls that [`HeadlessRuntime::fail_next`] can make fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailPoint {
    /// `fetch_eye_tracking_data`.
    FetchEyeTracking,
    /// `fetch_pose_data`.
    FetchPose,
    /// `is_hardware_ready`.
    IsReady,
    /// Transport `last_submitted_pose`.
    LastSubmittedPose,
    /// `ideal_layer_dimensions`.
    IdealDimensions,
    /// `create_layer`.
    CreateLayer,
    /// `create_surface`.
    CreateSurface,
    /// `set_eye_texture`.
    SetEyeTexture,
    /// `submit`.
    Submit,
    /// `wait_for_render_pose`.
    WaitForRenderPose,
}

/// The headless low-level transport.
///
/// Holds its own capability registration and the pose latched at the last
/// render-pose barrier.
#[derive(Debug)]
pub struct HeadlessTransport {
    log: CallLog,
    registered: Capabilities,
    render_pose: Pose,
    fail_pose: Option<RuntimeError>,
}

impl HeadlessTransport {
    /// Capabilities registered on the transport.
    #[must_use]
    pub fn registered(&self) -> Capabilities {
        self.registered
    }
}

impl CapabilityRegistrar for HeadlessTransport {
    fn register_capabilities(&mut self, caps: Capabilities) -> Result<(), RuntimeError> {
        self.log.push(Call::TransportRegister(caps));
        self.registered |= caps;
        Ok(())
    }

    fn unregister_capabilities(&mut self, caps: Capabilities) -> Result<(), RuntimeError> {
        self.log.push(Call::TransportUnregister(caps));
        self.registered = self.registered.difference(caps);
        Ok(())
    }
}

impl Transport for HeadlessTransport {
    fn last_submitted_pose(&mut self) -> Result<Pose, RuntimeError> {
        self.log.push(Call::LastSubmittedPose);
        match self.fail_pose.take() {
            Some(err) => Err(err),
            None => Ok(self.render_pose),
        }
    }
}

#[derive(Debug)]
struct SurfaceSlot {
    extent: Extent,
    materialized: bool,
}

/// An [`HmdRuntime`] driven entirely by the test or demo that owns it.
#[derive(Debug)]
pub struct HeadlessRuntime {
    log: CallLog,
    transport: HeadlessTransport,
    clock: HostTime,
    frame_period: Option<Duration>,
    connected_script: VecDeque<bool>,
    connected: bool,
    ready: bool,
    compositor_ready: bool,
    registered: Capabilities,
    rejected: Capabilities,
    eye: EyeTrackingData,
    pose: PoseData,
    sample_counter: u64,
    ideal: Extent,
    ideal_overrides: HashMap<LayerId, Extent>,
    next_layer: u64,
    layers: HashMap<LayerId, LayerConfig>,
    next_surface: u32,
    surfaces: HashMap<SurfaceId, SurfaceSlot>,
    immediate_handles: bool,
    images: HashMap<ImageKind, ImageFrame>,
    failures: Vec<(FailPoint, RuntimeError)>,
    shut_down: bool,
}

impl Default for HeadlessRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessRuntime {
    /// Creates a runtime with a connected, ready headset and a ready
    /// compositor, recording into a fresh log.
    #[must_use]
    pub fn new() -> Self {
        Self::with_log(CallLog::new())
    }

    /// Creates a runtime recording into `log`.
    #[must_use]
    pub fn with_log(log: CallLog) -> Self {
        Self {
            transport: HeadlessTransport {
                log: log.clone(),
                registered: Capabilities::NONE,
                render_pose: Pose::IDENTITY,
                fail_pose: None,
            },
            log,
            clock: HostTime::ZERO,
            frame_period: None,
            connected_script: VecDeque::new(),
            connected: true,
            ready: true,
            compositor_ready: true,
            registered: Capabilities::NONE,
            rejected: Capabilities::NONE,
            eye: EyeTrackingData::default(),
            pose: PoseData::default(),
            sample_counter: 0,
            ideal: Extent::new(1440, 1600),
            ideal_overrides: HashMap::new(),
            next_layer: 1,
            layers: HashMap::new(),
            next_surface: 1,
            surfaces: HashMap::new(),
            immediate_handles: false,
            images: HashMap::new(),
            failures: Vec::new(),
            shut_down: false,
        }
    }

    // -- Scripting ---------------------------------------------------------

    /// The shared call log.
    #[must_use]
    pub fn log(&self) -> &CallLog {
        &self.log
    }

    /// Advances the clock at every `wait_for_render_pose` by `period`.
    #[must_use]
    pub fn with_frame_period(mut self, period: Duration) -> Self {
        self.frame_period = Some(period);
        self
    }

    /// Makes native handles available as soon as surfaces are created.
    #[must_use]
    pub fn with_immediate_handles(mut self) -> Self {
        self.immediate_handles = true;
        self
    }

    /// Advances the clock.
    pub fn advance(&mut self, by: Duration) {
        self.clock = self.clock + by;
    }

    /// Answers `is_hardware_connected` with `connected` from now on.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected_script.clear();
        self.connected = connected;
    }

    /// Queues answers for `is_hardware_connected`; the last one repeats.
    pub fn script_connected(&mut self, answers: impl IntoIterator<Item = bool>) {
        self.connected_script.extend(answers);
    }

    /// Answer for `is_hardware_ready`.
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    /// Answer for `is_compositor_ready`.
    pub fn set_compositor_ready(&mut self, ready: bool) {
        self.compositor_ready = ready;
    }

    /// The eye-tracking sample returned by the next fetches.
    pub fn eye_tracking_mut(&mut self) -> &mut EyeTrackingData {
        &mut self.eye
    }

    /// The pose sample returned by the next fetches.
    pub fn pose_mut(&mut self) -> &mut PoseData {
        &mut self.pose
    }

    /// Default ideal per-eye size for every layer.
    pub fn set_ideal_dimensions(&mut self, extent: Extent) {
        self.ideal = extent;
    }

    /// Ideal per-eye size for one layer.
    pub fn set_layer_ideal_dimensions(&mut self, layer: LayerId, extent: Extent) {
        self.ideal_overrides.insert(layer, extent);
    }

    /// The image returned for `kind`.
    pub fn set_image(&mut self, kind: ImageKind, frame: ImageFrame) {
        self.images.insert(kind, frame);
    }

    /// Registering any of `caps` fails with
    /// [`RuntimeError::Unsupported`].
    pub fn reject_capabilities(&mut self, caps: Capabilities) {
        self.rejected = caps;
    }

    /// Makes the next call at `point` return `err`.
    pub fn fail_next(&mut self, point: FailPoint, err: RuntimeError) {
        if point == FailPoint::LastSubmittedPose {
            self.transport.fail_pose = Some(err);
        } else {
            self.failures.push((point, err));
        }
    }

    // -- Inspection --------------------------------------------------------

    /// Capabilities registered on the session handle.
    #[must_use]
    pub fn registered(&self) -> Capabilities {
        self.registered
    }

    /// The transport.
    #[must_use]
    pub fn headless_transport(&self) -> &HeadlessTransport {
        &self.transport
    }

    /// Number of live compositor layers.
    #[must_use]
    pub fn live_layers(&self) -> usize {
        self.layers.len()
    }

    /// Number of live surfaces.
    #[must_use]
    pub fn live_surfaces(&self) -> usize {
        self.surfaces.len()
    }

    /// Size of a live surface.
    #[must_use]
    pub fn surface_extent(&self, surface: SurfaceId) -> Option<Extent> {
        self.surfaces.get(&surface).map(|s| s.extent)
    }

    /// Returns `true` once `shutdown` has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    fn take_failure(&mut self, point: FailPoint) -> Result<(), RuntimeError> {
        match self.failures.iter().position(|(p, _)| *p == point) {
            Some(idx) => Err(self.failures.remove(idx).1),
            None => Ok(()),
        }
    }
}

impl CapabilityRegistrar for HeadlessRuntime {
    fn register_capabilities(&mut self, caps: Capabilities) -> Result<(), RuntimeError> {
        self.log.push(Call::Register(caps));
        let rejected = caps & self.rejected;
        if !rejected.is_empty() {
            return Err(RuntimeError::Unsupported(rejected));
        }
        self.registered |= caps;
        Ok(())
    }

    fn unregister_capabilities(&mut self, caps: Capabilities) -> Result<(), RuntimeError> {
        self.log.push(Call::Unregister(caps));
        self.registered = self.registered.difference(caps);
        Ok(())
    }
}

impl HmdRuntime for HeadlessRuntime {
    fn transport(&mut self) -> &mut dyn Transport {
        &mut self.transport
    }

    fn now(&self) -> HostTime {
        self.clock
    }

    fn is_hardware_connected(&mut self) -> bool {
        if let Some(next) = self.connected_script.pop_front() {
            self.connected = next;
        }
        self.log.push(Call::IsConnected(self.connected));
        self.connected
    }

    fn is_hardware_ready(&mut self) -> Result<bool, RuntimeError> {
        self.log.push(Call::IsReady);
        self.take_failure(FailPoint::IsReady)?;
        Ok(self.ready)
    }

    fn fetch_eye_tracking_data(&mut self) -> Result<EyeTrackingData, RuntimeError> {
        self.log.push(Call::FetchEyeTracking);
        self.take_failure(FailPoint::FetchEyeTracking)?;
        self.sample_counter += 1;
        let mut data = self.eye;
        data.timestamp = self.clock;
        data.frame_number = self.sample_counter;
        // Feeds that are not registered read as empty.
        if !self.registered.contains(Capabilities::GAZE) {
            data.combined = Ray::default();
            data.eyes = data.eyes.map(|_, mut sample| {
                sample.gaze = Ray::default();
                sample
            });
        }
        if !self.registered.contains(Capabilities::GAZE_DEPTH) {
            data.focus_distance = 0.0;
            data.convergence = Vec3::ZERO;
        }
        if !self.registered.contains(Capabilities::PUPIL_METRICS) {
            data.eyes = data.eyes.map(|_, mut sample| {
                sample.pupil_diameter = 0.0;
                sample
            });
        }
        if !self.registered.contains(Capabilities::USER_PRESENCE) {
            data.user_present = false;
        }
        Ok(data)
    }

    fn fetch_pose_data(&mut self) -> Result<PoseData, RuntimeError> {
        self.log.push(Call::FetchPose);
        self.take_failure(FailPoint::FetchPose)?;
        let mut data = self.pose;
        data.timestamp = self.clock;
        Ok(data)
    }

    fn ideal_layer_dimensions(&mut self, layer: LayerId) -> Result<Extent, RuntimeError> {
        self.log.push(Call::IdealDimensions(layer));
        self.take_failure(FailPoint::IdealDimensions)?;
        if !self.layers.contains_key(&layer) {
            return Err(RuntimeError::InvalidLayer(layer));
        }
        Ok(self.ideal_overrides.get(&layer).copied().unwrap_or(self.ideal))
    }

    fn create_layer(&mut self, config: &LayerConfig) -> Result<LayerId, RuntimeError> {
        self.take_failure(FailPoint::CreateLayer)?;
        let id = LayerId(self.next_layer);
        self.next_layer += 1;
        self.layers.insert(id, *config);
        self.log.push(Call::CreateLayer(id));
        Ok(id)
    }

    fn delete_layer(&mut self, layer: LayerId) {
        self.log.push(Call::DeleteLayer(layer));
        if self.layers.remove(&layer).is_none() {
            log::warn!("headless: delete of unknown layer {layer:?}");
        }
    }

    fn create_surface(&mut self, desc: &SurfaceDesc) -> Result<SurfaceId, RuntimeError> {
        self.take_failure(FailPoint::CreateSurface)?;
        let id = SurfaceId(self.next_surface);
        self.next_surface += 1;
        self.surfaces.insert(
            id,
            SurfaceSlot {
                extent: desc.extent,
                materialized: self.immediate_handles,
            },
        );
        self.log.push(Call::CreateSurface(id, desc.extent));
        Ok(id)
    }

    fn destroy_surface(&mut self, surface: SurfaceId) {
        self.log.push(Call::DestroySurface(surface));
        self.surfaces.remove(&surface);
    }

    fn native_handle(&mut self, surface: SurfaceId) -> Option<NativeHandle> {
        self.surfaces
            .get(&surface)
            .filter(|s| s.materialized)
            .and_then(|_| NativeHandle::new(0x1_0000 + u64::from(surface.0)))
    }

    fn clear_surface(&mut self, surface: SurfaceId) {
        self.log.push(Call::Clear(surface));
    }

    fn flush(&mut self) {
        self.log.push(Call::Flush);
        for slot in self.surfaces.values_mut() {
            slot.materialized = true;
        }
    }

    fn set_eye_texture(
        &mut self,
        layer: LayerId,
        eye: Eye,
        _handle: NativeHandle,
    ) -> Result<(), RuntimeError> {
        self.log.push(Call::SetEyeTexture(layer, eye));
        self.take_failure(FailPoint::SetEyeTexture)
    }

    fn submit(&mut self, layer: LayerId, _pose: &Pose) -> Result<(), RuntimeError> {
        self.log.push(Call::Submit(layer));
        self.take_failure(FailPoint::Submit)?;
        if self.layers.contains_key(&layer) {
            Ok(())
        } else {
            Err(RuntimeError::InvalidLayer(layer))
        }
    }

    fn blit_to_display(&mut self, _surfaces: &PerEye<SurfaceId>) {
        self.log.push(Call::Blit);
    }

    fn await_end_of_frame(&mut self) {
        self.log.push(Call::AwaitEndOfFrame);
    }

    fn wait_for_render_pose(&mut self) -> Result<(), RuntimeError> {
        self.log.push(Call::WaitForRenderPose);
        self.take_failure(FailPoint::WaitForRenderPose)?;
        if let Some(period) = self.frame_period {
            self.advance(period);
        }
        self.transport.render_pose = self.pose.head;
        Ok(())
    }

    fn is_compositor_ready(&mut self) -> bool {
        self.log.push(Call::IsCompositorReady);
        self.compositor_ready
    }

    fn image(
        &mut self,
        kind: ImageKind,
        newer_than: Option<HostTime>,
    ) -> Result<Option<ImageFrame>, RuntimeError> {
        self.log.push(Call::Image(kind));
        let frame = self.images.get(&kind).ok_or(RuntimeError::Failed {
            call: RuntimeCall::Image,
            code: -1,
        })?;
        if newer_than.is_some_and(|t| frame.timestamp <= t) {
            return Ok(None);
        }
        Ok(Some(frame.clone()))
    }

    fn shutdown(&mut self) {
        self.log.push(Call::Shutdown);
        self.shut_down = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connected_script_repeats_last_answer() {
        let mut rt = HeadlessRuntime::new();
        rt.script_connected([false, true]);
        assert!(!rt.is_hardware_connected());
        assert!(rt.is_hardware_connected());
        assert!(rt.is_hardware_connected(), "sticky");
    }

    #[test]
    fn handles_materialize_at_flush() {
        let mut rt = HeadlessRuntime::new();
        let desc = SurfaceDesc {
            extent: Extent::new(8, 8),
            eye: Eye::Left,
            depth: false,
        };
        let s = rt.create_surface(&desc).unwrap();
        assert!(rt.native_handle(s).is_none());
        rt.flush();
        assert!(rt.native_handle(s).is_some());
    }

    #[test]
    fn fail_next_fails_once() {
        let mut rt = HeadlessRuntime::new();
        rt.fail_next(FailPoint::FetchPose, RuntimeError::Timeout);
        assert_eq!(rt.fetch_pose_data(), Err(RuntimeError::Timeout));
        assert!(rt.fetch_pose_data().is_ok());
    }

    #[test]
    fn gaze_is_empty_until_registered() {
        let mut rt = HeadlessRuntime::new();
        rt.eye_tracking_mut().combined.origin.x = 0.25;
        assert_eq!(rt.fetch_eye_tracking_data().unwrap().combined, Ray::default());
        rt.register_capabilities(Capabilities::GAZE).unwrap();
        assert_eq!(rt.fetch_eye_tracking_data().unwrap().combined.origin.x, 0.25);
    }

    #[test]
    fn stale_image_is_not_copied() {
        let mut rt = HeadlessRuntime::new();
        rt.set_image(
            ImageKind::PositionCamera,
            ImageFrame {
                pixels: vec![7; 4],
                width: 2,
                height: 2,
                timestamp: HostTime(50),
            },
        );
        let kind = ImageKind::PositionCamera;
        assert!(rt.image(kind, None).unwrap().is_some());
        assert!(rt.image(kind, Some(HostTime(49))).unwrap().is_some());
        assert_eq!(rt.image(kind, Some(HostTime(50))).unwrap(), None);
        assert!(rt.image(ImageKind::EyeCamera, None).is_err(), "no eye image set");
    }

    #[test]
    fn render_pose_latches_at_barrier() {
        let mut rt = HeadlessRuntime::new().with_frame_period(Duration::from_millis(11));
        rt.pose_mut().head.position.y = 1.7;
        assert_eq!(rt.transport().last_submitted_pose().unwrap(), Pose::IDENTITY);
        rt.wait_for_render_pose().unwrap();
        assert_eq!(rt.transport().last_submitted_pose().unwrap().position.y, 1.7);
        assert_eq!(rt.now(), HostTime(11_000_000));
    }
}
