// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-crate recording runtime for unit tests.

use alloc::vec::Vec;

use crate::capability::Capabilities;
use crate::eye::{Eye, PerEye};
use crate::image::{ImageFrame, ImageKind};
use crate::layer::{Extent, LayerConfig, LayerId, NativeHandle, SurfaceDesc, SurfaceId};
use crate::pose::Pose;
use crate::runtime::{CapabilityRegistrar, HmdRuntime, RuntimeCall, RuntimeError, Transport};
use crate::time::HostTime;
use crate::tracking::{EyeTrackingData, PoseData};

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum MockCall {
    Register(Capabilities),
    Unregister(Capabilities),
    TransportRegister(Capabilities),
    TransportUnregister(Capabilities),
    CreateLayer(LayerId),
    DeleteLayer(LayerId),
    CreateSurface(SurfaceId, Extent),
    DestroySurface(SurfaceId),
    Clear(SurfaceId),
    Flush,
    SetEyeTexture(LayerId, Eye),
    Submit(LayerId),
    Blit,
    AwaitEndOfFrame,
    WaitPose,
    FetchEye,
    FetchPose,
}

#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    pub(crate) calls: Vec<MockCall>,
    pub(crate) registered: Capabilities,
    pub(crate) pose: Pose,
}

impl CapabilityRegistrar for MockTransport {
    fn register_capabilities(&mut self, caps: Capabilities) -> Result<(), RuntimeError> {
        self.calls.push(MockCall::TransportRegister(caps));
        self.registered |= caps;
        Ok(())
    }

    fn unregister_capabilities(&mut self, caps: Capabilities) -> Result<(), RuntimeError> {
        self.calls.push(MockCall::TransportUnregister(caps));
        self.registered = self.registered.difference(caps);
        Ok(())
    }
}

impl Transport for MockTransport {
    fn last_submitted_pose(&mut self) -> Result<Pose, RuntimeError> {
        Ok(self.pose)
    }
}

#[derive(Debug)]
pub(crate) struct MockRuntime {
    pub(crate) calls: Vec<MockCall>,
    pub(crate) transport: MockTransport,
    pub(crate) registered: Capabilities,
    pub(crate) reject_register: bool,
    pub(crate) ideal: Result<Extent, RuntimeError>,
    pub(crate) fail_create_layer: bool,
    /// Surfaces get native handles at the first flush after creation.
    pub(crate) lazy_handles: bool,
    pub(crate) connected: bool,
    pub(crate) now: HostTime,
    next_layer: u64,
    next_surface: u32,
    live_surfaces: Vec<(SurfaceId, bool)>,
}

impl MockRuntime {
    pub(crate) fn new() -> Self {
        Self {
            calls: Vec::new(),
            transport: MockTransport::default(),
            registered: Capabilities::NONE,
            reject_register: false,
            ideal: Ok(Extent::new(100, 100)),
            fail_create_layer: false,
            lazy_handles: true,
            connected: true,
            now: HostTime::ZERO,
            next_layer: 1,
            next_surface: 1,
            live_surfaces: Vec::new(),
        }
    }

    pub(crate) fn count(&self, pred: impl Fn(&MockCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub(crate) fn live_surface_count(&self) -> usize {
        self.live_surfaces.len()
    }
}

impl CapabilityRegistrar for MockRuntime {
    fn register_capabilities(&mut self, caps: Capabilities) -> Result<(), RuntimeError> {
        self.calls.push(MockCall::Register(caps));
        if self.reject_register {
            return Err(RuntimeError::Unsupported(caps));
        }
        self.registered |= caps;
        Ok(())
    }

    fn unregister_capabilities(&mut self, caps: Capabilities) -> Result<(), RuntimeError> {
        self.calls.push(MockCall::Unregister(caps));
        self.registered = self.registered.difference(caps);
        Ok(())
    }
}

impl HmdRuntime for MockRuntime {
    fn transport(&mut self) -> &mut dyn Transport {
        &mut self.transport
    }

    fn now(&self) -> HostTime {
        self.now
    }

    fn is_hardware_connected(&mut self) -> bool {
        self.connected
    }

    fn is_hardware_ready(&mut self) -> Result<bool, RuntimeError> {
        Ok(true)
    }

    fn fetch_eye_tracking_data(&mut self) -> Result<EyeTrackingData, RuntimeError> {
        self.calls.push(MockCall::FetchEye);
        Ok(EyeTrackingData::default())
    }

    fn fetch_pose_data(&mut self) -> Result<PoseData, RuntimeError> {
        self.calls.push(MockCall::FetchPose);
        Ok(PoseData::default())
    }

    fn ideal_layer_dimensions(&mut self, _layer: LayerId) -> Result<Extent, RuntimeError> {
        self.ideal
    }

    fn create_layer(&mut self, _config: &LayerConfig) -> Result<LayerId, RuntimeError> {
        if self.fail_create_layer {
            return Err(RuntimeError::Failed {
                call: RuntimeCall::Layer,
                code: -1,
            });
        }
        let id = LayerId(self.next_layer);
        self.next_layer += 1;
        self.calls.push(MockCall::CreateLayer(id));
        Ok(id)
    }

    fn delete_layer(&mut self, layer: LayerId) {
        self.calls.push(MockCall::DeleteLayer(layer));
    }

    fn create_surface(&mut self, desc: &SurfaceDesc) -> Result<SurfaceId, RuntimeError> {
        let id = SurfaceId(self.next_surface);
        self.next_surface += 1;
        self.live_surfaces.push((id, !self.lazy_handles));
        self.calls.push(MockCall::CreateSurface(id, desc.extent));
        Ok(id)
    }

    fn destroy_surface(&mut self, surface: SurfaceId) {
        self.live_surfaces.retain(|(id, _)| *id != surface);
        self.calls.push(MockCall::DestroySurface(surface));
    }

    fn native_handle(&mut self, surface: SurfaceId) -> Option<NativeHandle> {
        self.live_surfaces
            .iter()
            .find(|(id, live)| *id == surface && *live)
            .and_then(|(id, _)| NativeHandle::new(0x1000 + u64::from(id.0)))
    }

    fn clear_surface(&mut self, surface: SurfaceId) {
        self.calls.push(MockCall::Clear(surface));
    }

    fn flush(&mut self) {
        for (_, live) in &mut self.live_surfaces {
            *live = true;
        }
        self.calls.push(MockCall::Flush);
    }

    fn set_eye_texture(
        &mut self,
        layer: LayerId,
        eye: Eye,
        _handle: NativeHandle,
    ) -> Result<(), RuntimeError> {
        self.calls.push(MockCall::SetEyeTexture(layer, eye));
        Ok(())
    }

    fn submit(&mut self, layer: LayerId, _pose: &Pose) -> Result<(), RuntimeError> {
        self.calls.push(MockCall::Submit(layer));
        Ok(())
    }

    fn blit_to_display(&mut self, _surfaces: &PerEye<SurfaceId>) {
        self.calls.push(MockCall::Blit);
    }

    fn await_end_of_frame(&mut self) {
        self.calls.push(MockCall::AwaitEndOfFrame);
    }

    fn wait_for_render_pose(&mut self) -> Result<(), RuntimeError> {
        self.calls.push(MockCall::WaitPose);
        Ok(())
    }

    fn is_compositor_ready(&mut self) -> bool {
        true
    }

    fn image(
        &mut self,
        _kind: ImageKind,
        _newer_than: Option<HostTime>,
    ) -> Result<Option<ImageFrame>, RuntimeError> {
        Err(RuntimeError::Failed {
            call: RuntimeCall::Image,
            code: 0,
        })
    }
}
