// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A consumer that records what it is asked to render.

use std::cell::RefCell;
use std::rc::Rc;

use vergence_core::capability::Capabilities;
use vergence_core::consumer::{EyeTarget, RenderConsumer};
use vergence_core::eye::{Eye, EyeMask};

use crate::call::{Call, CallLog};

/// A [`RenderConsumer`] that appends [`Call::Render`] to a [`CallLog`].
#[derive(Debug)]
pub struct RecordingConsumer {
    tag: u32,
    priority: f32,
    capabilities: Capabilities,
    mask: EyeMask,
    active: bool,
    log: CallLog,
    last_target: Option<EyeTarget>,
}

impl RecordingConsumer {
    /// Creates an active consumer needing no capabilities.
    #[must_use]
    pub fn new(tag: u32, priority: f32, log: CallLog) -> Self {
        Self {
            tag,
            priority,
            capabilities: Capabilities::NONE,
            mask: EyeMask::BOTH,
            active: true,
            log,
            last_target: None,
        }
    }

    /// Sets the capabilities required while active.
    #[must_use]
    pub fn with_capabilities(mut self, caps: Capabilities) -> Self {
        self.capabilities = caps;
        self
    }

    /// Sets the eyes this consumer renders into.
    #[must_use]
    pub fn with_eye_mask(mut self, mask: EyeMask) -> Self {
        self.mask = mask;
        self
    }

    /// Wraps the consumer in a shared handle.
    #[must_use]
    pub fn shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    /// Enables or disables the consumer. Inactive consumers need no
    /// capabilities.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Changes the draw priority. Takes effect the next time the consumer is
    /// placed in a layer.
    pub fn set_priority(&mut self, priority: f32) {
        self.priority = priority;
    }

    /// The tag recorded in [`Call::Render`].
    #[must_use]
    pub fn tag(&self) -> u32 {
        self.tag
    }

    /// The target of the most recent `render_into`.
    #[must_use]
    pub fn last_target(&self) -> Option<&EyeTarget> {
        self.last_target.as_ref()
    }
}

impl RenderConsumer for RecordingConsumer {
    fn priority(&self) -> f32 {
        self.priority
    }

    fn required_capabilities(&self) -> Capabilities {
        if self.active {
            self.capabilities
        } else {
            Capabilities::NONE
        }
    }

    fn eye_mask(&self) -> EyeMask {
        self.mask
    }

    fn render_into(&mut self, eye: Eye, target: &EyeTarget) {
        self.log.push(Call::Render {
            consumer: self.tag,
            layer: target.layer,
            eye,
        });
        self.last_target = Some(*target);
    }
}
