// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Priority-ordered consumer lists per compositor layer.

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;

use super::{LayerConfig, LayerId};
use crate::capability::Capabilities;
use crate::consumer::{SharedConsumer, same_consumer};
use crate::runtime::HmdRuntime;

/// A consumer placed in a layer, with the priority it had when placed.
struct Placed {
    consumer: SharedConsumer,
    priority: f32,
    required: Capabilities,
}

/// A consumer waiting for its layer.
struct Pending {
    config: LayerConfig,
    consumer: SharedConsumer,
    required: Capabilities,
}

/// Last reported requirements of `consumer`, or `cached` while it is
/// mutably borrowed.
fn read_requirements(consumer: &SharedConsumer, cached: Capabilities) -> Capabilities {
    consumer
        .try_borrow()
        .map_or(cached, |c| c.required_capabilities())
}

/// A live compositor layer and its consumers.
pub struct LayerEntry {
    id: LayerId,
    config: LayerConfig,
    consumers: Vec<Placed>,
}

impl LayerEntry {
    /// The runtime's handle for this layer.
    #[must_use]
    pub fn id(&self) -> LayerId {
        self.id
    }

    /// The configuration the layer was created with.
    #[must_use]
    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    /// Consumers in render order.
    pub fn consumers(&self) -> impl ExactSizeIterator<Item = &SharedConsumer> {
        self.consumers.iter().map(|p| &p.consumer)
    }

    /// Number of consumers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    /// Returns `true` if the layer has no consumers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    fn position(&self, consumer: &SharedConsumer) -> Option<usize> {
        self.consumers
            .iter()
            .position(|p| same_consumer(&p.consumer, consumer))
    }

    /// Inserts after every consumer whose priority is ≤ `priority`.
    fn insert(&mut self, consumer: SharedConsumer, priority: f32, required: Capabilities) {
        let at = self
            .consumers
            .partition_point(|p| p.priority.total_cmp(&priority) != Ordering::Greater);
        self.consumers.insert(
            at,
            Placed {
                consumer,
                priority,
                required,
            },
        );
    }
}

impl fmt::Debug for LayerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let priorities: Vec<f32> = self.consumers.iter().map(|p| p.priority).collect();
        f.debug_struct("LayerEntry")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("priorities", &priorities)
            .finish()
    }
}

/// What [`LayerRegistry::unregister`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Removal {
    /// The consumer was still pending and never reached a layer.
    Pending,
    /// The consumer left a layer that still has other consumers.
    FromLayer(LayerId),
    /// The consumer was the last one; the layer was deleted.
    ReleasedLayer(LayerId),
    /// The consumer was not registered.
    NotFound,
}

/// The set of live layers and the consumers waiting to join one.
///
/// A consumer appears at most once across all pending entries and layers.
#[derive(Default)]
pub struct LayerRegistry {
    layers: Vec<LayerEntry>,
    pending: Vec<Pending>,
}

impl fmt::Debug for LayerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerRegistry")
            .field("layers", &self.layers)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl LayerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            layers: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Queues `consumer` to join the layer for `config` at the next
    /// [`resolve_pending`](Self::resolve_pending).
    ///
    /// Returns `false` (and changes nothing) if the consumer is already
    /// pending or placed. A consumer that is mutably borrowed here counts as
    /// requiring nothing until [`refresh_requirements`](Self::refresh_requirements)
    /// can read it.
    pub fn register(&mut self, config: LayerConfig, consumer: SharedConsumer) -> bool {
        if self.contains(&consumer) {
            log::debug!("consumer already registered; ignoring");
            return false;
        }
        let required = read_requirements(&consumer, Capabilities::NONE);
        self.pending.push(Pending {
            config,
            consumer,
            required,
        });
        true
    }

    /// Places every pending consumer, creating layers as needed.
    ///
    /// A consumer whose layer cannot be created is dropped with a warning; it
    /// joins again only if registered again. A consumer that is mutably
    /// borrowed stays pending until the next call. Returns the number of
    /// consumers placed.
    pub fn resolve_pending<R: HmdRuntime + ?Sized>(&mut self, runtime: &mut R) -> usize {
        let mut placed = 0;
        let mut deferred = Vec::new();
        for entry in core::mem::take(&mut self.pending) {
            let Some(priority) = entry.consumer.try_borrow().ok().map(|c| c.priority()) else {
                deferred.push(entry);
                continue;
            };
            let Pending {
                config,
                consumer,
                required,
            } = entry;
            let idx = match self.layers.iter().position(|l| l.config == config) {
                Some(idx) => idx,
                None => match runtime.create_layer(&config) {
                    Ok(id) => {
                        log::debug!("created layer {id:?} for {config:?}");
                        self.layers.push(LayerEntry {
                            id,
                            config,
                            consumers: Vec::new(),
                        });
                        self.layers.len() - 1
                    }
                    Err(err) => {
                        log::warn!("creating layer for {config:?} failed: {err}");
                        continue;
                    }
                },
            };
            self.layers[idx].insert(consumer, priority, required);
            placed += 1;
        }
        self.pending = deferred;
        placed
    }

    /// Removes `consumer` from the pending list or from its layer.
    ///
    /// If that leaves the layer empty, the runtime layer is deleted and the
    /// entry dropped. Callers are responsible for releasing any surfaces they
    /// keep for the returned layer.
    pub fn unregister<R: HmdRuntime + ?Sized>(
        &mut self,
        consumer: &SharedConsumer,
        runtime: &mut R,
    ) -> Removal {
        if let Some(pos) = self
            .pending
            .iter()
            .position(|p| same_consumer(&p.consumer, consumer))
        {
            self.pending.remove(pos);
            return Removal::Pending;
        }
        for idx in 0..self.layers.len() {
            let Some(pos) = self.layers[idx].position(consumer) else {
                continue;
            };
            let layer = &mut self.layers[idx];
            layer.consumers.remove(pos);
            let id = layer.id;
            if layer.consumers.is_empty() {
                runtime.delete_layer(id);
                self.layers.remove(idx);
                log::debug!("released empty layer {id:?}");
                return Removal::ReleasedLayer(id);
            }
            return Removal::FromLayer(id);
        }
        Removal::NotFound
    }

    /// Deletes every layer and forgets every pending consumer.
    ///
    /// Returns the deleted layer ids.
    pub fn clear<R: HmdRuntime + ?Sized>(&mut self, runtime: &mut R) -> Vec<LayerId> {
        self.pending.clear();
        self.layers
            .drain(..)
            .map(|layer| {
                runtime.delete_layer(layer.id);
                layer.id
            })
            .collect()
    }

    /// Returns `true` if `consumer` is pending or placed.
    #[must_use]
    pub fn contains(&self, consumer: &SharedConsumer) -> bool {
        self.pending.iter().any(|p| same_consumer(&p.consumer, consumer))
            || self.layers.iter().any(|l| l.position(consumer).is_some())
    }

    /// Live layers in creation order.
    pub fn layers(&self) -> impl ExactSizeIterator<Item = &LayerEntry> {
        self.layers.iter()
    }

    /// Number of live layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// The entry for `layer`, if it is live.
    #[must_use]
    pub fn layer(&self, layer: LayerId) -> Option<&LayerEntry> {
        self.layers.iter().find(|l| l.id == layer)
    }

    /// Number of consumers waiting to be placed.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Every registered consumer, pending ones first.
    pub fn all_consumers(&self) -> impl Iterator<Item = &SharedConsumer> {
        self.pending
            .iter()
            .map(|p| &p.consumer)
            .chain(self.layers.iter().flat_map(LayerEntry::consumers))
    }

    /// Re-reads every consumer's required capabilities.
    ///
    /// A consumer that is mutably borrowed keeps the set it last reported.
    pub fn refresh_requirements(&mut self) {
        let pending = self
            .pending
            .iter_mut()
            .map(|p| (&p.consumer, &mut p.required));
        let placed = self
            .layers
            .iter_mut()
            .flat_map(|l| l.consumers.iter_mut())
            .map(|p| (&p.consumer, &mut p.required));
        for (consumer, required) in pending.chain(placed) {
            *required = read_requirements(consumer, *required);
        }
    }

    /// The required capabilities of every registered consumer, as of the
    /// last [`refresh_requirements`](Self::refresh_requirements).
    pub fn requirements(&self) -> impl Iterator<Item = Capabilities> + '_ {
        self.pending.iter().map(|p| p.required).chain(
            self.layers
                .iter()
                .flat_map(|l| l.consumers.iter().map(|p| p.required)),
        )
    }
}
