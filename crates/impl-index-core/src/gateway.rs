//! Deferred handoff between index producers and the index consumer.
//!
//! Generated artifacts may be evaluated before or after the documentation UI
//! has set up its index. The [`RegistryGateway`] absorbs that ordering: a
//! payload submitted before a consumer exists is buffered, and delivered the
//! moment one is installed; once a consumer is installed every payload goes
//! straight through.
//!
//! Everything runs on the caller's thread and completes before returning.
//! Delivery is synchronous in both directions.

use crate::config::{GatewayConfig, PendingPolicy};
use crate::model::Registry;
use serde::Serialize;
use tracing::{debug, info};

/// Receiver of delivered registries, typically the UI's search index.
pub trait IndexConsumer {
    /// Take ownership of one delivered registry.
    fn receive(&mut self, registry: Registry);
}

impl<F> IndexConsumer for F
where
    F: FnMut(Registry),
{
    fn receive(&mut self, registry: Registry) {
        self(registry)
    }
}

/// Counters describing what a gateway has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GatewayStats {
    /// Payloads passed to `submit`.
    pub submitted: u64,
    /// Payloads handed to a consumer, either forwarded or flushed.
    pub delivered: u64,
    /// Buffered payloads overwritten by a newer one before delivery.
    pub replaced_pending: u64,
    /// Calls to `install_consumer`, including replacements.
    pub consumer_installs: u64,
}

/// The two phases of the handoff.
enum GatewayState {
    /// No consumer yet; holds at most one payload awaiting delivery.
    Uninitialized(Option<Registry>),
    /// A consumer is installed and receives payloads directly.
    Ready(Box<dyn IndexConsumer>),
}

/// Hands registry payloads to the index consumer regardless of load order.
///
/// # Example
///
/// ```
/// use impl_index::{ImplementorRecord, Registry, RegistryGateway};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let mut gateway = RegistryGateway::new();
///
/// let payload = Registry::builder()
///     .record("libA", ImplementorRecord::new("impl Debug for Foo", false, ["libA::Foo"]).unwrap())
///     .build()
///     .unwrap();
/// gateway.submit(payload.clone());
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = seen.clone();
/// gateway.install_consumer(move |registry: Registry| sink.borrow_mut().push(registry));
///
/// assert_eq!(seen.borrow().as_slice(), &[payload]);
/// ```
pub struct RegistryGateway {
    config: GatewayConfig,
    state: GatewayState,
    stats: GatewayStats,
}

impl RegistryGateway {
    /// Create a gateway with the default single-slot buffering.
    pub fn new() -> Self {
        Self::with_config(GatewayConfig::default())
    }

    pub fn with_config(config: GatewayConfig) -> Self {
        Self {
            config,
            state: GatewayState::Uninitialized(None),
            stats: GatewayStats::default(),
        }
    }

    /// Accept a payload from a producer.
    ///
    /// With a consumer installed the payload is delivered before this returns.
    /// Otherwise it is buffered according to the configured [`PendingPolicy`].
    pub fn submit(&mut self, payload: Registry) {
        self.stats.submitted += 1;

        match &mut self.state {
            GatewayState::Ready(consumer) => {
                debug!(
                    "Forwarding payload with {} libraries to installed consumer",
                    payload.len()
                );
                consumer.receive(payload);
                self.stats.delivered += 1;
            }
            GatewayState::Uninitialized(pending) => {
                let buffered = match (self.config.pending_policy, pending.take()) {
                    (PendingPolicy::MergeByLibrary, Some(mut buffered)) => {
                        debug!(
                            "Merging payload with {} libraries into pending buffer",
                            payload.len()
                        );
                        buffered.absorb(payload);
                        buffered
                    }
                    (_, previous) => {
                        if previous.is_some() {
                            self.stats.replaced_pending += 1;
                            debug!("Replacing buffered payload that was never delivered");
                        }
                        debug!(
                            "No consumer installed, buffering payload with {} libraries",
                            payload.len()
                        );
                        payload
                    }
                };
                *pending = Some(buffered);
            }
        }
    }

    /// Install the consumer, flushing any pending payload into it first.
    ///
    /// Installing again replaces the previous consumer; only the newest one
    /// receives later payloads.
    pub fn install_consumer<C>(&mut self, consumer: C)
    where
        C: IndexConsumer + 'static,
    {
        self.install_boxed(Box::new(consumer));
    }

    /// Boxed form of [`install_consumer`](Self::install_consumer).
    pub fn install_boxed(&mut self, mut consumer: Box<dyn IndexConsumer>) {
        self.stats.consumer_installs += 1;

        let previous = std::mem::replace(&mut self.state, GatewayState::Uninitialized(None));
        match previous {
            GatewayState::Uninitialized(Some(payload)) => {
                info!(
                    "Consumer installed, delivering pending payload with {} libraries",
                    payload.len()
                );
                consumer.receive(payload);
                self.stats.delivered += 1;
            }
            GatewayState::Uninitialized(None) => {
                info!("Consumer installed, no pending payload");
            }
            GatewayState::Ready(_) => {
                debug!("Replacing previously installed consumer");
            }
        }

        self.state = GatewayState::Ready(consumer);
    }

    /// Whether a consumer has been installed.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, GatewayState::Ready(_))
    }

    pub fn has_pending(&self) -> bool {
        self.pending().is_some()
    }

    /// The payload waiting for a consumer, if any.
    pub fn pending(&self) -> Option<&Registry> {
        match &self.state {
            GatewayState::Uninitialized(pending) => pending.as_ref(),
            GatewayState::Ready(_) => None,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn stats(&self) -> GatewayStats {
        self.stats
    }
}

impl Default for RegistryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RegistryGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let phase = match &self.state {
            GatewayState::Uninitialized(_) => "uninitialized",
            GatewayState::Ready(_) => "ready",
        };
        f.debug_struct("RegistryGateway")
            .field("phase", &phase)
            .field("pending", &self.pending().map(Registry::len))
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish()
    }
}
