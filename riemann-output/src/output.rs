use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info};

use crate::{
    config::OutputConfig,
    domain::{OutboundEvent, RawEvent, Value},
    services::{flatten, Dispatcher, EventBuilder, FlatFieldMap},
    utils::{errors::Result, hostname::default_hostname},
};

/// Counters of what happened to received events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputStats {
    pub received: u64,
    pub delivered: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

/// Entry point for the upstream pipeline
///
/// Created once with [`RiemannOutput::configure`], then fed events through
/// [`RiemannOutput::receive`], which never fails: a bad event or an
/// unreachable collector only produces an error log line.
#[derive(Debug)]
pub struct RiemannOutput {
    builder: EventBuilder,
    dispatcher: Dispatcher,
    debug: bool,
    counters: Counters,
}

impl RiemannOutput {
    /// Validate the options and prepare the transport
    ///
    /// Only configuration errors are returned; no connection is opened yet.
    pub fn configure(config: &OutputConfig) -> Result<Self> {
        config.validate()?;

        let dispatcher = Dispatcher::configure(
            &config.protocol,
            &config.host,
            config.port,
            config.timeout(),
        )?;
        let builder = EventBuilder::new(default_hostname())
            .with_map_fields(config.map_fields)
            .with_sender(config.sender.clone())
            .with_riemann_event(config.riemann_event.clone());

        Ok(Self::new(builder, dispatcher, config.debug))
    }

    pub fn new(builder: EventBuilder, dispatcher: Dispatcher, debug: bool) -> Self {
        Self {
            builder,
            dispatcher,
            debug,
            counters: Counters::default(),
        }
    }

    /// Build and send one event, logging instead of returning any failure
    pub fn receive(&self, event: &RawEvent) {
        self.counters.received.fetch_add(1, Ordering::Relaxed);

        let record = match self.build_riemann_formatted_event(event) {
            Ok(record) => record,
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    method = "build_riemann_formatted_event",
                    error = %e,
                    "Unhandled exception"
                );
                return;
            }
        };

        if self.debug {
            info!(riemann_event = ?record, "Riemann event");
        } else {
            debug!(riemann_event = ?record, "Riemann event");
        }

        self.send_to_riemann(&record);
    }

    /// Build the collector record for `event` without sending it
    pub fn build_riemann_formatted_event(&self, event: &RawEvent) -> Result<OutboundEvent> {
        self.builder.build(event)
    }

    /// Flatten nested fields the way `map_fields` does
    pub fn map_fields(&self, parent: Option<&str>, fields: &BTreeMap<String, Value>) -> FlatFieldMap {
        flatten(parent, fields)
    }

    fn send_to_riemann(&self, record: &OutboundEvent) {
        match self.dispatcher.send(record) {
            Ok(()) => {
                self.counters.delivered.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    method = "send_to_riemann",
                    protocol = %self.dispatcher.protocol(),
                    error = %e,
                    "Unhandled exception"
                );
            }
        }
    }

    pub fn stats(&self) -> OutputStats {
        OutputStats {
            received: self.counters.received.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}
