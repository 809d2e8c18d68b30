use riemann_client::{Attribute, ClientError, Event, Protocol, RiemannClient};
use std::time::Duration;

use crate::{
    domain::{FieldValue, OutboundEvent},
    services::event_builder::{METRIC_FIELD, TTL_FIELD},
    utils::errors::{OutputError, Result},
};

pub const SERVICE_FIELD: &str = "service";
pub const STATE_FIELD: &str = "state";

/// Encodes collector records and sends them over the configured transport
#[derive(Debug)]
pub struct Dispatcher {
    client: RiemannClient,
}

impl Dispatcher {
    pub fn new(client: RiemannClient) -> Self {
        Self { client }
    }

    /// Validate the protocol name and prepare a (not yet connected) client
    pub fn configure(protocol: &str, host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let client = RiemannClient::configure(protocol, host, port, timeout).map_err(|e| match e {
            ClientError::Configuration(message) => OutputError::Configuration(message),
            other => OutputError::Transport(other),
        })?;
        tracing::info!(
            "Riemann output configured for {} over {}",
            client.config().address(),
            client.protocol()
        );
        Ok(Self::new(client))
    }

    /// Encode and send one record; TCP waits for the collector's acknowledgement
    pub fn send(&self, record: &OutboundEvent) -> Result<()> {
        let event = encode_event(record);
        self.client.send_event(event)?;
        tracing::trace!(host = %record.host, time = record.time, "Event delivered");
        Ok(())
    }

    pub fn protocol(&self) -> Protocol {
        self.client.protocol()
    }

    pub fn client(&self) -> &RiemannClient {
        &self.client
    }
}

/// Map a collector record onto the protobuf event
///
/// `service` and `state` fill their dedicated slots, a numeric `metric` or
/// `ttl` fills its numeric slot, every other field becomes a string attribute.
pub fn encode_event(record: &OutboundEvent) -> Event {
    let mut event = Event {
        host: Some(record.host.clone()),
        time: Some(record.time),
        description: record.description.clone(),
        tags: record.tags.clone().unwrap_or_default(),
        ..Default::default()
    };

    for (key, value) in &record.fields {
        match (key.as_str(), value, value.as_f64()) {
            (SERVICE_FIELD, _, _) => event.service = Some(value.to_string()),
            (STATE_FIELD, _, _) => event.state = Some(value.to_string()),
            (METRIC_FIELD, FieldValue::Integer(i), _) => event.metric_sint64 = Some(*i),
            (METRIC_FIELD, _, Some(metric)) => {
                event.metric_d = Some(metric);
                event.metric_f = Some(metric as f32);
            }
            (TTL_FIELD, _, Some(ttl)) => event.ttl = Some(ttl as f32),
            _ => event.attributes.push(Attribute::new(key.as_str(), value.to_string())),
        }
    }

    event
}
