pub mod outbound;
pub mod value;

pub use outbound::{FieldValue, OutboundEvent};
pub use value::{RawEvent, Value};
