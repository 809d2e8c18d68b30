pub mod dispatcher;
pub mod event_builder;
pub mod flattener;
pub mod template;

pub use dispatcher::Dispatcher;
pub use event_builder::EventBuilder;
pub use flattener::{flatten, FlatFieldMap};
