//! Domain events module.
//!
//! Provides the donation event type and the sink trait services emit through
//! after a donation has been committed. The donation relay implements the
//! sink and fans the event out to connected dashboards.

mod domain_event;
mod sink;

pub use domain_event::*;
pub use sink::*;
