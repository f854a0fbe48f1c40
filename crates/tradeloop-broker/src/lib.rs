//! Broker integrations.

mod paper;

pub use paper::{CloseReason, ClosedOrder, PaperBroker};
