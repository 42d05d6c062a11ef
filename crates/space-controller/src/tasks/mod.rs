//! Background tasks.

pub mod reconciler;

pub use reconciler::{start_reconciler, Reconciler, ReconcilerConfig};
