pub mod batches;
pub mod instruments;
pub mod wip;
