pub mod api;
pub mod capacity;
#[cfg(test)]
pub mod fake;
pub mod grouper;
pub mod inventory;
pub mod report;
pub mod snapshot;
pub mod types;
