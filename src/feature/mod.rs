pub mod registry;
pub mod rendered;
