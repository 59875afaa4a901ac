pub mod group;
pub mod infer;
