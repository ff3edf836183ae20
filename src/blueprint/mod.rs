pub mod catalog;
pub mod model;

pub use catalog::cividler;
pub use model::{Blueprint, Catalog, Cost, Production, Requirement, Yield};
