pub mod properties;

pub use properties::{MapProperties, PropertySource};
