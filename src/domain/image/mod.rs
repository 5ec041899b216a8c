pub mod entity;
pub mod registry;
pub mod value_objects;
