pub mod annotation;
pub mod errors;
pub mod feature;
pub mod image;
