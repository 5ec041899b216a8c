pub mod codec;
pub mod overlay;
