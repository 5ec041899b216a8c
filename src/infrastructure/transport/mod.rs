pub mod reqwest_transport;
pub mod traits;
