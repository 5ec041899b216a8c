pub mod imaging;
pub mod transport;
