pub mod codec;
pub mod dto;
pub mod request_builder;
pub mod response_router;
