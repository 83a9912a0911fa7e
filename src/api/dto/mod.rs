//! Data Transfer Objects for REST request/response serialization.

pub mod common_dto;
pub mod disaster_dto;
pub mod geocoding_dto;

pub use common_dto::*;
pub use disaster_dto::*;
pub use geocoding_dto::*;
