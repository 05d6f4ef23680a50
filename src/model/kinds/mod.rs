pub mod environment;
pub mod team;
pub mod zone;
pub mod application;
pub mod api_specification;
pub mod api;
pub mod api_exposure;
pub mod api_subscription;
pub mod remote_organization;
pub mod remote_api_subscription;
pub mod rover;
pub mod gateway;
pub mod identity;
pub mod approval;
pub mod notification;
