//! One handler per reconciled kind (§4.1-§4.9). Leaf gateway/identity kinds
//! (`Route`, `Realm`, `Consumer`, `IdentityProvider`, `IdentityRealm`,
//! `IdentityClient`, `Gateway`) and `Approval` have no handler of their own:
//! like the teacher's `Deployment`/`Service`/`ConfigMap`/`Ingress`, they are
//! fully materialized by their owning handler through the scoped client and
//! never reconciled independently.

pub mod api;
pub mod api_exposure;
pub mod api_specification;
pub mod api_subscription;
pub mod application;
pub mod approval_request;
pub mod environment;
pub mod notification;
pub mod remote_api_subscription;
pub mod rover;
pub mod team;
pub mod zone;
