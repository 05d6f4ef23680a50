//! The generic `Resource<Spec, Status>` envelope every kind is built from,
//! plus the closed set of kinds the engine knows how to reconcile.

use serde::{Deserialize, Serialize};

use super::meta::{Conditions, ObjectMeta};

/// The closed set of kinds this control plane reconciles. Kept as an enum
/// (rather than runtime reflection over a type registry) per the
/// re-architecture guidance: dispatch is a match, not a dynamic lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Kind {
    Environment,
    Team,
    Zone,
    Application,
    ApiSpecification,
    Api,
    ApiExposure,
    ApiSubscription,
    RemoteOrganization,
    RemoteApiSubscription,
    Rover,
    Route,
    Realm,
    Consumer,
    IdentityProvider,
    IdentityRealm,
    IdentityClient,
    Approval,
    ApprovalRequest,
    Notification,
    NotificationChannel,
}

impl Kind {
    /// Lowercase name used in the `owned-by` label and the approval name
    /// convention (`slug(kind)--name`).
    pub fn slug(self) -> &'static str {
        match self {
            Kind::Environment => "environment",
            Kind::Team => "team",
            Kind::Zone => "zone",
            Kind::Application => "application",
            Kind::ApiSpecification => "apispecification",
            Kind::Api => "api",
            Kind::ApiExposure => "apiexposure",
            Kind::ApiSubscription => "apisubscription",
            Kind::RemoteOrganization => "remoteorganization",
            Kind::RemoteApiSubscription => "remoteapisubscription",
            Kind::Rover => "rover",
            Kind::Route => "route",
            Kind::Realm => "realm",
            Kind::Consumer => "consumer",
            Kind::IdentityProvider => "identityprovider",
            Kind::IdentityRealm => "identityrealm",
            Kind::IdentityClient => "identityclient",
            Kind::Approval => "approval",
            Kind::ApprovalRequest => "approvalrequest",
            Kind::Notification => "notification",
            Kind::NotificationChannel => "notificationchannel",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slug())
    }
}

/// Every persisted object: `{kind, metadata, spec, status}`. `api_version` is
/// fixed per kind for now (no kind here has shipped a v2 yet); it is still
/// carried on the wire shape so a future incompatible change has somewhere
/// to go without disturbing every caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource<Spec, Status> {
    pub api_version: String,
    pub kind: Kind,
    pub metadata: ObjectMeta,
    pub spec: Spec,
    pub status: Status,
}

impl<Spec, Status: Default> Resource<Spec, Status> {
    pub fn new(kind: Kind, metadata: ObjectMeta, spec: Spec) -> Self {
        Self { api_version: "v1".to_string(), kind, metadata, spec, status: Status::default() }
    }
}

/// Trait implemented by every `Status` type that carries the canonical
/// condition set, so runtime/client code can manipulate conditions
/// generically regardless of kind.
pub trait HasConditions {
    fn conditions(&self) -> &Conditions;
    fn conditions_mut(&mut self) -> &mut Conditions;
}

/// Blanket accessor so handlers can write `resource.conditions_mut()`
/// directly on a `Resource<Spec, Status>` when `Status: HasConditions`.
impl<Spec, Status: HasConditions> Resource<Spec, Status> {
    pub fn conditions(&self) -> &Conditions {
        self.status.conditions()
    }

    pub fn conditions_mut(&mut self) -> &mut Conditions {
        self.status.conditions_mut()
    }
}

/// Implements `HasConditions` for a status struct that has a `conditions:
/// Conditions` field, to avoid repeating the boilerplate per kind.
#[macro_export]
macro_rules! impl_has_conditions {
    ($ty:ty) => {
        impl $crate::model::resource::HasConditions for $ty {
            fn conditions(&self) -> &$crate::model::meta::Conditions {
                &self.conditions
            }
            fn conditions_mut(&mut self) -> &mut $crate::model::meta::Conditions {
                &mut self.conditions
            }
        }
    };
}
