//! A declarative reconciliation control-plane engine (§OVERVIEW): a set of
//! typed resources, each reconciled by a handler that reads the desired
//! spec, talks to a handful of external collaborators (a secret store, a
//! gateway admin API, an identity admin API, a remote-control-plane syncer,
//! a notification channel) and converges observed status toward it. There
//! is no apiserver or etcd underneath -- `store::memory` stands in for the
//! watch/list/patch substrate the teacher's `kube-runtime` normally rides on,
//! and `runtime` generalizes its `Controller` loop into a plain channel-fed
//! worker pool so the engine can run and be tested without a cluster.

pub mod admission;
pub mod approval_fsm;
pub mod client;
pub mod config;
pub mod errors;
pub mod gateway_admin;
pub mod handlers;
pub mod identity_admin;
pub mod model;
pub mod naming;
pub mod notifications;
pub mod onboarding;
pub mod routing;
pub mod runtime;
pub mod schema;
pub mod secrets;
pub mod store;
pub mod sync;
pub mod token;
