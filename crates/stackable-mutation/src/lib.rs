//! Mutators adjust a freshly computed child object in place before it is
//! applied to the cluster.
//!
//! Two mutators are provided:
//!
//! - [`make_owner_mutator`] stamps the child with a controller
//!   [`OwnerReference`] pointing to the parent, so that garbage collection and
//!   reconciliation triggering work, and two controllers cannot both claim the
//!   same child.
//! - [`make_override_mutator`] copies fields of the parent into matching,
//!   currently unset fields of the child. Which fields are copied (and where
//!   to) is declared on the parent type with `#[defaulter(path = "...")]`.
//!
//! Both implement [`Mutator`] and can be combined into a [`MutatorChain`],
//! which runs them in the order they were added.
//!
//! ```
//! use stackable_mutation::{
//!     Context, Mutator, MutatorChain, Scheme, make_override_mutator, make_owner_mutator,
//!     k8s_openapi::{
//!         api::{apps::v1::{Deployment, DeploymentSpec}, core::v1::{Affinity, NodeAffinity, Namespace}},
//!         apimachinery::pkg::apis::meta::v1::ObjectMeta,
//!     },
//!     overrides::Defaulter,
//! };
//!
//! #[derive(Clone, Default, Defaulter)]
//! struct Spec {
//!     #[defaulter(path = "spec.template.spec.affinity")]
//!     affinity: Option<Affinity>,
//! }
//!
//! let parent = Namespace {
//!     metadata: ObjectMeta {
//!         name: Some("harbor".to_owned()),
//!         uid: Some("c85bfb53-a28e-4782-baaf-3c218a25f192".to_owned()),
//!         ..ObjectMeta::default()
//!     },
//!     ..Namespace::default()
//! };
//! let spec = Spec {
//!     affinity: Some(Affinity {
//!         node_affinity: Some(NodeAffinity::default()),
//!         ..Affinity::default()
//!     }),
//! };
//!
//! let chain = MutatorChain::new()
//!     .with(make_owner_mutator(&Scheme::with_builtin_kinds(), &parent))
//!     .with(make_override_mutator(&spec));
//!
//! let mut deployment = Deployment {
//!     spec: Some(DeploymentSpec::default()),
//!     ..Deployment::default()
//! };
//! chain.mutate(&Context::new(), &mut deployment).unwrap();
//!
//! let pod_spec = deployment.spec.unwrap().template.spec;
//! assert!(pod_spec.is_none(), "the pod spec was not present, so there is nothing to default");
//! assert_eq!(deployment.metadata.owner_references.unwrap().len(), 1);
//! ```
//!
//! [`OwnerReference`]: k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference

pub mod mutator;
pub mod overrides;
pub mod owner;
pub mod reflect;
pub mod scheme;

pub use mutator::{Context, Mutator, MutatorChain};
pub use overrides::make_override_mutator;
pub use owner::make_owner_mutator;
pub use scheme::{KindRegistry, Scheme};

// External re-exports
pub use k8s_openapi;
pub use kube;
