//! Defaults fields of a child object from its parent.
//!
//! The parent type declares which of its fields should be copied into its
//! children, and where to:
//!
//! ```
//! # use stackable_mutation::overrides::Defaulter;
//! # use stackable_mutation::k8s_openapi::api::core::v1::{Affinity, LocalObjectReference};
//! #[derive(Clone, Default, Defaulter)]
//! struct HarborSpec {
//!     #[defaulter(path = "spec.template.spec.affinity")]
//!     affinity: Option<Affinity>,
//!
//!     #[defaulter(path = "imagePullSecrets,spec.template.spec.imagePullSecrets")]
//!     image_pull_secrets: Option<Vec<LocalObjectReference>>,
//! }
//! ```
//!
//! [`make_override_mutator`] harvests these fields once into an
//! [`OverridePlan`], and the returned mutator copies every captured value into
//! the child, but only if
//!
//! 1. every object along the path exists,
//! 2. the target field is declared with exactly the same type, and
//! 3. the target field still holds its default value.
//!
//! Anything else is silently skipped, so applying the mutator never fails and
//! applying it twice changes nothing.
//!
//! Annotated fields are captured as a whole, they are not walked into. All
//! other fields are walked, which requires their types to implement
//! [`Defaulter`] as well. Leaf types (numbers, strings, collections, and the
//! common Kubernetes types) do so without capturing anything, other fields can
//! be excluded with `#[defaulter(skip)]`.
use std::collections::{BTreeMap, BTreeSet, HashMap};

use k8s_openapi::{
    ByteString,
    api::{
        apps::v1::{
            DaemonSet, DaemonSetSpec, DaemonSetUpdateStrategy, Deployment, DeploymentSpec,
            DeploymentStrategy, ReplicaSet, ReplicaSetSpec, StatefulSet, StatefulSetOrdinals,
            StatefulSetPersistentVolumeClaimRetentionPolicy, StatefulSetSpec,
            StatefulSetUpdateStrategy,
        },
        batch::v1::{
            CronJob, CronJobSpec, Job, JobSpec, JobTemplateSpec, PodFailurePolicy, SuccessPolicy,
        },
        core::v1::{
            Affinity, ConfigMap, Container, EnvVar, EphemeralContainer, HostAlias,
            LocalObjectReference, Namespace, NamespaceSpec, NodeAffinity, ObjectReference,
            PersistentVolumeClaim, PersistentVolumeClaimSpec, Pod, PodAffinity, PodAntiAffinity,
            PodDNSConfig, PodOS, PodReadinessGate, PodResourceClaim, PodSchedulingGate,
            PodSecurityContext, PodSpec, PodTemplateSpec, ResourceRequirements, Secret,
            SecurityContext, Service, ServiceAccount, ServicePort, ServiceSpec,
            SessionAffinityConfig, Toleration, TopologySpreadConstraint,
            TypedLocalObjectReference, TypedObjectReference, Volume, VolumeResourceRequirements,
            WorkloadReference,
        },
        networking::v1::{Ingress, IngressBackend, IngressRule, IngressSpec, IngressTLS},
        policy::v1::{PodDisruptionBudget, PodDisruptionBudgetSpec},
        rbac::v1::{PolicyRule, Role, RoleBinding, RoleRef, Subject},
    },
    apimachinery::pkg::{
        api::resource::Quantity,
        apis::meta::v1::{LabelSelector, ManagedFieldsEntry, ObjectMeta, OwnerReference, Time},
        util::intstr::IntOrString,
    },
};
pub use stackable_mutation_derive::Defaulter;
use tracing::instrument;

use crate::{
    mutator::{Context, Mutator, Result},
    reflect::Reflect,
};

mod plan;

pub use plan::{Assignment, OverrideEntry, OverridePlan, TargetPath};

/// A parent type whose fields can be harvested into an [`OverridePlan`].
///
/// Most users will want to derive this, see
/// [the associated derive macro](`derive@Defaulter`).
pub trait Defaulter {
    /// Adds the annotated fields of `self` (and of everything below it) to
    /// `plan`, in declaration order.
    fn collect_defaults(&self, plan: &mut OverridePlan);
}

impl<T: Defaulter> Defaulter for Option<T> {
    fn collect_defaults(&self, plan: &mut OverridePlan) {
        if let Some(value) = self {
            value.collect_defaults(plan);
        }
    }
}

impl<T: Defaulter + ?Sized> Defaulter for Box<T> {
    fn collect_defaults(&self, plan: &mut OverridePlan) {
        T::collect_defaults(self, plan);
    }
}

// Collections are captured as a whole or not at all, their items are never walked.
impl<T> Defaulter for Vec<T> {
    fn collect_defaults(&self, _plan: &mut OverridePlan) {}
}
impl<T> Defaulter for BTreeSet<T> {
    fn collect_defaults(&self, _plan: &mut OverridePlan) {}
}
impl<K, V> Defaulter for BTreeMap<K, V> {
    fn collect_defaults(&self, _plan: &mut OverridePlan) {}
}
impl<K, V, S> Defaulter for HashMap<K, V, S> {
    fn collect_defaults(&self, _plan: &mut OverridePlan) {}
}

/// Implements [`Defaulter`] for leaf types, which never contain annotated
/// fields.
#[macro_export]
macro_rules! leaf_defaulter {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::overrides::Defaulter for $ty {
                fn collect_defaults(&self, _plan: &mut $crate::overrides::OverridePlan) {}
            }
        )*
    };
}

leaf_defaulter!(
    bool, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, char, String,
);

// Kubernetes objects are captured as a whole or not at all.
leaf_defaulter!(
    ByteString,
    IntOrString,
    LabelSelector,
    ManagedFieldsEntry,
    ObjectMeta,
    OwnerReference,
    Quantity,
    Time,
);

leaf_defaulter!(
    DaemonSet,
    DaemonSetSpec,
    DaemonSetUpdateStrategy,
    Deployment,
    DeploymentSpec,
    DeploymentStrategy,
    ReplicaSet,
    ReplicaSetSpec,
    StatefulSet,
    StatefulSetOrdinals,
    StatefulSetPersistentVolumeClaimRetentionPolicy,
    StatefulSetSpec,
    StatefulSetUpdateStrategy,
);

leaf_defaulter!(
    CronJob,
    CronJobSpec,
    Job,
    JobSpec,
    JobTemplateSpec,
    PodFailurePolicy,
    SuccessPolicy,
);

leaf_defaulter!(
    Affinity,
    ConfigMap,
    Container,
    EnvVar,
    EphemeralContainer,
    HostAlias,
    LocalObjectReference,
    Namespace,
    NamespaceSpec,
    NodeAffinity,
    ObjectReference,
    PersistentVolumeClaim,
    PersistentVolumeClaimSpec,
    Pod,
    PodAffinity,
    PodAntiAffinity,
    PodDNSConfig,
    PodOS,
    PodReadinessGate,
    PodResourceClaim,
    PodSchedulingGate,
    PodSecurityContext,
    PodSpec,
    PodTemplateSpec,
    ResourceRequirements,
    Secret,
    SecurityContext,
    Service,
    ServiceAccount,
    ServicePort,
    ServiceSpec,
    SessionAffinityConfig,
    Toleration,
    TopologySpreadConstraint,
    TypedLocalObjectReference,
    TypedObjectReference,
    Volume,
    VolumeResourceRequirements,
    WorkloadReference,
);

leaf_defaulter!(
    Ingress,
    IngressBackend,
    IngressRule,
    IngressSpec,
    IngressTLS,
    PodDisruptionBudget,
    PodDisruptionBudgetSpec,
    PolicyRule,
    Role,
    RoleBinding,
    RoleRef,
    Subject,
);

/// Copies the fields harvested from a parent into children, see the
/// [module documentation](self).
#[derive(Debug)]
pub struct OverrideMutator {
    plan: OverridePlan,
}

impl OverrideMutator {
    pub fn plan(&self) -> &OverridePlan {
        &self.plan
    }
}

impl Mutator for OverrideMutator {
    #[instrument(
        name = "apply_override_plan",
        skip_all,
        fields(target = target.reflect_type_name(), entries = self.plan.len()),
    )]
    fn mutate(&self, _ctx: &Context, target: &mut dyn Reflect) -> Result {
        self.plan.apply(target);
        Ok(())
    }
}

/// Builds a [`Mutator`] that defaults the fields of a child from `parent`.
///
/// The annotated values are cloned right away, changes to `parent` after this
/// call do not affect the returned mutator.
pub fn make_override_mutator<P>(parent: &P) -> OverrideMutator
where
    P: Defaulter + ?Sized,
{
    OverrideMutator {
        plan: OverridePlan::from_parent(parent),
    }
}
