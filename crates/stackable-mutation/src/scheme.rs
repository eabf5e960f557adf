use std::{
    any::{Any, TypeId},
    collections::HashMap,
};

use k8s_openapi::api::{
    apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet},
    batch::v1::{CronJob, Job},
    core::v1::{
        ConfigMap, Namespace, PersistentVolumeClaim, Pod, Secret, Service, ServiceAccount,
    },
    networking::v1::Ingress,
    policy::v1::PodDisruptionBudget,
    rbac::v1::{Role, RoleBinding},
};
use kube::{Resource, core::GroupVersionKind};

/// Maps Rust types to the Kubernetes kind they represent.
pub trait KindRegistry {
    fn kind_of(&self, type_id: TypeId) -> Option<GroupVersionKind>;
}

/// A [`KindRegistry`] that is filled explicitly, one [`Resource`] type at a time.
///
/// ```
/// # use stackable_mutation::{Scheme, k8s_openapi::api::core::v1::Secret};
/// let mut scheme = Scheme::new();
/// scheme.register::<Secret>();
///
/// let gvk = scheme.object_kind::<Secret>().unwrap();
/// assert_eq!(gvk.api_version(), "v1");
/// assert_eq!(gvk.kind, "Secret");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Scheme {
    kinds: HashMap<TypeId, GroupVersionKind>,
}

impl Scheme {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scheme that knows the built-in kinds operators commonly own or are
    /// owned by. All of them can be mutated as well.
    pub fn with_builtin_kinds() -> Self {
        let mut scheme = Self::new();
        scheme
            .register::<ConfigMap>()
            .register::<CronJob>()
            .register::<DaemonSet>()
            .register::<Deployment>()
            .register::<Ingress>()
            .register::<Job>()
            .register::<Namespace>()
            .register::<PersistentVolumeClaim>()
            .register::<Pod>()
            .register::<PodDisruptionBudget>()
            .register::<ReplicaSet>()
            .register::<Role>()
            .register::<RoleBinding>()
            .register::<Secret>()
            .register::<Service>()
            .register::<ServiceAccount>()
            .register::<StatefulSet>();
        scheme
    }

    pub fn register<K>(&mut self) -> &mut Self
    where
        K: Resource<DynamicType = ()> + Any,
    {
        let gvk = GroupVersionKind::gvk(&K::group(&()), &K::version(&()), &K::kind(&()));
        self.kinds.insert(TypeId::of::<K>(), gvk);
        self
    }

    pub fn object_kind<K: Any>(&self) -> Option<&GroupVersionKind> {
        self.kinds.get(&TypeId::of::<K>())
    }

    pub fn is_registered<K: Any>(&self) -> bool {
        self.kinds.contains_key(&TypeId::of::<K>())
    }
}

impl KindRegistry for Scheme {
    fn kind_of(&self, type_id: TypeId) -> Option<GroupVersionKind> {
        self.kinds.get(&type_id).cloned()
    }
}
