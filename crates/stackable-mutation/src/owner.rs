//! Sets the controller [`OwnerReference`] of a child object.
//!
//! Kubernetes garbage collects children once their owners are gone, and
//! controllers watching owned objects are triggered when a child changes. An
//! object can have many owners, but only one of them can be its controller.
//!
//! Behaves like `SetControllerReference` from controller-runtime.
use std::any::{Any, TypeId, type_name};

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::{Resource, ResourceExt, core::GroupVersionKind};
use snafu::{OptionExt, ResultExt, Snafu, ensure};
use tracing::instrument;

use crate::{
    mutator::{self, Context, Mutator, SetControllerReferenceSnafu},
    reflect::{self, Reflect},
    scheme::KindRegistry,
};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum Error {
    #[snafu(display("{type_name} does not carry object metadata"))]
    WrongResourceKind { type_name: &'static str },

    #[snafu(display(
        "object is already controlled by {kind} {name:?}, cannot hand control over to {owner_kind} {owner_name:?}"
    ))]
    AlreadyOwned {
        kind: String,
        name: String,
        owner_kind: String,
        owner_name: String,
    },

    #[snafu(display("the kind of owner type {type_name} is not registered"))]
    UnregisteredKind { type_name: &'static str },

    #[snafu(display("owner {kind} is missing a name or uid"))]
    IncompleteOwner { kind: String },

    #[snafu(display(
        "cluster-scoped objects cannot be owned by namespaced objects (owner namespace {owner_namespace:?})"
    ))]
    ClusterScopedChild { owner_namespace: String },

    #[snafu(display(
        "cross-namespace owner references are not allowed (owner namespace {owner_namespace:?}, object namespace {namespace:?})"
    ))]
    CrossNamespaceOwner {
        owner_namespace: String,
        namespace: String,
    },

    #[snafu(display("mutation was cancelled"))]
    Cancelled,
}

/// The parts of the parent that end up in the owner reference, captured when
/// the mutator is built.
#[derive(Clone, Debug)]
struct Owner {
    type_name: &'static str,
    gvk: Option<GroupVersionKind>,
    name: Option<String>,
    uid: Option<String>,
    namespace: Option<String>,
}

/// Makes the parent the controller of every object passed to it, see
/// [`make_owner_mutator`].
#[derive(Clone, Debug)]
pub struct OwnerMutator {
    owner: Owner,
}

impl OwnerMutator {
    #[instrument(name = "set_controller_reference", skip_all, fields(owner = ?self.owner.name))]
    fn set_controller_reference(&self, ctx: &Context, target: &mut dyn Reflect) -> Result<()> {
        ensure!(!ctx.is_cancelled(), CancelledSnafu);

        let reference = self.owner_reference()?;
        let type_name = target.reflect_type_name();
        let metadata = object_meta_mut(target).context(WrongResourceKindSnafu { type_name })?;
        self.validate_namespace(metadata)?;

        let references = metadata.owner_references.get_or_insert_with(Vec::new);
        if let Some(controller) = references.iter().find(|existing| is_controller(existing)) {
            ensure!(
                refers_to_same_object(controller, &reference),
                AlreadyOwnedSnafu {
                    kind: &controller.kind,
                    name: &controller.name,
                    owner_kind: &reference.kind,
                    owner_name: &reference.name,
                }
            );
        }

        match references
            .iter_mut()
            .find(|existing| refers_to_same_object(existing, &reference))
        {
            Some(existing) => *existing = reference,
            None => references.push(reference),
        }
        Ok(())
    }

    fn owner_reference(&self) -> Result<OwnerReference> {
        let Owner {
            type_name,
            gvk,
            name,
            uid,
            ..
        } = &self.owner;
        let gvk = gvk.as_ref().context(UnregisteredKindSnafu { type_name: *type_name })?;
        let (Some(name), Some(uid)) = (name, uid) else {
            return IncompleteOwnerSnafu { kind: &gvk.kind }.fail();
        };

        Ok(OwnerReference {
            api_version: gvk.api_version(),
            kind: gvk.kind.clone(),
            name: name.clone(),
            uid: uid.clone(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        })
    }

    /// Owner references must never cross namespaces, and cluster-scoped
    /// objects can only be owned by other cluster-scoped objects.
    fn validate_namespace(&self, metadata: &ObjectMeta) -> Result<()> {
        let Some(owner_namespace) = self.owner.namespace.as_deref() else {
            return Ok(());
        };
        match metadata.namespace.as_deref().filter(|ns| !ns.is_empty()) {
            None => ClusterScopedChildSnafu { owner_namespace }.fail(),
            Some(namespace) if namespace != owner_namespace => CrossNamespaceOwnerSnafu {
                owner_namespace,
                namespace,
            }
            .fail(),
            Some(_) => Ok(()),
        }
    }
}

impl Mutator for OwnerMutator {
    fn mutate(&self, ctx: &Context, target: &mut dyn Reflect) -> mutator::Result {
        let type_name = target.reflect_type_name();
        self.set_controller_reference(ctx, target)
            .context(SetControllerReferenceSnafu { target: type_name })
    }
}

/// Builds a [`Mutator`] that makes `parent` the controller of the object it
/// is applied to.
///
/// The kind of `parent` is looked up in `registry`. The mutator appends a
/// controller owner reference (with `blockOwnerDeletion` set) or updates the
/// existing reference to `parent` in place. Other owner references are kept.
/// Applying it to an object that is already controlled by someone else fails
/// with [`Error::AlreadyOwned`] and leaves the object untouched.
pub fn make_owner_mutator<R, P>(registry: &R, parent: &P) -> OwnerMutator
where
    R: KindRegistry + ?Sized,
    P: Resource + Any,
{
    OwnerMutator {
        owner: Owner {
            type_name: type_name::<P>(),
            gvk: registry.kind_of(TypeId::of::<P>()),
            name: parent.meta().name.clone(),
            uid: parent.uid(),
            namespace: parent.namespace().filter(|ns| !ns.is_empty()),
        },
    }
}

fn object_meta_mut(target: &mut dyn Reflect) -> Option<&mut ObjectMeta> {
    reflect::resolve_path(target, &["metadata"])?
        .as_any_mut()
        .downcast_mut::<ObjectMeta>()
}

fn is_controller(reference: &OwnerReference) -> bool {
    reference.controller == Some(true)
}

/// Two references point to the same object if group, kind and name match,
/// regardless of the API version.
fn refers_to_same_object(a: &OwnerReference, b: &OwnerReference) -> bool {
    api_group(&a.api_version) == api_group(&b.api_version) && a.kind == b.kind && a.name == b.name
}

fn api_group(api_version: &str) -> &str {
    api_version
        .rsplit_once('/')
        .map_or("", |(group, _version)| group)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
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
    use rstest::rstest;

    use super::*;
    use crate::scheme::Scheme;

    const OWNER_NAME: &str = "unesco";
    const OWNER_UID: &str = "775665789";

    fn owner() -> Namespace {
        Namespace {
            metadata: ObjectMeta {
                name: Some(OWNER_NAME.to_owned()),
                uid: Some(OWNER_UID.to_owned()),
                ..ObjectMeta::default()
            },
            ..Namespace::default()
        }
    }

    fn owner_mutator() -> OwnerMutator {
        make_owner_mutator(&Scheme::with_builtin_kinds(), &owner())
    }

    fn expected_reference() -> OwnerReference {
        OwnerReference {
            api_version: "v1".to_owned(),
            kind: "Namespace".to_owned(),
            name: OWNER_NAME.to_owned(),
            uid: OWNER_UID.to_owned(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }
    }

    fn reference(name: &str, uid: &str, controller: bool) -> OwnerReference {
        OwnerReference {
            api_version: "v1".to_owned(),
            kind: "Namespace".to_owned(),
            name: name.to_owned(),
            uid: uid.to_owned(),
            controller: Some(controller),
            block_owner_deletion: None,
        }
    }

    fn secret_owned_by(references: Option<Vec<OwnerReference>>) -> Secret {
        Secret {
            metadata: ObjectMeta {
                name: Some("harbor-core".to_owned()),
                namespace: Some("default".to_owned()),
                owner_references: references,
                ..ObjectMeta::default()
            },
            ..Secret::default()
        }
    }

    fn unwrap_owner_error(err: mutator::Error) -> Error {
        match err {
            mutator::Error::SetControllerReference { source, .. } => Some(source),
            mutator::Error::Mutate { .. } => None,
        }
        .expect("owner mutator only fails to set controller references")
    }

    #[rstest]
    #[case::without_owners(None)]
    #[case::with_empty_owners(Some(Vec::new()))]
    fn adds_the_controller_reference(#[case] references: Option<Vec<OwnerReference>>) {
        let mut secret = secret_owned_by(references);

        owner_mutator()
            .mutate(&Context::new(), &mut secret)
            .expect("secret has no controller yet");

        assert_eq!(
            secret.metadata.owner_references,
            Some(vec![expected_reference()])
        );
    }

    #[test]
    fn keeps_owners_that_are_not_controllers() {
        let existing = reference("owner", "the-uid", false);
        let mut secret = secret_owned_by(Some(vec![existing.clone()]));

        owner_mutator()
            .mutate(&Context::new(), &mut secret)
            .expect("non-controller owners do not conflict");

        assert_eq!(
            secret.metadata.owner_references,
            Some(vec![existing, expected_reference()])
        );
    }

    #[test]
    fn fails_if_another_controller_owns_the_object() {
        let mut secret = secret_owned_by(Some(vec![reference("owner", "the-uid", true)]));
        let before = secret.clone();

        let err = owner_mutator()
            .mutate(&Context::new(), &mut secret)
            .expect_err("object already has a controller");

        assert_eq!(unwrap_owner_error(err), Error::AlreadyOwned {
            kind: "Namespace".to_owned(),
            name: "owner".to_owned(),
            owner_kind: "Namespace".to_owned(),
            owner_name: OWNER_NAME.to_owned(),
        });
        assert_eq!(secret, before);
    }

    #[test]
    fn same_controller_is_kept_once() {
        let mut secret = secret_owned_by(Some(vec![reference(OWNER_NAME, OWNER_UID, true)]));

        let mutator = owner_mutator();
        mutator
            .mutate(&Context::new(), &mut secret)
            .expect("the owner already is the controller");
        mutator
            .mutate(&Context::new(), &mut secret)
            .expect("applying twice is fine");

        assert_eq!(
            secret.metadata.owner_references,
            Some(vec![expected_reference()])
        );
    }

    #[test]
    fn promotes_an_existing_reference_to_controller() {
        let other = reference("other", "other-uid", false);
        let mut secret = secret_owned_by(Some(vec![
            reference(OWNER_NAME, OWNER_UID, false),
            other.clone(),
        ]));

        owner_mutator()
            .mutate(&Context::new(), &mut secret)
            .expect("no controller yet");

        assert_eq!(
            secret.metadata.owner_references,
            Some(vec![expected_reference(), other])
        );
    }

    #[test]
    fn objects_without_metadata_are_rejected() {
        #[derive(Debug, Default, PartialEq, Eq, crate::reflect::Reflect)]
        #[reflect(path_overrides(mutation = "crate"))]
        struct Settings {
            metadata: Option<String>,
        }

        let mut settings = Settings::default();
        let err = owner_mutator()
            .mutate(&Context::new(), &mut settings)
            .expect_err("settings are not a Kubernetes object");

        assert!(matches!(
            unwrap_owner_error(err),
            Error::WrongResourceKind { type_name } if type_name.ends_with("Settings")
        ));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn unregistered_owners_are_rejected() {
        let mut secret = secret_owned_by(None);

        let err = make_owner_mutator(&Scheme::new(), &owner())
            .mutate(&Context::new(), &mut secret)
            .expect_err("owner kind is unknown");

        assert!(matches!(
            unwrap_owner_error(err),
            Error::UnregisteredKind { .. }
        ));
        assert_eq!(secret, secret_owned_by(None));
    }

    #[test]
    fn owners_need_name_and_uid() {
        let mut secret = secret_owned_by(None);
        let mut owner = owner();
        owner.metadata.uid = None;

        let err = make_owner_mutator(&Scheme::with_builtin_kinds(), &owner)
            .mutate(&Context::new(), &mut secret)
            .expect_err("owner has no uid");

        assert_eq!(unwrap_owner_error(err), Error::IncompleteOwner {
            kind: "Namespace".to_owned()
        });
    }

    #[rstest]
    #[case::cluster_scoped_child(None, Error::ClusterScopedChild {
        owner_namespace: "harbor".to_owned(),
    })]
    #[case::other_namespace(Some("default"), Error::CrossNamespaceOwner {
        owner_namespace: "harbor".to_owned(),
        namespace: "default".to_owned(),
    })]
    fn namespaced_owners_only_own_objects_in_their_namespace(
        #[case] namespace: Option<&str>,
        #[case] expected: Error,
    ) {
        let owner = ConfigMap {
            metadata: ObjectMeta {
                name: Some("harbor-config".to_owned()),
                namespace: Some("harbor".to_owned()),
                uid: Some("c85bfb53".to_owned()),
                ..ObjectMeta::default()
            },
            ..ConfigMap::default()
        };
        let mut secret = secret_owned_by(None);
        secret.metadata.namespace = namespace.map(ToOwned::to_owned);

        let err = make_owner_mutator(&Scheme::with_builtin_kinds(), &owner)
            .mutate(&Context::new(), &mut secret)
            .expect_err("namespaces do not line up");

        assert_eq!(unwrap_owner_error(err), expected);
        assert_eq!(secret.metadata.owner_references, None);
    }

    #[test]
    fn namespaced_owners_own_objects_in_their_namespace() {
        let owner = ConfigMap {
            metadata: ObjectMeta {
                name: Some("harbor-config".to_owned()),
                namespace: Some("default".to_owned()),
                uid: Some("c85bfb53".to_owned()),
                ..ObjectMeta::default()
            },
            ..ConfigMap::default()
        };
        let mut secret = secret_owned_by(None);

        make_owner_mutator(&Scheme::with_builtin_kinds(), &owner)
            .mutate(&Context::new(), &mut secret)
            .expect("namespaces match");

        let references = secret.metadata.owner_references.expect("owner was added");
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].kind, "ConfigMap");
        assert_eq!(references[0].name, "harbor-config");
    }

    #[test]
    fn owns_persistent_volume_claims() {
        let mut pvc: PersistentVolumeClaim = serde_yaml::from_str(indoc! {"
            apiVersion: v1
            kind: PersistentVolumeClaim
            metadata:
              name: harbor-registry
              namespace: default
            spec:
              accessModes:
                - ReadWriteOnce
              resources:
                requests:
                  storage: 5Gi
        "})
        .expect("test YAML is valid");
        let spec = pvc.spec.clone();

        owner_mutator()
            .mutate(&Context::new(), &mut pvc)
            .expect("claim has no controller yet");

        assert_eq!(pvc.metadata.owner_references, Some(vec![expected_reference()]));
        assert_eq!(pvc.spec, spec);
    }

    #[test]
    fn owns_service_accounts() {
        let mut service_account = ServiceAccount {
            metadata: ObjectMeta {
                name: Some("harbor".to_owned()),
                namespace: Some("default".to_owned()),
                owner_references: Some(vec![reference("owner", "the-uid", false)]),
                ..ObjectMeta::default()
            },
            automount_service_account_token: Some(false),
            ..ServiceAccount::default()
        };

        owner_mutator()
            .mutate(&Context::new(), &mut service_account)
            .expect("service account has no controller yet");

        assert_eq!(
            service_account.metadata.owner_references,
            Some(vec![
                reference("owner", "the-uid", false),
                expected_reference()
            ])
        );
    }

    fn owner_references_after_mutation<K>() -> Option<Vec<OwnerReference>>
    where
        K: Reflect + Resource + Default,
    {
        let mut object = K::default();
        owner_mutator()
            .mutate(&Context::new(), &mut object)
            .expect("fresh objects have no controller");
        object.meta().owner_references.clone()
    }

    macro_rules! assert_owned {
        ($($kind:ty),* $(,)?) => {
            $(
                assert_eq!(
                    owner_references_after_mutation::<$kind>(),
                    Some(vec![expected_reference()]),
                    "owner references of {}",
                    stringify!($kind)
                );
            )*
        };
    }

    #[test]
    fn every_builtin_kind_can_be_owned() {
        assert_owned!(
            ConfigMap,
            CronJob,
            DaemonSet,
            Deployment,
            Ingress,
            Job,
            Namespace,
            PersistentVolumeClaim,
            Pod,
            PodDisruptionBudget,
            ReplicaSet,
            Role,
            RoleBinding,
            Secret,
            Service,
            ServiceAccount,
            StatefulSet,
        );
    }

    #[test]
    fn cancelled_context_leaves_the_object_untouched() {
        let ctx = Context::new();
        ctx.cancel();
        let mut secret = secret_owned_by(None);

        let err = owner_mutator()
            .mutate(&ctx, &mut secret)
            .expect_err("context is cancelled");

        assert_eq!(unwrap_owner_error(err), Error::Cancelled);
        assert_eq!(secret, secret_owned_by(None));
    }

    #[rstest]
    #[case("v1", "")]
    #[case("apps/v1", "apps")]
    #[case("goharbor.io/v1beta1", "goharbor.io")]
    fn api_groups(#[case] api_version: &str, #[case] group: &str) {
        assert_eq!(api_group(api_version), group);
    }

    #[test]
    fn references_ignore_the_api_version() {
        let mut v1beta1 = reference(OWNER_NAME, OWNER_UID, true);
        v1beta1.api_version = "goharbor.io/v1beta1".to_owned();
        let mut v1 = v1beta1.clone();
        v1.api_version = "goharbor.io/v1".to_owned();

        assert!(refers_to_same_object(&v1beta1, &v1));
    }
}
