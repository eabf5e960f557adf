//! [`Reflect`] implementations for the Kubernetes objects operators usually
//! produce and own.
//!
//! Every field of these types except the status sub-resource is exposed, as
//! status is owned by the cluster. Fields are exported under the serialized
//! name with the first character upper-cased, so `clusterIP` is found as
//! `ClusterIP`. Nested objects without an implementation here are opaque and
//! can only be assigned as a whole.
use std::any::Any;

use k8s_openapi::{
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
            Affinity, ConfigMap, Namespace, NamespaceSpec, NodeAffinity, PersistentVolumeClaim,
            PersistentVolumeClaimSpec, Pod, PodAffinity, PodAntiAffinity, PodDNSConfig, PodOS,
            PodSecurityContext, PodSpec, PodTemplateSpec, ResourceRequirements, Secret, Service,
            ServiceAccount, ServiceSpec, SessionAffinityConfig, TypedLocalObjectReference,
            TypedObjectReference, VolumeResourceRequirements, WorkloadReference,
        },
        networking::v1::{Ingress, IngressBackend, IngressSpec},
        policy::v1::{PodDisruptionBudget, PodDisruptionBudgetSpec},
        rbac::v1::{Role, RoleBinding, RoleRef},
    },
    apimachinery::pkg::{
        apis::meta::v1::{LabelSelector, ObjectMeta, Time},
        util::intstr::IntOrString,
    },
};
use paste::paste;

use super::{Reflect, ReflectMut, Struct};

/// The exported name of a field, derived from its identifier unless given
/// explicitly (for acronyms such as `clusterIP`).
macro_rules! exported_name {
    ($field:ident) => {
        paste! { stringify!([<$field:camel>]) }
    };
    ($field:ident => $name:literal) => {
        $name
    };
}

macro_rules! reflect_struct {
    ($($ty:ident { $($field:ident $(=> $name:literal)?),* $(,)? })*) => {
        $(
            impl Reflect for $ty {
                fn reflect_mut(&mut self) -> ReflectMut<'_> {
                    ReflectMut::Struct(self)
                }

                fn as_any_mut(&mut self) -> &mut dyn Any {
                    self
                }
            }

            impl Struct for $ty {
                fn field_mut(&mut self, name: &str) -> Option<&mut dyn Reflect> {
                    $(
                        if name == exported_name!($field $(=> $name)?) {
                            return Some(&mut self.$field as &mut dyn Reflect);
                        }
                    )*
                    None
                }

                fn field_names(&self) -> &'static [&'static str] {
                    &[$(exported_name!($field $(=> $name)?)),*]
                }
            }
        )*
    };
}

reflect_struct! {
    ObjectMeta {
        annotations,
        creation_timestamp,
        deletion_grace_period_seconds,
        deletion_timestamp,
        finalizers,
        generate_name,
        generation,
        labels,
        managed_fields,
        name,
        namespace,
        owner_references,
        resource_version,
        self_link,
        uid,
    }

    ConfigMap {
        binary_data,
        data,
        immutable,
        metadata,
    }

    Secret {
        data,
        immutable,
        metadata,
        string_data,
        type_,
    }

    Service {
        metadata,
        spec,
    }

    ServiceSpec {
        allocate_load_balancer_node_ports,
        cluster_ip => "ClusterIP",
        cluster_ips => "ClusterIPs",
        external_ips => "ExternalIPs",
        external_name,
        external_traffic_policy,
        health_check_node_port,
        internal_traffic_policy,
        ip_families,
        ip_family_policy,
        load_balancer_class,
        load_balancer_ip => "LoadBalancerIP",
        load_balancer_source_ranges,
        ports,
        publish_not_ready_addresses,
        selector,
        session_affinity,
        session_affinity_config,
        traffic_distribution,
        type_,
    }

    ServiceAccount {
        automount_service_account_token,
        image_pull_secrets,
        metadata,
        secrets,
    }

    Namespace {
        metadata,
        spec,
    }

    NamespaceSpec {
        finalizers,
    }

    PersistentVolumeClaim {
        metadata,
        spec,
    }

    PersistentVolumeClaimSpec {
        access_modes,
        data_source,
        data_source_ref,
        resources,
        selector,
        storage_class_name,
        volume_attributes_class_name,
        volume_mode,
        volume_name,
    }

    Pod {
        metadata,
        spec,
    }

    PodTemplateSpec {
        metadata,
        spec,
    }

    PodSpec {
        active_deadline_seconds,
        affinity,
        automount_service_account_token,
        containers,
        dns_config,
        dns_policy,
        enable_service_links,
        ephemeral_containers,
        host_aliases,
        host_ipc => "HostIPC",
        host_network,
        host_pid => "HostPID",
        host_users,
        hostname,
        hostname_override,
        image_pull_secrets,
        init_containers,
        node_name,
        node_selector,
        os,
        overhead,
        preemption_policy,
        priority,
        priority_class_name,
        readiness_gates,
        resource_claims,
        resources,
        restart_policy,
        runtime_class_name,
        scheduler_name,
        scheduling_gates,
        security_context,
        service_account,
        service_account_name,
        set_hostname_as_fqdn => "SetHostnameAsFQDN",
        share_process_namespace,
        subdomain,
        termination_grace_period_seconds,
        tolerations,
        topology_spread_constraints,
        volumes,
        workload_ref,
    }

    Affinity {
        node_affinity,
        pod_affinity,
        pod_anti_affinity,
    }

    Deployment {
        metadata,
        spec,
    }

    DeploymentSpec {
        min_ready_seconds,
        paused,
        progress_deadline_seconds,
        replicas,
        revision_history_limit,
        selector,
        strategy,
        template,
    }

    StatefulSet {
        metadata,
        spec,
    }

    StatefulSetSpec {
        min_ready_seconds,
        ordinals,
        persistent_volume_claim_retention_policy,
        pod_management_policy,
        replicas,
        revision_history_limit,
        selector,
        service_name,
        template,
        update_strategy,
        volume_claim_templates,
    }

    DaemonSet {
        metadata,
        spec,
    }

    DaemonSetSpec {
        min_ready_seconds,
        revision_history_limit,
        selector,
        template,
        update_strategy,
    }

    ReplicaSet {
        metadata,
        spec,
    }

    ReplicaSetSpec {
        min_ready_seconds,
        replicas,
        selector,
        template,
    }

    Job {
        metadata,
        spec,
    }

    JobSpec {
        active_deadline_seconds,
        backoff_limit,
        backoff_limit_per_index,
        completion_mode,
        completions,
        managed_by,
        manual_selector,
        max_failed_indexes,
        parallelism,
        pod_failure_policy,
        pod_replacement_policy,
        selector,
        success_policy,
        suspend,
        template,
        ttl_seconds_after_finished,
    }

    CronJob {
        metadata,
        spec,
    }

    CronJobSpec {
        concurrency_policy,
        failed_jobs_history_limit,
        job_template,
        schedule,
        starting_deadline_seconds,
        successful_jobs_history_limit,
        suspend,
        time_zone,
    }

    JobTemplateSpec {
        metadata,
        spec,
    }

    PodDisruptionBudget {
        metadata,
        spec,
    }

    PodDisruptionBudgetSpec {
        max_unavailable,
        min_available,
        selector,
        unhealthy_pod_eviction_policy,
    }

    Ingress {
        metadata,
        spec,
    }

    IngressSpec {
        default_backend,
        ingress_class_name,
        rules,
        tls,
    }

    Role {
        metadata,
        rules,
    }

    RoleBinding {
        metadata,
        role_ref,
        subjects,
    }
}

crate::reflect_value!(
    DaemonSetUpdateStrategy,
    DeploymentStrategy,
    IngressBackend,
    IntOrString,
    LabelSelector,
    NodeAffinity,
    PodAffinity,
    PodAntiAffinity,
    PodDNSConfig,
    PodFailurePolicy,
    PodOS,
    PodSecurityContext,
    ResourceRequirements,
    RoleRef,
    SessionAffinityConfig,
    StatefulSetOrdinals,
    StatefulSetPersistentVolumeClaimRetentionPolicy,
    StatefulSetUpdateStrategy,
    SuccessPolicy,
    Time,
    TypedLocalObjectReference,
    TypedObjectReference,
    VolumeResourceRequirements,
    WorkloadReference,
);
