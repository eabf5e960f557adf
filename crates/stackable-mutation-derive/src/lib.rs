use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod defaulter;
mod reflect;
mod utils;

/// Derives `Defaulter`, which collects the fields of a parent object that
/// should be copied into its child objects.
///
/// Fields annotated with `#[defaulter(path = "...")]` are captured together
/// with the comma-separated list of dotted target paths. Every other field is
/// walked recursively, unless it is marked with `#[defaulter(skip)]`.
///
/// ```
/// # use stackable_mutation::overrides::{Defaulter, OverridePlan};
/// use stackable_mutation::k8s_openapi::api::core::v1::{Affinity, LocalObjectReference};
///
/// #[derive(Clone, Default, Defaulter)]
/// struct HarborSpec {
///     #[defaulter(path = "spec.template.spec.affinity")]
///     affinity: Option<Affinity>,
///
///     #[defaulter(path = "imagePullSecrets,spec.template.spec.imagePullSecrets")]
///     image_pull_secrets: Option<Vec<LocalObjectReference>>,
///
///     #[defaulter(skip)]
///     version: String,
/// }
///
/// let plan = OverridePlan::from_parent(&HarborSpec::default());
/// assert_eq!(plan.len(), 3);
/// ```
#[proc_macro_derive(Defaulter, attributes(defaulter))]
pub fn derive_defaulter(input: TokenStream) -> TokenStream {
    defaulter::derive(parse_macro_input!(input as DeriveInput)).into()
}

/// Derives `Reflect` (and `Struct`), which lets mutators look up fields of a
/// target object by their exported (PascalCase) name.
///
/// Fields marked with `#[reflect(skip)]` are not reachable. The exported name
/// can be set explicitly with `#[reflect(rename = "...")]`, which is needed for
/// acronyms: `cluster_ip` is exported as `ClusterIp` by default, but paths
/// written as `clusterIP` look for `ClusterIP`.
///
/// ```
/// # use stackable_mutation::reflect::{Reflect, Struct};
/// #[derive(Default, Reflect)]
/// struct Settings {
///     log_level: Option<String>,
///     #[reflect(skip)]
///     secret: String,
/// }
///
/// let mut settings = Settings::default();
/// assert_eq!(settings.field_names(), &["LogLevel"]);
/// assert!(settings.field_mut("LogLevel").is_some());
/// assert!(settings.field_mut("Secret").is_none());
/// ```
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    reflect::derive(parse_macro_input!(input as DeriveInput)).into()
}
