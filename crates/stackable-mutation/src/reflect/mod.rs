//! Just enough runtime type information to walk a target object by field name.
//!
//! Every value that a mutator can visit implements [`Reflect`], which tells
//! the walker what kind of value it is looking at:
//!
//! - a *pointer* ([`Option`], [`Box`]), which is followed if it is present,
//! - a *struct*, whose fields can be looked up by their exported name, or
//! - an opaque *value* (numbers, strings, collections, and all Kubernetes types
//!   without a [`Struct`] implementation), which ends the walk.
//!
//! Structs implement [`Struct`] through `#[derive(Reflect)]`. The exported name
//! of a field is its identifier in PascalCase, so `image_pull_secrets` is
//! looked up as `ImagePullSecrets`. Acronyms need an explicit
//! `#[reflect(rename = "ClusterIP")]` to be found by their serialized name.
//!
//! Assignments go through [`Reflect::as_any_mut`], so a slot can only ever be
//! overwritten by a value of exactly the same type.
use std::{
    any::Any,
    borrow::Cow,
    collections::{BTreeMap, BTreeSet, HashMap},
};

pub use stackable_mutation_derive::Reflect;

mod k8s;

/// A value that mutators can walk into and assign to.
///
/// Most users derive this, see [the associated derive macro](`derive@Reflect`).
pub trait Reflect: Any {
    /// Tells the walker whether this is a pointer, a struct or an opaque value.
    fn reflect_mut(&mut self) -> ReflectMut<'_>;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn reflect_type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Field access on structs, by exported field name.
pub trait Struct {
    /// Looks up a field by its exported (PascalCase) name.
    fn field_mut(&mut self, name: &str) -> Option<&mut dyn Reflect>;

    /// The exported names of all reachable fields, in declaration order.
    fn field_names(&self) -> &'static [&'static str];
}

pub enum ReflectMut<'a> {
    /// The pointee, or [`None`] if nothing is pointed to.
    Pointer(Option<&'a mut dyn Reflect>),
    Struct(&'a mut dyn Struct),
    Value,
}

impl<'a> ReflectMut<'a> {
    /// Follows pointers until reaching a struct or a value.
    ///
    /// Returns [`None`] if one of the pointers is empty.
    pub fn deref_pointers(self) -> Option<Self> {
        let mut current = self;
        loop {
            match current {
                Self::Pointer(Some(pointee)) => current = pointee.reflect_mut(),
                Self::Pointer(None) => return None,
                other => return Some(other),
            }
        }
    }

    pub fn into_struct(self) -> Option<&'a mut dyn Struct> {
        match self.deref_pointers()? {
            Self::Struct(object) => Some(object),
            Self::Pointer(_) | Self::Value => None,
        }
    }
}

/// Walks from `root` along the dotted path `segments`, returning the field the
/// last segment names.
///
/// Each segment is converted to [`initial_capital`] form before the lookup.
/// Pointers are followed on the way, but the returned slot itself is not
/// dereferenced. Returns [`None`] if a pointer along the way is empty, a
/// value on the way is not a struct, or a field does not exist.
pub fn resolve_path<'a, S>(root: &'a mut dyn Reflect, segments: &[S]) -> Option<&'a mut dyn Reflect>
where
    S: AsRef<str>,
{
    let mut cursor = root;
    for segment in segments {
        cursor = cursor
            .reflect_mut()
            .into_struct()?
            .field_mut(&initial_capital(segment.as_ref()))?;
    }
    Some(cursor)
}

/// Upper-cases the first character of a path segment, so that paths can be
/// written in the same camelCase as the serialized objects.
///
/// `imagePullSecrets` becomes `ImagePullSecrets`, everything else about the
/// segment is kept as is.
pub fn initial_capital(segment: &str) -> Cow<'_, str> {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_lowercase() => {
            Cow::Owned(first.to_uppercase().chain(chars).collect())
        }
        _ => Cow::Borrowed(segment),
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Pointer(self.as_mut().map(|pointee| pointee as &mut dyn Reflect))
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Pointer(Some(self.as_mut() as &mut dyn Reflect))
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Implements [`Reflect`] for types that are assigned as a whole, but never
/// walked into.
#[macro_export]
macro_rules! reflect_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::reflect::Reflect for $ty {
                fn reflect_mut(&mut self) -> $crate::reflect::ReflectMut<'_> {
                    $crate::reflect::ReflectMut::Value
                }

                fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                    self
                }
            }
        )*
    };
}

reflect_value!(
    bool, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, char, String,
);

impl<T: 'static> Reflect for Vec<T> {
    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Value
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<T: 'static> Reflect for BTreeSet<T> {
    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Value
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<K: 'static, V: 'static> Reflect for BTreeMap<K, V> {
    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Value
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<K: 'static, V: 'static, S: 'static> Reflect for HashMap<K, V, S> {
    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Value
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[derive(Debug, Default, PartialEq, Eq, Reflect)]
    #[reflect(path_overrides(mutation = "crate"))]
    struct Cluster {
        spec: Option<ClusterSpec>,
        labels: BTreeMap<String, String>,
    }

    #[derive(Debug, Default, PartialEq, Eq, Reflect)]
    #[reflect(path_overrides(mutation = "crate"))]
    struct ClusterSpec {
        replicas: Option<i32>,
        image_pull_policy: String,
        nested: Option<Box<Nested>>,
        #[reflect(skip)]
        internal: u8,
    }

    #[derive(Debug, Default, PartialEq, Eq, Reflect)]
    #[reflect(path_overrides(mutation = "crate"))]
    struct Nested {
        r#type: String,
        #[reflect(rename = "ClusterIP")]
        cluster_ip: Option<String>,
    }

    fn cluster() -> Cluster {
        Cluster {
            spec: Some(ClusterSpec {
                replicas: Some(3),
                nested: Some(Box::new(Nested {
                    r#type: "ClusterIP".to_owned(),
                    ..Nested::default()
                })),
                ..ClusterSpec::default()
            }),
            labels: BTreeMap::new(),
        }
    }

    #[rstest]
    #[case("imagePullSecrets", "ImagePullSecrets")]
    #[case("ImagePullSecrets", "ImagePullSecrets")]
    #[case("spec", "Spec")]
    #[case("", "")]
    #[case("über", "Über")]
    #[case("1st", "1st")]
    fn initial_capital_only_touches_first_character(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(initial_capital(input), expected);
    }

    #[test]
    fn derived_field_names_are_pascal_case() {
        let spec = ClusterSpec::default();
        assert_eq!(spec.field_names(), &["Replicas", "ImagePullPolicy", "Nested"]);
        assert_eq!(Nested::default().field_names(), &["Type", "ClusterIP"]);
    }

    #[test]
    fn renamed_fields_resolve_by_their_explicit_name() {
        let mut cluster = cluster();

        assert!(resolve_path(&mut cluster, &["spec", "nested", "clusterIP"]).is_some());
        assert!(resolve_path(&mut cluster, &["spec", "nested", "clusterIp"]).is_none());
    }

    #[test]
    fn resolves_through_options_and_boxes() {
        let mut cluster = cluster();

        let slot = resolve_path(&mut cluster, &["spec", "nested", "type"])
            .expect("path is reachable");
        let value = slot
            .as_any_mut()
            .downcast_mut::<String>()
            .expect("slot is a String");
        *value = "NodePort".to_owned();

        let nested = cluster.spec.and_then(|spec| spec.nested).expect("nested is set");
        assert_eq!(nested.r#type, "NodePort");
    }

    #[test]
    fn returns_the_slot_without_dereferencing_it() {
        let mut cluster = cluster();

        let slot = resolve_path(&mut cluster, &["spec", "replicas"]).expect("path is reachable");

        assert!(slot.as_any_mut().downcast_mut::<Option<i32>>().is_some());
        assert!(slot.as_any_mut().downcast_mut::<i32>().is_none());
    }

    #[rstest]
    #[case::empty_pointer(&["spec", "nested", "type"])]
    #[case::missing_field(&["spec", "replicaCount"])]
    #[case::skipped_field(&["spec", "internal"])]
    #[case::through_value(&["spec", "replicas", "value"])]
    #[case::through_map(&["labels", "app"])]
    #[case::empty_segment(&["spec", ""])]
    fn unreachable_paths(#[case] segments: &[&str]) {
        let mut cluster = Cluster {
            spec: Some(ClusterSpec::default()),
            ..Cluster::default()
        };

        assert!(resolve_path(&mut cluster, segments).is_none());
    }

    #[test]
    fn empty_path_resolves_to_the_root() {
        let mut cluster = cluster();
        let segments: &[&str] = &[];

        let root = resolve_path(&mut cluster, segments).expect("root is always reachable");

        assert!(root.as_any_mut().downcast_mut::<Cluster>().is_some());
    }

    #[test]
    fn reports_the_concrete_type_name() {
        let mut cluster = cluster();
        let target: &mut dyn Reflect = &mut cluster;

        assert!(target.reflect_type_name().ends_with("Cluster"));
    }
}
