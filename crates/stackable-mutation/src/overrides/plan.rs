use std::{any::type_name, fmt};

use tracing::{debug, trace};

use crate::{
    overrides::Defaulter,
    reflect::{self, Reflect},
};

/// A dotted target path, such as `spec.template.spec.affinity`.
///
/// Segments are kept exactly as written, including empty ones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetPath {
    segments: Vec<String>,
}

impl TargetPath {
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path.split('.').map(ToOwned::to_owned).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for TargetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// The outcome of offering a captured value to a target slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Assignment {
    Applied,
    /// The slot already holds a non-default value.
    Occupied,
    /// The slot is declared with a different type than the captured value.
    TypeMismatch,
}

trait CapturedValue: Send + Sync {
    fn assign_if_default(&self, slot: &mut dyn Reflect) -> Assignment;

    fn type_name(&self) -> &'static str;
}

struct Captured<T>(T);

impl<T> CapturedValue for Captured<T>
where
    T: Clone + Default + PartialEq + Send + Sync + 'static,
{
    fn assign_if_default(&self, slot: &mut dyn Reflect) -> Assignment {
        let Some(slot) = slot.as_any_mut().downcast_mut::<T>() else {
            return Assignment::TypeMismatch;
        };
        if *slot != T::default() {
            return Assignment::Occupied;
        }
        slot.clone_from(&self.0);
        Assignment::Applied
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// A single value harvested from a parent, together with the path it should
/// be copied to.
pub struct OverrideEntry {
    path: TargetPath,
    value: Box<dyn CapturedValue>,
}

impl fmt::Debug for OverrideEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideEntry")
            .field("path", &self.path)
            .field("value_type", &self.value.type_name())
            .finish()
    }
}

impl OverrideEntry {
    pub fn path(&self) -> &TargetPath {
        &self.path
    }

    /// The declared type of the captured value, which the target slot must
    /// match exactly.
    pub fn value_type(&self) -> &'static str {
        self.value.type_name()
    }

    /// Copies the captured value into the slot at [`Self::path`], if the slot
    /// is reachable, has the same type, and still holds its default value.
    ///
    /// Returns [`None`] if the path is not reachable in `target`.
    pub fn apply(&self, target: &mut dyn Reflect) -> Option<Assignment> {
        let slot = reflect::resolve_path(target, self.path.segments())?;
        Some(self.value.assign_if_default(slot))
    }
}

/// The ordered list of values harvested from a parent.
///
/// Entries are kept in the order the annotated fields were discovered. When
/// several entries target the same path, the first one wins, since every
/// later entry finds the slot occupied.
#[derive(Debug, Default)]
pub struct OverridePlan {
    entries: Vec<OverrideEntry>,
}

impl OverridePlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Harvests all annotated fields of `parent`.
    pub fn from_parent<P>(parent: &P) -> Self
    where
        P: Defaulter + ?Sized,
    {
        let mut plan = Self::new();
        parent.collect_defaults(&mut plan);
        plan
    }

    /// Captures a clone of `value` once for every path in the comma-separated
    /// `paths`.
    ///
    /// This is what `#[defaulter(path = "...")]` expands to.
    pub fn capture<T>(&mut self, paths: &str, value: &T)
    where
        T: Clone + Default + PartialEq + Send + Sync + 'static,
    {
        for path in paths.split(',') {
            self.entries.push(OverrideEntry {
                path: TargetPath::parse(path),
                value: Box::new(Captured(value.clone())),
            });
        }
    }

    pub fn entries(&self) -> &[OverrideEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies all entries to `target` in order, returning how many slots were
    /// written.
    ///
    /// Entries whose path is not reachable, whose slot is already set, or
    /// whose slot has a different type are skipped.
    pub fn apply(&self, target: &mut dyn Reflect) -> usize {
        let mut applied = 0;
        for entry in &self.entries {
            match entry.apply(&mut *target) {
                Some(Assignment::Applied) => {
                    debug!(
                        path = %entry.path,
                        value_type = entry.value_type(),
                        "applied override"
                    );
                    applied += 1;
                }
                Some(Assignment::Occupied) => {
                    trace!(path = %entry.path, "target slot is already set, skipping override");
                }
                Some(Assignment::TypeMismatch) => {
                    trace!(
                        path = %entry.path,
                        value_type = entry.value_type(),
                        "target slot has a different type, skipping override"
                    );
                }
                None => {
                    trace!(path = %entry.path, "target path is not reachable, skipping override");
                }
            }
        }
        applied
    }
}
