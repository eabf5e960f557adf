use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use snafu::Snafu;

use crate::{owner, reflect::Reflect};

pub type Result<T = (), E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("failed to set controller reference on {target}"))]
    SetControllerReference {
        source: owner::Error,
        target: &'static str,
    },

    #[snafu(display("failed to mutate {target}"))]
    Mutate {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        target: &'static str,
    },
}

/// Carried through every [`Mutator`] call.
///
/// Mutators that only edit memory ignore it. Mutators that talk to other
/// systems should stop before touching the target once [`Context::is_cancelled`]
/// returns `true`. Clones share the same cancellation state.
#[derive(Clone, Debug, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// An in-place edit of a target object.
///
/// A single mutator that returns an error must leave the target unchanged.
/// This does not extend to a [`MutatorChain`], see there.
///
/// Any `Fn(&Context, &mut dyn Reflect) -> Result` closure is a [`Mutator`],
/// see [`from_fn`] for help with type inference.
pub trait Mutator: Send + Sync {
    fn mutate(&self, ctx: &Context, target: &mut dyn Reflect) -> Result;
}

impl<F> Mutator for F
where
    F: Fn(&Context, &mut dyn Reflect) -> Result + Send + Sync,
{
    fn mutate(&self, ctx: &Context, target: &mut dyn Reflect) -> Result {
        self(ctx, target)
    }
}

/// Pins down the closure signature so that it can be used as a [`Mutator`].
pub fn from_fn<F>(f: F) -> F
where
    F: Fn(&Context, &mut dyn Reflect) -> Result + Send + Sync,
{
    f
}

/// An ordered list of [`Mutator`]s, which is a [`Mutator`] itself.
///
/// Mutators run in the order they were added. The first error stops the chain
/// and is returned as is. Edits made by earlier mutators are not rolled back,
/// so a failed chain can leave the target partially mutated. Add mutators that
/// can fail (such as the owner mutator) first to avoid that.
#[derive(Default)]
pub struct MutatorChain {
    mutators: Vec<Box<dyn Mutator>>,
}

impl fmt::Debug for MutatorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutatorChain")
            .field("len", &self.mutators.len())
            .finish()
    }
}

impl MutatorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, mutator: impl Mutator + 'static) -> Self {
        self.push(mutator);
        self
    }

    pub fn push(&mut self, mutator: impl Mutator + 'static) -> &mut Self {
        self.mutators.push(Box::new(mutator));
        self
    }

    pub fn len(&self) -> usize {
        self.mutators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutators.is_empty()
    }
}

impl Mutator for MutatorChain {
    fn mutate(&self, ctx: &Context, target: &mut dyn Reflect) -> Result {
        self.mutators
            .iter()
            .try_for_each(|mutator| mutator.mutate(ctx, &mut *target))
    }
}
