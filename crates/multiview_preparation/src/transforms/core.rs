use anyhow::{Context, Result};
use rand::RngCore;
use std::marker::PhantomData;

/// Defines the core `Transform` trait for composable preprocessing pipelines.
///
/// The `Transform<I, O>` trait represents a stateless operation for
/// converting an input of type `I` to an output of type `O`.
/// Random transforms draw from the caller-provided `rng`, so the caller decides
/// how a pipeline is seeded and the transforms themselves stay immutable.
///
/// Multiple `Transform` steps can be chained together via `.then(...)`
/// to form a single, inlined preprocessing pipeline.
///
/// Note: `then()` works only when:
/// 1. **Types align**: `self: Transform<I, O>`, `next: Transform<O, M>`
/// 2. **Owned**: `Self::Sized` (no trait objects, must be concrete)
/// 3. **Thread-safe**: intermediate and output types must be `Send`
pub trait Transform<I, O>: Send + Sync {
    /// Applies the transformation to the input
    fn apply(&self, input: I, rng: &mut dyn RngCore) -> Result<O>;

    #[inline]
    fn then<T, M>(self, next: T) -> Chain<Self, T, O>
    where
        Self: Sized,
        T: Transform<O, M>,
        O: Send,
        M: Send,
    {
        Chain {
            first: self,
            second: next,
            _marker: PhantomData,
        }
    }
}

/// A chain of two transforms (`A` -> `B`)
/// - `PhantomData<M>` enforces intermediate type alignment.
#[derive(Debug)]
pub struct Chain<A, B, M> {
    first: A,
    second: B,
    _marker: PhantomData<fn() -> M>,
}

impl<A, B, M> Chain<A, B, M> {
    /// Creates a new transform chain.
    /// Use [`Transform::then`] for better ergonomics.
    pub fn new(first: A, second: B) -> Self {
        Self {
            first,
            second,
            _marker: PhantomData,
        }
    }
}

impl<I, M, O, A, B> Transform<I, O> for Chain<A, B, M>
where
    A: Transform<I, M>,
    B: Transform<M, O>,
    M: Send,
{
    fn apply(&self, input: I, rng: &mut dyn RngCore) -> Result<O> {
        self.first
            .apply(input, rng)
            .and_then(|mid| self.second.apply(mid, &mut *rng))
            .with_context(|| {
                format!(
                    "Transform chain failed: {} → {} → {}",
                    std::any::type_name::<A>(),
                    std::any::type_name::<B>(),
                    std::any::type_name::<O>()
                )
            })
    }
}

/// An ordered list of boxed transforms over the same type.
///
/// Unlike [`Chain`], the length and order of a `Compose` are decided at runtime,
/// which is what [`PipelineConfig::build`](crate::config::PipelineConfig::build)
/// produces from a JSON description.
pub struct Compose<T> {
    transforms: Vec<Box<dyn Transform<T, T>>>,
}

impl<T> Compose<T> {
    pub fn new(transforms: Vec<Box<dyn Transform<T, T>>>) -> Self {
        Self { transforms }
    }

    /// Appends a transform at the end of the pipeline.
    pub fn push(mut self, transform: impl Transform<T, T> + 'static) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl<T> Default for Compose<T> {
    fn default() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }
}

impl<T> std::fmt::Debug for Compose<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compose")
            .field("len", &self.transforms.len())
            .finish()
    }
}

impl<T: Send> Transform<T, T> for Compose<T> {
    fn apply(&self, input: T, rng: &mut dyn RngCore) -> Result<T> {
        self.transforms
            .iter()
            .enumerate()
            .try_fold(input, |acc, (idx, transform)| {
                transform
                    .apply(acc, &mut *rng)
                    .with_context(|| format!("Pipeline step {} failed", idx))
            })
    }
}
