//! Tools that we could imagine being in the Rust standard library, but aren't.

use core::marker::PhantomData;

// -------------------------------------------------------------------------------------------------

mod custom_format;
pub use custom_format::*;

// -------------------------------------------------------------------------------------------------

/// Equivalent of [`Iterator::map`] but applied to an [`Extend`] instead, transforming
/// the incoming elements. Backs [`crate::math::lines::colorize()`].
#[doc(hidden)] // pub to be used by umbra2d
#[derive(Debug)]
pub struct MapExtend<'a, A, B, T, F>
where
    T: Extend<B>,
    F: Fn(A) -> B,
{
    target: &'a mut T,
    function: F,
    _input: PhantomData<fn(A)>,
}

impl<'a, A, B, T, F> MapExtend<'a, A, B, T, F>
where
    T: Extend<B>,
    F: Fn(A) -> B,
{
    #[inline]
    pub fn new(target: &'a mut T, function: F) -> Self {
        Self {
            target,
            function,
            _input: PhantomData,
        }
    }
}

impl<A, B, T, F> Extend<A> for MapExtend<'_, A, B, T, F>
where
    T: Extend<B>,
    F: Fn(A) -> B,
{
    #[inline]
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = A>,
    {
        self.target.extend(iter.into_iter().map(&self.function));
    }
}
