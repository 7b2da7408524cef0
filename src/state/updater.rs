//! Update functions
//!
//! An updater maps the previous value of a key (if any) to its next value.
//! It must be pure: the state map decides whether to invoke it at all, and
//! relies on that decision alone for exactly-once application.

use std::marker::PhantomData;
use std::ops::Add;
use std::sync::Arc;

/// Computes the next value of a key from its previous value.
pub trait ValueUpdater<T> {
    fn update(&self, previous: Option<&T>) -> T;
}

impl<T, U: ValueUpdater<T> + ?Sized> ValueUpdater<T> for &U {
    fn update(&self, previous: Option<&T>) -> T {
        (**self).update(previous)
    }
}

impl<T, U: ValueUpdater<T> + ?Sized> ValueUpdater<T> for Box<U> {
    fn update(&self, previous: Option<&T>) -> T {
        (**self).update(previous)
    }
}

impl<T, U: ValueUpdater<T> + ?Sized> ValueUpdater<T> for Arc<U> {
    fn update(&self, previous: Option<&T>) -> T {
        (**self).update(previous)
    }
}

/// Updater backed by a closure.
#[derive(Clone, Copy)]
pub struct FnUpdater<F>(F);

impl<T, F> ValueUpdater<T> for FnUpdater<F>
where
    F: Fn(Option<&T>) -> T,
{
    fn update(&self, previous: Option<&T>) -> T {
        (self.0)(previous)
    }
}

/// Wrap a closure as a [`ValueUpdater`].
pub fn updater_fn<T, F>(f: F) -> FnUpdater<F>
where
    F: Fn(Option<&T>) -> T,
{
    FnUpdater(f)
}

/// Ignores the previous value and stores its argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceUpdater<T>(pub T);

impl<T: Clone> ValueUpdater<T> for ReplaceUpdater<T> {
    fn update(&self, _previous: Option<&T>) -> T {
        self.0.clone()
    }
}

/// Associative merge of two values of the same type.
pub trait Combiner<T> {
    fn combine(&self, stored: &T, incoming: &T) -> T;
}

/// Adds values together.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sum;

impl<T> Combiner<T> for Sum
where
    T: Copy + Add<Output = T>,
{
    fn combine(&self, stored: &T, incoming: &T) -> T {
        *stored + *incoming
    }
}

/// Counts occurrences; the incoming value is the number seen in this batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct Count;

impl Combiner<u64> for Count {
    fn combine(&self, stored: &u64, incoming: &u64) -> u64 {
        stored.saturating_add(*incoming)
    }
}

/// Combines the stored value with a batch-local partial result.
///
/// With no stored value the partial result is stored as is.
#[derive(Debug, Clone)]
pub struct CombinerUpdater<C, T> {
    combiner: C,
    arg: T,
    _marker: PhantomData<fn(&T)>,
}

impl<C, T> CombinerUpdater<C, T> {
    pub fn new(combiner: C, arg: T) -> Self {
        Self {
            combiner,
            arg,
            _marker: PhantomData,
        }
    }
}

impl<C, T> ValueUpdater<T> for CombinerUpdater<C, T>
where
    C: Combiner<T>,
    T: Clone,
{
    fn update(&self, previous: Option<&T>) -> T {
        match previous {
            None => self.arg.clone(),
            Some(stored) => self.combiner.combine(stored, &self.arg),
        }
    }
}
