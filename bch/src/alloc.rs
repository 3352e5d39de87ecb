//! Allocation seam used by [crate::Bch] for all of its tables.

use crate::Error;
use std::{
    fmt,
    ops::{Deref, DerefMut},
};

/// Source of the word buffers a handle needs.
///
/// Implementations may refuse any request by returning `None`. Every block handed out is
/// eventually passed back to [Allocator::free] exactly once.
pub trait Allocator {
    /// Allocate `words` words with unspecified contents.
    fn malloc(&self, words: usize) -> Option<Vec<u32>>;

    /// Allocate `words` zeroed words.
    fn calloc(&self, words: usize) -> Option<Vec<u32>>;

    /// Return a block. Freeing `None` is a no-op.
    fn free(&self, block: Option<Vec<u32>>);
}

impl<T: Allocator + ?Sized> Allocator for &T {
    fn malloc(&self, words: usize) -> Option<Vec<u32>> {
        (**self).malloc(words)
    }

    fn calloc(&self, words: usize) -> Option<Vec<u32>> {
        (**self).calloc(words)
    }

    fn free(&self, block: Option<Vec<u32>>) {
        (**self).free(block)
    }
}

/// The global allocator. Never fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct System;

impl Allocator for System {
    fn malloc(&self, words: usize) -> Option<Vec<u32>> {
        Some(vec![0; words])
    }

    fn calloc(&self, words: usize) -> Option<Vec<u32>> {
        Some(vec![0; words])
    }

    fn free(&self, _block: Option<Vec<u32>>) {}
}

/// A block of words owned on behalf of an [Allocator], returned to it on drop.
pub struct Block<A: Allocator> {
    words: Vec<u32>,
    alloc: A,
}

impl<A: Allocator + Clone> Block<A> {
    pub(crate) fn malloc(alloc: &A, words: usize) -> Result<Self, Error> {
        let words = alloc.malloc(words).ok_or(Error::OutOfMemory)?;
        Ok(Self {
            words,
            alloc: alloc.clone(),
        })
    }

    pub(crate) fn calloc(alloc: &A, words: usize) -> Result<Self, Error> {
        let words = alloc.calloc(words).ok_or(Error::OutOfMemory)?;
        Ok(Self {
            words,
            alloc: alloc.clone(),
        })
    }
}

impl<A: Allocator> Deref for Block<A> {
    type Target = [u32];

    fn deref(&self) -> &Self::Target {
        &self.words
    }
}

impl<A: Allocator> DerefMut for Block<A> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.words
    }
}

impl<A: Allocator> fmt::Debug for Block<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("words", &self.words.len())
            .finish()
    }
}

impl<A: Allocator> Drop for Block<A> {
    fn drop(&mut self) {
        self.alloc.free(Some(std::mem::take(&mut self.words)));
    }
}
