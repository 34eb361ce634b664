//! Scratch matrices for transform composition.
//!
//! One pool belongs to one evaluation session. Matrices are checked out behind a
//! guard and go back on the free list when the guard drops, so a frame of
//! evaluation allocates nothing once the pool has warmed up.

use std::cell::{Cell, RefCell};
use std::ops::{Deref, DerefMut};

use crate::math::Matrix4;

#[derive(Debug, Default)]
pub struct MatrixPool {
    free: RefCell<Vec<Box<Matrix4>>>,
    allocated: Cell<usize>,
}

impl MatrixPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool with `capacity` matrices ready to hand out.
    pub fn with_capacity(capacity: usize) -> Self {
        let free = (0..capacity)
            .map(|_| Box::new(Matrix4::identity()))
            .collect();
        Self {
            free: RefCell::new(free),
            allocated: Cell::new(capacity),
        }
    }

    /// Borrow a matrix. Contents are unspecified; callers overwrite them.
    pub fn checkout(&self) -> PooledMatrix<'_> {
        let matrix = match self.free.borrow_mut().pop() {
            Some(m) => m,
            None => {
                let total = self.allocated.get() + 1;
                self.allocated.set(total);
                log::trace!("matrix pool grew to {total}");
                Box::new(Matrix4::identity())
            }
        };
        PooledMatrix {
            pool: self,
            matrix: Some(matrix),
        }
    }

    /// Matrices currently on the free list.
    #[inline]
    pub fn available(&self) -> usize {
        self.free.borrow().len()
    }

    /// Matrices ever created by this pool.
    #[inline]
    pub fn allocated(&self) -> usize {
        self.allocated.get()
    }
}

/// Checked-out matrix, returned to its pool on drop.
#[derive(Debug)]
pub struct PooledMatrix<'a> {
    pool: &'a MatrixPool,
    matrix: Option<Box<Matrix4>>,
}

impl Deref for PooledMatrix<'_> {
    type Target = Matrix4;

    fn deref(&self) -> &Matrix4 {
        self.matrix
            .as_deref()
            .unwrap_or_else(|| unreachable!("pooled matrix used after release"))
    }
}

impl DerefMut for PooledMatrix<'_> {
    fn deref_mut(&mut self) -> &mut Matrix4 {
        self.matrix
            .as_deref_mut()
            .unwrap_or_else(|| unreachable!("pooled matrix used after release"))
    }
}

impl Drop for PooledMatrix<'_> {
    fn drop(&mut self) {
        if let Some(m) = self.matrix.take() {
            self.pool.free.borrow_mut().push(m);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_return_on_drop() {
        let pool = MatrixPool::with_capacity(1);
        {
            let mut a = pool.checkout();
            let b = pool.checkout();
            *a = Matrix4::zeros();
            assert_eq!(a[(0, 0)], 0.0);
            assert_eq!(b.nrows(), 4);
            assert_eq!(pool.available(), 0);
            assert_eq!(pool.allocated(), 2);
        }
        assert_eq!(pool.available(), 2);
        let _c = pool.checkout();
        assert_eq!(pool.allocated(), 2);
    }

    #[test]
    fn live_guards_never_alias() {
        let pool = MatrixPool::new();
        let mut a = pool.checkout();
        let mut b = pool.checkout();
        *a = Matrix4::identity();
        *b = Matrix4::zeros();
        assert_eq!(a[(1, 1)], 1.0);
        assert_eq!(b[(1, 1)], 0.0);
    }
}
