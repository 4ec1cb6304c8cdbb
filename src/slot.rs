//! Caller-owned output slots for [`query`](crate::query) and
//! [`handle`](crate::handle).

use std::cell::RefCell;
use std::rc::Rc;

use rusqlite::types::FromSql;
use rusqlite::Row;

use crate::Result;

/// A shared mutable cell a query scans column values into.
///
/// Slots are the Rust rendition of scan out-pointers: the caller keeps one
/// handle, passes [`Slot::out`] as a scan destination, and reads the value
/// back after the expression has run. Cloning a slot clones the handle, not
/// the value, so an expression and its caller observe the same cell.
///
/// ## Example
///
/// ```rust
/// use sqlkat::{query, values, Slot};
///
/// # fn main() -> sqlkat::Result<()> {
/// let conn = sqlkat::rusqlite::Connection::open_in_memory()?;
/// let answer = Slot::new(0i64);
/// assert!(query("SELECT 6 * 7", values![])
///     .scan([answer.out()])
///     .apply(&conn));
/// assert_eq!(answer.get(), 42);
/// # Ok(())
/// # }
/// ```
pub struct Slot<T>(Rc<RefCell<T>>);

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Slot(self.0.clone())
    }
}

impl<T> Slot<T> {
    /// Create a slot holding `initial`. A scan that finds no row leaves the
    /// slot untouched, so the initial value doubles as the "not found"
    /// marker.
    pub fn new(initial: T) -> Slot<T> {
        Slot(Rc::new(RefCell::new(initial)))
    }

    /// Overwrite the slot's value.
    pub fn set(&self, value: T) {
        *self.0.borrow_mut() = value;
    }

    /// Read the slot's current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.borrow().clone()
    }
}

impl<T: FromSql + 'static> Slot<T> {
    /// Type-erase the slot for a scan destination list.
    pub fn out(&self) -> Box<dyn ScanSlot> {
        Box::new(self.clone())
    }
}

/// One scan destination: stores column `idx` of a row, converting to the
/// destination's type.
pub trait ScanSlot {
    /// Store column `idx` of `row` into the destination.
    fn read(&self, row: &Row<'_>, idx: usize) -> Result<()>;
}

impl<T: FromSql> ScanSlot for Slot<T> {
    fn read(&self, row: &Row<'_>, idx: usize) -> Result<()> {
        *self.0.borrow_mut() = row.get(idx)?;
        Ok(())
    }
}
