use std::any::Any;
use std::fmt::{Display, Formatter};

/// A type-erased container for a task's memoized output.
pub(crate) type Dynamic = Box<dyn Any>;

/// An opaque handle naming a task within one [`Scheduler`](crate::Scheduler).
///
/// Identifiers are issued in strictly increasing order starting at `0` and
/// are never reassigned while the scheduler lives. The only exception is
/// [`Scheduler::clear`](crate::Scheduler::clear), which starts a new epoch
/// from `0` again; identifiers and [`Handle`](crate::Handle)s captured before
/// a `clear` must not be used afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub(crate) usize);

impl TaskId {
    /// Returns the position of the task in the scheduler's collection.
    pub fn index(&self) -> usize {
        self.0
    }

    /// The identifier issued right after this one. Useful for referencing a
    /// task before it is registered.
    pub fn succ(self) -> TaskId {
        TaskId(self.0 + 1)
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(TaskId(7).to_string(), "#7");
        assert_eq!(TaskId(7).index(), 7);
        assert_eq!(TaskId(7).succ(), TaskId(8));
    }

    #[test]
    fn test_ordering() {
        assert!(TaskId(0) < TaskId(1));
    }
}
