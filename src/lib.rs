#![forbid(unsafe_code)]
//! A lazy, single-threaded task-graph evaluator.
//!
//! A [`Scheduler`] holds units of work ("tasks"), some of which consume the
//! not-yet-computed results of other tasks. Nothing runs at registration.
//! When a result is demanded, the scheduler executes exactly the tasks it
//! transitively depends on, each at most once, and memoizes every value.
//!
//! ## Core abstractions
//!
//! * [`TaskId`]: an opaque, monotonically issued identifier of a task.
//! * [`Handle<T>`]: a lightweight token representing the *future* result of a
//!   task. Binding it as an argument wires a dependency between two tasks.
//! * [`Arguments`]: implemented for `()`, single arguments, tuples and
//!   `Vec`s, where each slot is an immediate value or a handle. It replaces a
//!   hand-written overload per arity and immediate/future position.
//!
//! ## Phantom handles
//!
//! Under the hood, the task collection is type-erased and stores every output
//! as `Box<dyn Any>`. A `Handle<T>` carries no data but holds the type `T` in
//! `PhantomData`, so the compiler enforces that a task receives exactly the
//! type it asks for. At runtime every retrieval is checked against the
//! output type the task was registered with, and a mismatch is reported as
//! [`SchedulerError::TypeMismatch`] instead of reading a value through the
//! wrong type.
//!
//! ## Example
//!
//! ```rust
//! use lazydag::Scheduler;
//!
//! let mut scheduler = Scheduler::new();
//!
//! let text = scheduler.add(|| String::from("7"), ());
//! let number = scheduler.try_add(
//!     |t: String| -> anyhow::Result<i32> { Ok(t.parse()?) },
//!     scheduler.future_result::<String>(text),
//! );
//! let product = scheduler.add(
//!     |v: i32, k: f64| v as f64 * k,
//!     (scheduler.future_result::<i32>(number), 2.5f64),
//! );
//!
//! assert_eq!(scheduler.get_result::<f64>(product).unwrap(), 17.5);
//! ```

mod core;
mod diagnostics;
mod engine;
mod error;
mod graph;
mod scheduler;
mod utils;

pub use crate::core::TaskId;
pub use crate::diagnostics::{Diagnostics, TaskExecution};
pub use crate::engine::{Argument, Arguments, Callable, Deferred, Handle, value};
pub use crate::error::SchedulerError;
pub use crate::scheduler::{Scheduler, TaskDef};
#[cfg(feature = "logging")]
pub use crate::utils::init_logging;
