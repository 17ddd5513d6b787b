//! User-facing future/promise/packaged-task types, deferred-launch
//! wiring, and the `then`/`when_all`/`when_any` composition adaptors,
//! all built on the operation-state machine in `task_state`.

mod compat;
mod deferred;
mod future;
mod launch;
mod packaged_task;
mod panic_guard;
mod promise;
mod ready;
mod then;
mod when_all;
mod when_any;

pub use compat::CompatFuture;
pub use deferred::{make_deferred_future, make_fallible_deferred_future, LaunchGuard};
pub use future::Future;
pub use launch::{spawn, try_spawn};
pub use packaged_task::PackagedTask;
pub use panic_guard::catch_to_task_error;
pub use promise::Promise;
pub use ready::{make_exceptional_future, make_ready_future, make_ready_void_future};
pub use when_all::{when_all2, when_all3, when_all4, when_all5, when_all_vec, WhenAllResult};
pub use when_any::{when_any2, when_any3, when_any4, when_any5, when_any_vec, WhenAnyResult};

pub use task_executor::{boxed, default_executor, BoxExecutor, Executor, InlineExecutor, ThreadPoolExecutor};
pub use task_state::{
    Cardinality, Continuable, ContinuationKind, Error, NonContinuable, Shared, StopSource,
    StopToken, TaskError, TaskResult, Unique, WaitStatus,
};
