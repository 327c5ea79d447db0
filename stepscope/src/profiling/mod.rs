//! Step recording
//!
//! ```text
//! profiler.step("a", || ...)
//!     │
//!     ├─ push node (stack.rs)          depth = open steps, parent = stack top
//!     ├─ run body
//!     └─ guard closes (guard.rs)
//!          ├─ time + classify          slow / provisional hot / CPU|IO
//!          ├─ pop, or flag overlap     StackViolation
//!          ├─ locate source            only for slow or hot steps
//!          └─ append to flat list      finalize order
//! ```
//!
//! - **`profiler`**: the public handle and `end()`
//! - **`guard`**: RAII completion for closures, futures and manual steps
//! - **`stack`**: node arena and the open-step stack

pub mod guard;
pub mod profiler;
mod stack;

pub use guard::{StepGuard, Timed};
pub use profiler::{ProfileOutcome, Profiler};
