//! Per-user admission control.

mod activity;
mod limiter;
mod window;

pub use activity::{spawn_sweeper, sweep, ActivityTracker};
pub use limiter::RateLimiter;
pub use window::KeyWindow;
