pub mod clock;
pub mod countdown;
pub mod frame_loop;
pub mod scheduler;
pub mod stats;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use countdown::{Countdown, CountdownTick};
pub use frame_loop::FrameLoop;
pub use scheduler::{FrameScheduler, FrameTick, SchedulerState};
pub use stats::FrameStatistics;
