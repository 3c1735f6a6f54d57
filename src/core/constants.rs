use std::time::Duration;

/// Interval between two timer ticks.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);
/// Upper bound of the minutes field when configuring a countdown.
pub const MAX_SETUP_MINUTES: u32 = 99;
/// Upper bound of the seconds field when configuring a countdown.
pub const MAX_SETUP_SECONDS: u32 = 59;
/// Countdown length of a freshly opened full screen timer.
pub const DEFAULT_COUNTDOWN_SECONDS: u32 = 5 * 60;
/// Step used by the +/- buttons of the rest timer.
pub const REST_ADJUST_STEP: i64 = 15;

/// Rest time if nothing more specific is known.
pub const DEFAULT_REST_SECONDS: u32 = 90;
pub const COMPOUND_REST_SECONDS: u32 = 180;
pub const DUMBBELL_REST_SECONDS: u32 = 120;
pub const BODYWEIGHT_REST_SECONDS: u32 = 90;
pub const ISOLATION_REST_SECONDS: u32 = 75;

/// Number of history rows returned when no limit is given.
pub const DEFAULT_HISTORY_LIMIT: usize = 30;
/// Window of the progression statistics when no window is given.
pub const DEFAULT_PROGRESSION_DAYS: u32 = 30;
/// Window of the overall progress when no window is given.
pub const DEFAULT_OVERALL_DAYS: u32 = 90;
/// Personal records listed in the overall progress.
pub const RECENT_RECORDS_LIMIT: usize = 5;
/// Workouts returned when no limit is given.
pub const RECENT_WORKOUTS_LIMIT: usize = 10;
/// Public templates returned when no limit is given.
pub const POPULAR_TEMPLATES_LIMIT: usize = 10;
/// Epley divisor: `1RM = w * (1 + r / EPLEY_DIVISOR)`.
pub const EPLEY_DIVISOR: f64 = 30.0;

pub const REMINDER_TITLE: &str = "Rest Complete!";
pub const TIMER_REMINDER_TITLE: &str = "Timer Complete!";

