//! Human-facing renderings of a profile: the console report and a static
//! HTML page.

pub mod console;
pub mod html;

pub use console::{
    format_time, make_bar, render_hot_failure, render_profile, render_regressions,
    DEFAULT_BAR_WIDTH,
};
pub use html::html_report;
