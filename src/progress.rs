//! Progress bar construction shared by training and batch encoding/decoding.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle, style::TemplateError};

/// Creates a styled progress bar with elapsed time, a fixed-width message label,
/// and position/total counters.
///
/// When `visible` is false the bar still counts but never renders, so callers
/// can drive it unconditionally.
///
/// # Arguments
///
/// * `size` - The total number of steps the progress bar represents.
/// * `msg` - The message label displayed alongside the progress bar.
/// * `visible` - Whether the bar should draw to the terminal.
///
/// # Errors
///
/// Returns a [`TemplateError`] if the progress bar style template is invalid.
pub(crate) fn progress_bar(
    size: u64,
    msg: impl Into<String>,
    visible: bool,
) -> Result<ProgressBar, TemplateError> {
    let pb = ProgressBar::new(size);

    if !visible {
        // force to not render
        pb.set_draw_target(ProgressDrawTarget::hidden());
        return Ok(pb);
    }

    let style =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {msg:<30!} {wide_bar} {pos}/{len}")?;

    pb.set_style(style);
    pb.set_message(msg.into());
    pb.enable_steady_tick(std::time::Duration::from_secs(1));

    Ok(pb)
}
