use crate::config::{DisplayMode, Settings};

/// Localized label for a day offset.
///
/// Today, tomorrow and yesterday always use the fixed phrases; the display
/// mode only affects offsets beyond tomorrow.
#[must_use]
pub fn format_offset(days: i64, settings: &Settings) -> String {
    let locale = settings.locale.definition();
    match days {
        0 => locale.today.to_string(),
        1 => locale.tomorrow.to_string(),
        -1 => locale.yesterday.to_string(),
        d if d < 0 => locale.days_ago.render(d.saturating_abs()),
        d => match settings.display_mode {
            DisplayMode::Before => locale.days_later.render(d),
            DisplayMode::After => locale.days_remaining.render(d),
            DisplayMode::DMinus => locale.d_minus().render(d),
        },
    }
}
