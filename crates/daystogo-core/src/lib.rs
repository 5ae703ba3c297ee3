pub mod badge;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod format;
pub mod locale;
pub mod render;
pub mod resolve;
pub mod severity;
pub mod task;

use std::ffi::OsString;

use clap::Parser;
use tracing::{
  debug,
  info
};

use crate::datetime::{
  Clock,
  FixedClock,
  SystemClock
};

pub use crate::badge::{
  Badge,
  TaskBadge,
  badge_for_task,
  compute_badge
};
pub use crate::config::{
  DisplayMode,
  Settings
};
pub use crate::datetime::{
  CalendarDate,
  days_between,
  parse_date
};
pub use crate::format::format_offset;
pub use crate::locale::{
  LocaleDefinition,
  LocaleTag,
  resolve_locale
};
pub use crate::resolve::{
  DateInfo,
  Provenance,
  extract_date_from_task,
  extract_deadline_from_text
};
pub use crate::severity::{
  Severity,
  classify
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  let mut cfg = config::Config::load(
    cli.daystogorc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );
  cli::init_tracing(
    cli.verbose,
    cli.quiet,
    cfg.get_bool("debug").unwrap_or(false)
  )?;

  let settings =
    config::Settings::from_config(&cfg)?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    locale = %settings.locale,
    format = %settings.display_mode,
    "starting days-to-go"
  );
  debug!(
    update_interval = ?settings.update_interval,
    files = ?cfg.loaded_files,
    "loaded configuration"
  );

  let clock: Box<dyn Clock> =
    match cli.today {
      | Some(date) => {
        Box::new(FixedClock::at_date(date))
      }
      | None => Box::new(SystemClock)
    };
  let today = clock.today();
  debug!(%today, "reference date");

  let mut renderer =
    render::Renderer::new(&cfg)?;
  let inv = cli::Invocation::parse(
    &cfg, cli.rest
  )?;

  commands::dispatch(
    &cfg,
    &settings,
    &mut renderer,
    inv,
    today
  )?;

  info!("done");
  Ok(())
}
