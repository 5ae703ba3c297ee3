use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::time::Duration;

use anyhow::{
  Context,
  anyhow
};
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::locale::{
  DEFAULT_LOCALE,
  LocaleTag
};

const RC_ENV_VAR: &str = "DAYSTOGORC";
const RC_FILE_NAME: &str = ".daystogorc";
const DEFAULT_UPDATE_INTERVAL_MS: u64 =
  1000;

/// Raw `key = value` settings from the rc
/// file and command-line overrides.
#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    for (key, value) in [
      ("locale", DEFAULT_LOCALE.as_str()),
      (
        "format",
        DisplayMode::Before.as_str()
      ),
      ("update.interval", "1000"),
      ("debug", "off"),
      ("color", "on")
    ] {
      map.insert(
        key.to_string(),
        value.to_string()
      );
    }
    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let rc =
      resolve_rc_path(rc_override)?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading rc file");
      cfg.load_file(&path)?;
    } else {
      warn!(
        "no rc file found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  /// Reads exactly one rc file (and its
  /// includes) on top of the defaults.
  pub fn from_file(
    path: &Path
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();
    cfg.load_file(path)?;
    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (&String, &String)>
  {
    self.map.iter()
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if let Some((before, _)) =
        line.split_once('#')
      {
        line = before.trim();
      }

      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if include_path.exists() {
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

/// How offsets beyond tomorrow are
/// worded.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
)]
pub enum DisplayMode {
  /// "in 5d" / "5日後"
  #[default]
  #[serde(rename = "before")]
  Before,
  /// "5d left" / "あと5日"
  #[serde(rename = "after")]
  After,
  /// "D-5"
  #[serde(rename = "D-")]
  DMinus
}

impl DisplayMode {
  #[must_use]
  pub const fn as_str(
    self
  ) -> &'static str {
    match self {
      | Self::Before => "before",
      | Self::After => "after",
      | Self::DMinus => "D-"
    }
  }

  #[must_use]
  pub fn parse(
    value: &str
  ) -> Option<Self> {
    match value {
      | "before" => Some(Self::Before),
      | "after" => Some(Self::After),
      | "D-" => Some(Self::DMinus),
      | _ => None
    }
  }

  /// Unknown modes behave as
  /// [`DisplayMode::Before`].
  #[must_use]
  pub fn from_value(
    value: &str
  ) -> Self {
    Self::parse(value)
      .unwrap_or_default()
  }
}

impl fmt::Display for DisplayMode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Everything the badge engine reads.
/// Built once and passed by reference.
#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
pub struct Settings {
  pub locale:          LocaleTag,
  pub display_mode:    DisplayMode,
  /// Re-scan period for whatever drives
  /// the engine; unused by it.
  pub update_interval: Duration,
  pub debug:           bool
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      locale:          DEFAULT_LOCALE,
      display_mode:    DisplayMode::Before,
      update_interval:
        Duration::from_millis(
          DEFAULT_UPDATE_INTERVAL_MS
        ),
      debug:           false
    }
  }
}

impl Settings {
  #[must_use]
  pub fn new(
    locale: LocaleTag,
    display_mode: DisplayMode
  ) -> Self {
    Self {
      locale,
      display_mode,
      ..Self::default()
    }
  }

  #[tracing::instrument(skip(cfg))]
  pub fn from_config(
    cfg: &Config
  ) -> anyhow::Result<Self> {
    let defaults = Self::default();

    let locale = match cfg.get("locale")
    {
      | Some(raw) => {
        LocaleTag::parse(&raw)
          .unwrap_or_else(|| {
            warn!(
              locale = %raw,
              fallback = %DEFAULT_LOCALE,
              "unsupported locale; using default"
            );
            DEFAULT_LOCALE
          })
      }
      | None => defaults.locale
    };

    let display_mode = match cfg
      .get("format")
    {
      | Some(raw) => {
        DisplayMode::parse(&raw)
          .unwrap_or_else(|| {
            warn!(
              format = %raw,
              "unknown display format; using before"
            );
            DisplayMode::Before
          })
      }
      | None => defaults.display_mode
    };

    let update_interval = match cfg
      .get("update.interval")
    {
      | Some(raw) => {
        let ms: u64 =
          raw.trim().parse().with_context(
            || {
              format!(
                "invalid \
                 update.interval: {raw}"
              )
            }
          )?;
        Duration::from_millis(ms)
      }
      | None => defaults.update_interval
    };

    let debug = cfg
      .get_bool("debug")
      .unwrap_or(defaults.debug);

    let settings = Self {
      locale,
      display_mode,
      update_interval,
      debug
    };
    debug!(?settings, "resolved settings");
    Ok(settings)
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV_VAR)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let home = dirs::home_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine home \
         directory"
      )
    })?;
  let candidate = home.join(RC_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

pub(crate) fn parse_bool(
  s: &str
) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::{
    Config,
    DisplayMode,
    Settings
  };
  use crate::locale::LocaleTag;

  #[test]
  fn defaults_match_settings_defaults() {
    let settings =
      Settings::from_config(
        &Config::default()
      )
      .expect("defaults resolve");
    assert_eq!(
      settings,
      Settings::default()
    );
    assert_eq!(
      settings.locale,
      LocaleTag::Ja
    );
    assert_eq!(
      settings.display_mode,
      DisplayMode::Before
    );
    assert_eq!(
      settings.update_interval,
      Duration::from_millis(1000)
    );
    assert!(!settings.debug);
  }

  #[test]
  fn overrides_strip_rc_prefix() {
    let mut cfg = Config::default();
    cfg.apply_overrides([
      (
        "rc.locale".to_string(),
        "en".to_string()
      ),
      (
        "format".to_string(),
        "D-".to_string()
      )
    ]);
    let settings =
      Settings::from_config(&cfg)
        .expect("resolve");
    assert_eq!(
      settings.locale,
      LocaleTag::En
    );
    assert_eq!(
      settings.display_mode,
      DisplayMode::DMinus
    );
  }

  #[test]
  fn unknown_values_fall_back() {
    let mut cfg = Config::default();
    cfg.apply_overrides([
      (
        "locale".to_string(),
        "invalid".to_string()
      ),
      (
        "format".to_string(),
        "unknown".to_string()
      )
    ]);
    let settings =
      Settings::from_config(&cfg)
        .expect("resolve");
    assert_eq!(
      settings.locale,
      LocaleTag::Ja
    );
    assert_eq!(
      settings.display_mode,
      DisplayMode::Before
    );
  }

  #[test]
  fn near_miss_values_fall_back() {
    let mut cfg = Config::default();
    cfg.apply_overrides([
      (
        "locale".to_string(),
        "EN".to_string()
      ),
      (
        "format".to_string(),
        "d-".to_string()
      )
    ]);
    let settings =
      Settings::from_config(&cfg)
        .expect("resolve");
    assert_eq!(
      settings.locale,
      LocaleTag::Ja
    );
    assert_eq!(
      settings.display_mode,
      DisplayMode::Before
    );
  }

  #[test]
  fn bad_interval_is_an_error() {
    let mut cfg = Config::default();
    cfg.apply_overrides([(
      "update.interval".to_string(),
      "soon".to_string()
    )]);
    assert!(
      Settings::from_config(&cfg)
        .is_err()
    );
  }

  #[test]
  fn display_mode_round_trips_names() {
    for mode in [
      DisplayMode::Before,
      DisplayMode::After,
      DisplayMode::DMinus
    ] {
      assert_eq!(
        DisplayMode::parse(
          mode.as_str()
        ),
        Some(mode)
      );
    }
    for value in [
      "sideways", "d-", " after ", "D- ",
      "After"
    ] {
      assert_eq!(
        DisplayMode::from_value(value),
        DisplayMode::Before,
        "{value:?}"
      );
    }
  }
}
