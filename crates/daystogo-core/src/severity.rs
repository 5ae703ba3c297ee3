use serde::{
  Deserialize,
  Serialize
};

/// Urgency bucket for a day offset.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Overdue,
  Urgent,
  Soon,
  Later
}

impl Severity {
  #[must_use]
  pub const fn as_str(
    self
  ) -> &'static str {
    match self {
      | Self::Overdue => "overdue",
      | Self::Urgent => "urgent",
      | Self::Soon => "soon",
      | Self::Later => "later"
    }
  }

  #[must_use]
  pub const fn color(
    self
  ) -> &'static str {
    match self {
      | Self::Overdue => "#d1453b",
      | Self::Urgent => "#eb8909",
      | Self::Soon => "#246fe0",
      | Self::Later => "#808080"
    }
  }

  /// Badge fill: the text color at low
  /// alpha.
  #[must_use]
  pub fn background(self) -> String {
    format!("{}15", self.color())
  }

  /// SGR color code for terminal output.
  #[must_use]
  pub const fn ansi(
    self
  ) -> &'static str {
    match self {
      | Self::Overdue => "31",
      | Self::Urgent => "33",
      | Self::Soon => "34",
      | Self::Later => "90"
    }
  }
}

/// Today counts as overdue.
#[must_use]
pub const fn classify(
  days: i64
) -> Severity {
  if days <= 0 {
    Severity::Overdue
  } else if days <= 3 {
    Severity::Urgent
  } else if days <= 7 {
    Severity::Soon
  } else {
    Severity::Later
  }
}
