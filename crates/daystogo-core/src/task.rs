use serde::{Deserialize, Serialize};

/// What the page scanner saw for one task row.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskSnapshot {
    #[serde(default)]
    pub id: Option<String>,

    /// Value of the row's structured due-date attribute.
    #[serde(default)]
    pub due_date: Option<String>,

    /// `datetime` attribute values, in document order.
    #[serde(default)]
    pub datetimes: Vec<String>,

    #[serde(default)]
    pub text: String,
}

impl TaskSnapshot {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn from_due_date(due_date: impl Into<String>) -> Self {
        Self {
            due_date: Some(due_date.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("-")
    }
}
