use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use unicode_width::UnicodeWidthStr;

use crate::badge::TaskBadge;
use crate::config::Config;
use crate::locale::SUPPORTED_LOCALES;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self {
            color: color && io::stdout().is_terminal(),
        })
    }

    /// Never paints; for writers that are not a terminal.
    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip_all, fields(rows = rows.len()))]
    pub fn print_badge_table(&mut self, rows: &[TaskBadge]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_badge_table(&mut out, rows)
    }

    pub fn write_badge_table<W: Write>(&self, writer: W, rows: &[TaskBadge]) -> anyhow::Result<()> {
        let headers = vec![
            "ID".to_string(),
            "Date".to_string(),
            "Source".to_string(),
            "Days".to_string(),
            "Badge".to_string(),
        ];

        let mut cells = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id.clone().unwrap_or_else(|| "-".to_string());
            let badge = &row.badge;
            let text = self.paint(&badge.text, badge.severity.ansi());

            cells.push(vec![
                id,
                badge.source.date.clone(),
                badge.source.provenance.to_string(),
                badge.days.to_string(),
                text,
            ]);
        }

        write_table(writer, headers, cells)
    }

    #[tracing::instrument(skip(self))]
    pub fn print_locales(&mut self) -> anyhow::Result<()> {
        let out = io::stdout().lock();

        let headers = vec![
            "Locale".to_string(),
            "Today".to_string(),
            "Tomorrow".to_string(),
            "Yesterday".to_string(),
            "Past".to_string(),
            "Before".to_string(),
            "After".to_string(),
        ];

        let rows = SUPPORTED_LOCALES
            .iter()
            .map(|tag| {
                let def = tag.definition();
                vec![
                    tag.to_string(),
                    def.today.to_string(),
                    def.tomorrow.to_string(),
                    def.yesterday.to_string(),
                    def.days_ago.as_str().to_string(),
                    def.days_later.as_str().to_string(),
                    def.days_remaining.as_str().to_string(),
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
