use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::badge::{TaskBadge, badges_for_tasks, compute_badge};
use crate::cli::Invocation;
use crate::config::{Config, Settings};
use crate::render::Renderer;
use crate::resolve::{DateInfo, Provenance, extract_deadline_from_text};
use crate::task::TaskSnapshot;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "date", "text", "scan", "export", "locales", "_show", "help", "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(cfg, settings, renderer, inv))]
pub fn dispatch(
    cfg: &Config,
    settings: &Settings,
    renderer: &mut Renderer,
    inv: Invocation,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let command = inv.command.as_str();
    debug!(command, args = ?inv.command_args, "dispatching command");

    match command {
        "date" => cmd_date(settings, renderer, &inv.command_args, today),
        "text" => cmd_text(settings, renderer, &inv.command_args, today),
        "scan" => cmd_scan(settings, renderer, &inv.command_args, today),
        "export" => cmd_export(settings, &inv.command_args, today),
        "locales" => renderer.print_locales(),
        "_show" => cmd_show(cfg, settings),
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

#[instrument(skip(settings, renderer, args))]
fn cmd_date(
    settings: &Settings,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    if args.is_empty() {
        return Err(anyhow!("date requires at least one YYYY-MM-DD value"));
    }

    let mut rows = Vec::with_capacity(args.len());
    for raw in args {
        match compute_badge(DateInfo::new(raw.as_str(), Provenance::Due), settings, today) {
            Some(badge) => rows.push(TaskBadge { id: None, badge }),
            None => warn!(value = %raw, "no YYYY-MM-DD date in value; skipping"),
        }
    }

    renderer.print_badge_table(&rows)
}

#[instrument(skip(settings, renderer, args))]
fn cmd_text(
    settings: &Settings,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    let text = args.join(" ");
    if text.trim().is_empty() {
        return Err(anyhow!("text requires the task text to read"));
    }

    let rows: Vec<TaskBadge> = extract_deadline_from_text(&text, settings, today)
        .and_then(|info| compute_badge(info, settings, today))
        .map(|badge| TaskBadge { id: None, badge })
        .into_iter()
        .collect();

    if rows.is_empty() {
        info!(locale = %settings.locale, "no date found in text");
    }
    renderer.print_badge_table(&rows)
}

#[instrument(skip(settings, renderer, args))]
fn cmd_scan(
    settings: &Settings,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    let snapshots = read_snapshots_arg(args)?;
    let rows = badges_for_tasks(&snapshots, settings, today);
    info!(tasks = snapshots.len(), badges = rows.len(), "scanned tasks");
    renderer.print_badge_table(&rows)
}

#[instrument(skip(settings, args))]
fn cmd_export(settings: &Settings, args: &[String], today: NaiveDate) -> anyhow::Result<()> {
    let snapshots = read_snapshots_arg(args)?;
    let rows = badges_for_tasks(&snapshots, settings, today);
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn cmd_show(cfg: &Config, settings: &Settings) -> anyhow::Result<()> {
    let mut entries: Vec<_> = cfg.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in entries {
        println!("{key}={value}");
    }
    for path in &cfg.loaded_files {
        println!("# loaded {}", path.display());
    }
    println!(
        "# effective locale={} format={} update.interval={}ms debug={}",
        settings.locale,
        settings.display_mode,
        settings.update_interval.as_millis(),
        settings.debug
    );
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!("usage: days-to-go [options] [rc.KEY=VALUE ...] <command> [args]");
    println!();
    println!("commands:");
    println!("  date <YYYY-MM-DD>...  badge for each structured date");
    println!("  text <TEXT>...        badge for the deadline written in TEXT");
    println!("  scan [FILE]           badges for JSON-lines task snapshots (stdin if no FILE)");
    println!("  export [FILE]         like scan, printed as JSON");
    println!("  locales               supported locales and their phrases");
    println!("  _show                 effective configuration");
    println!("  help | version");
    Ok(())
}

fn read_snapshots_arg(args: &[String]) -> anyhow::Result<Vec<TaskSnapshot>> {
    match args {
        [] => read_snapshots(io::stdin().lock()),
        [path] if path == "-" => read_snapshots(io::stdin().lock()),
        [path] => open_snapshots(Path::new(path)),
        _ => Err(anyhow!("expected at most one input file, got {}", args.len())),
    }
}

fn open_snapshots(path: &Path) -> anyhow::Result<Vec<TaskSnapshot>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_snapshots(file).with_context(|| format!("failed to read snapshots from {}", path.display()))
}

/// One JSON object per line; blank lines are ignored.
pub fn read_snapshots<R: Read>(reader: R) -> anyhow::Result<Vec<TaskSnapshot>> {
    let mut out = Vec::new();
    for (idx, line) in BufReader::new(reader).lines().enumerate() {
        let line = line.context("failed to read input line")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let snapshot: TaskSnapshot = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid task snapshot on line {}", idx + 1))?;
        out.push(snapshot);
    }
    debug!(count = out.len(), "read task snapshots");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{expand_command_abbrev, known_command_names, read_snapshots};

    #[test]
    fn abbreviations_must_be_unique() {
        let known = known_command_names();
        assert_eq!(expand_command_abbrev("sc", &known), Some("scan"));
        assert_eq!(expand_command_abbrev("loc", &known), Some("locales"));
        assert_eq!(expand_command_abbrev("date", &known), Some("date"));
        assert_eq!(expand_command_abbrev("x", &known), None);
    }

    #[test]
    fn reads_json_lines() {
        let input = "{\"id\":\"1\",\"text\":\"3月5日\"}\n\n{\"due_date\":\"2026-03-08\"}\n";
        let rows = read_snapshots(input.as_bytes()).expect("read");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id.as_deref(), Some("1"));
        assert_eq!(rows[1].due_date.as_deref(), Some("2026-03-08"));
    }

    #[test]
    fn reports_bad_line_number() {
        let input = "{\"text\":\"ok\"}\nnot json\n";
        let err = read_snapshots(input.as_bytes()).expect_err("second line is invalid");
        assert!(format!("{err:#}").contains("line 2"), "{err:#}");
    }
}
