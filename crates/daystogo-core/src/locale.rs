use std::fmt;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Display languages with a built-in phrase table and date grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocaleTag {
    #[default]
    Ja,
    En,
    Zh,
}

pub const DEFAULT_LOCALE: LocaleTag = LocaleTag::Ja;

pub const SUPPORTED_LOCALES: &[LocaleTag] = &[LocaleTag::Ja, LocaleTag::En, LocaleTag::Zh];

impl LocaleTag {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            | Self::Ja => "ja",
            | Self::En => "en",
            | Self::Zh => "zh",
        }
    }

    /// Exact tags only; anything else is unsupported.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            | "ja" => Some(Self::Ja),
            | "en" => Some(Self::En),
            | "zh" => Some(Self::Zh),
            | _ => None,
        }
    }

    #[must_use]
    pub fn definition(self) -> &'static LocaleDefinition {
        let registry = registry();
        match self {
            | Self::Ja => &registry.ja,
            | Self::En => &registry.en,
            | Self::Zh => &registry.zh,
        }
    }
}

impl fmt::Display for LocaleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A phrase with a single `{n}` placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template(&'static str);

impl Template {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }

    #[must_use]
    pub fn render(self, n: i64) -> String {
        self.0.replace("{n}", &n.to_string())
    }
}

/// Shared by every locale.
pub const D_MINUS: Template = Template("D-{n}");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

/// How a locale spells a month/day token in free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateGrammar {
    /// `3月15日`: month and day are both digits.
    CjkDigits,
    /// `Mar 15`, `March 15`, `15 Mar`: English month names, either order.
    Alphabetic,
}

impl DateGrammar {
    fn date_pattern(self) -> &'static str {
        match self {
            | Self::CjkDigits => r"([0-9]{1,2})月([0-9]{1,2})日",
            | Self::Alphabetic => {
                r"(?i)(?:([0-9]{1,2})\s+)?(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*(?:\s+([0-9]{1,2}))?"
            }
        }
    }

    /// Month or day may come back as zero; callers decide what that means.
    fn month_day(self, caps: &Captures<'_>) -> Option<MonthDay> {
        match self {
            | Self::CjkDigits => {
                let month = caps.get(1)?.as_str().parse().ok()?;
                let day = caps.get(2)?.as_str().parse().ok()?;
                Some(MonthDay { month, day })
            }
            | Self::Alphabetic => {
                let name = caps.get(2)?.as_str();
                let month = month_number(name)?;
                let day = caps
                    .get(1)
                    .or_else(|| caps.get(3))?
                    .as_str()
                    .parse()
                    .ok()?;
                Some(MonthDay { month, day })
            }
        }
    }
}

fn month_number(name: &str) -> Option<u32> {
    let key: String = name.chars().take(3).collect::<String>().to_lowercase();
    match key.as_str() {
        | "jan" => Some(1),
        | "feb" => Some(2),
        | "mar" => Some(3),
        | "apr" => Some(4),
        | "may" => Some(5),
        | "jun" => Some(6),
        | "jul" => Some(7),
        | "aug" => Some(8),
        | "sep" => Some(9),
        | "oct" => Some(10),
        | "nov" => Some(11),
        | "dec" => Some(12),
        | _ => None,
    }
}

#[derive(Debug)]
pub struct LocaleDefinition {
    pub tag: LocaleTag,
    pub today: &'static str,
    pub tomorrow: &'static str,
    pub yesterday: &'static str,
    pub days_ago: Template,
    pub days_later: Template,
    pub days_remaining: Template,
    pub grammar: DateGrammar,
    date_pattern: Regex,
    keyword_pattern: Regex,
}

impl LocaleDefinition {
    #[must_use]
    pub fn d_minus(&self) -> Template {
        D_MINUS
    }

    #[must_use]
    pub fn date_pattern(&self) -> &Regex {
        &self.date_pattern
    }

    #[must_use]
    pub fn keyword_pattern(&self) -> &Regex {
        &self.keyword_pattern
    }

    /// Every non-overlapping date token in `text`, left to right.
    #[must_use]
    pub fn date_matches<'t>(&self, text: &'t str) -> Vec<Captures<'t>> {
        self.date_pattern.captures_iter(text).collect()
    }

    #[must_use]
    pub fn parse_match(&self, caps: &Captures<'_>) -> Option<MonthDay> {
        let parsed = self.grammar.month_day(caps);
        trace!(
            locale = %self.tag,
            token = caps.get(0).map(|m| m.as_str()).unwrap_or_default(),
            ?parsed,
            "parsed date token"
        );
        parsed
    }

    /// Whether `text` carries a date token or one of the relative-day phrases.
    #[must_use]
    pub fn contains_date_keyword(&self, text: &str) -> bool {
        self.keyword_pattern.is_match(text)
    }
}

struct Registry {
    ja: LocaleDefinition,
    en: LocaleDefinition,
    zh: LocaleDefinition,
}

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Registry {
        ja: LocaleDefinition {
            tag: LocaleTag::Ja,
            today: "今日",
            tomorrow: "明日",
            yesterday: "昨日",
            days_ago: Template("{n}日前"),
            days_later: Template("{n}日後"),
            days_remaining: Template("あと{n}日"),
            grammar: DateGrammar::CjkDigits,
            date_pattern: compile(DateGrammar::CjkDigits.date_pattern()),
            keyword_pattern: compile(r"[0-9]{1,2}月[0-9]{1,2}日|今日|明日|昨日"),
        },
        en: LocaleDefinition {
            tag: LocaleTag::En,
            today: "Today",
            tomorrow: "Tomorrow",
            yesterday: "Yesterday",
            days_ago: Template("{n}d ago"),
            days_later: Template("in {n}d"),
            days_remaining: Template("{n}d left"),
            grammar: DateGrammar::Alphabetic,
            date_pattern: compile(DateGrammar::Alphabetic.date_pattern()),
            keyword_pattern: compile(
                r"(?i)(?-u:\b)(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\s+[0-9]{1,2}(?-u:\b)|(?-u:\b)(?:today|tomorrow|yesterday)(?-u:\b)",
            ),
        },
        zh: LocaleDefinition {
            tag: LocaleTag::Zh,
            today: "今天",
            tomorrow: "明天",
            yesterday: "昨天",
            days_ago: Template("{n}天前"),
            days_later: Template("{n}天后"),
            days_remaining: Template("还剩{n}天"),
            grammar: DateGrammar::CjkDigits,
            date_pattern: compile(DateGrammar::CjkDigits.date_pattern()),
            keyword_pattern: compile(r"[0-9]{1,2}月[0-9]{1,2}日|今天|明天|昨天"),
        },
    })
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in locale pattern must compile")
}

/// Looks up a locale by tag, falling back to [`DEFAULT_LOCALE`].
#[must_use]
pub fn resolve_locale(tag: &str) -> &'static LocaleDefinition {
    LocaleTag::parse(tag)
        .unwrap_or(DEFAULT_LOCALE)
        .definition()
}

#[cfg(test)]
mod tests {
    use super::{D_MINUS, DEFAULT_LOCALE, LocaleTag, MonthDay, SUPPORTED_LOCALES, resolve_locale};

    fn first_month_day(tag: LocaleTag, text: &str) -> Option<MonthDay> {
        let def = tag.definition();
        let caps = def.date_pattern().captures(text)?;
        def.parse_match(&caps)
    }

    #[test]
    fn every_locale_has_phrases_and_templates() {
        for tag in SUPPORTED_LOCALES {
            let def = tag.definition();
            assert_eq!(def.tag, *tag);
            assert!(!def.today.is_empty());
            assert!(!def.tomorrow.is_empty());
            assert!(!def.yesterday.is_empty());
            for template in [def.days_ago, def.days_later, def.days_remaining, def.d_minus()] {
                assert!(template.as_str().contains("{n}"), "{tag}: {template:?}");
            }
        }
    }

    #[test]
    fn templates_render_counts() {
        let ja = LocaleTag::Ja.definition();
        assert_eq!(ja.days_ago.render(3), "3日前");
        assert_eq!(ja.days_later.render(5), "5日後");
        assert_eq!(ja.days_remaining.render(7), "あと7日");

        let en = LocaleTag::En.definition();
        assert_eq!(en.days_ago.render(3), "3d ago");
        assert_eq!(en.days_later.render(5), "in 5d");
        assert_eq!(en.days_remaining.render(7), "7d left");

        let zh = LocaleTag::Zh.definition();
        assert_eq!(zh.days_ago.render(3), "3天前");
        assert_eq!(zh.days_later.render(5), "5天后");
        assert_eq!(zh.days_remaining.render(7), "还剩7天");

        assert_eq!(D_MINUS.render(10), "D-10");
    }

    #[test]
    fn unknown_tags_fall_back_to_default() {
        let fallback = DEFAULT_LOCALE.definition();
        for tag in ["invalid", "", "fr", "jp", "en-US", "EN", " en ", "zh_CN", "ZH"] {
            assert!(std::ptr::eq(resolve_locale(tag), fallback), "{tag}");
        }
        assert_eq!(resolve_locale("en").tag, LocaleTag::En);
        assert_eq!(resolve_locale("zh").tag, LocaleTag::Zh);
    }

    #[test]
    fn only_exact_tags_parse() {
        assert_eq!(LocaleTag::parse("ja"), Some(LocaleTag::Ja));
        assert_eq!(LocaleTag::parse("en"), Some(LocaleTag::En));
        assert_eq!(LocaleTag::parse("zh"), Some(LocaleTag::Zh));
        for tag in ["en-US", "EN", " en ", "zh_CN", "ZH", "JA"] {
            assert_eq!(LocaleTag::parse(tag), None, "{tag:?}");
        }
    }

    #[test]
    fn cjk_tokens_yield_numbers() {
        assert_eq!(
            first_month_day(LocaleTag::Ja, "タスク 3月15日 締切"),
            Some(MonthDay { month: 3, day: 15 })
        );
        assert_eq!(
            first_month_day(LocaleTag::Zh, "任务 12月1日"),
            Some(MonthDay { month: 12, day: 1 })
        );
        assert_eq!(first_month_day(LocaleTag::Ja, "３月１５日"), None);
    }

    #[test]
    fn alphabetic_tokens_in_either_order() {
        let expected = Some(MonthDay { month: 3, day: 15 });
        assert_eq!(first_month_day(LocaleTag::En, "Task due Mar 15"), expected);
        assert_eq!(first_month_day(LocaleTag::En, "Deadline: March 15"), expected);
        assert_eq!(first_month_day(LocaleTag::En, "Due: 15 Mar"), expected);
        assert_eq!(first_month_day(LocaleTag::En, "due MARCH 15"), expected);
    }

    #[test]
    fn alphabetic_token_without_day_has_no_month_day() {
        assert_eq!(first_month_day(LocaleTag::En, "sometime in March"), None);
    }

    #[test]
    fn keyword_pattern_detects_relative_phrases() {
        assert!(LocaleTag::Ja.definition().contains_date_keyword("📅今日"));
        assert!(LocaleTag::Ja.definition().contains_date_keyword("📆1月21日"));
        assert!(LocaleTag::Zh.definition().contains_date_keyword("明天"));
        assert!(LocaleTag::En.definition().contains_date_keyword("due tomorrow"));
        assert!(LocaleTag::En.definition().contains_date_keyword("Jan 21"));
        assert!(LocaleTag::En.definition().contains_date_keyword("締切Today"));
        assert!(LocaleTag::En.definition().contains_date_keyword("期限Jan 5"));
        assert!(!LocaleTag::En.definition().contains_date_keyword("Todayish plans"));
        assert!(!LocaleTag::En.definition().contains_date_keyword("March"));
        assert!(!LocaleTag::Zh.definition().contains_date_keyword("今日"));
    }
}
