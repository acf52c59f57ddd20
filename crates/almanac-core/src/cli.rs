use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::datetime::parse_iso_date;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "almanac",
    version,
    about = "Almanac: month-view calendar for the terminal",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "almanacrc", global = true)]
    pub almanacrc: Option<PathBuf>,

    /// JSON array of events to show.
    #[arg(long = "events", global = true)]
    pub events: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// The month grid around DATE (default: today).
    Month {
        date: Option<String>,

        #[command(flatten)]
        nav: NavArgs,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// The five-row sidebar calendar.
    Mini {
        date: Option<String>,

        #[command(flatten)]
        nav: NavArgs,
    },

    /// Every event on one day.
    Day {
        date: String,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Configured categories and quick picks.
    Categories {
        #[command(flatten)]
        filters: FilterArgs,
    },
}

impl Default for Command {
    fn default() -> Self {
        Self::Month {
            date: None,
            nav: NavArgs::default(),
            filters: FilterArgs::default(),
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct NavArgs {
    /// Step forward one month (repeatable).
    #[arg(long = "next", action = ArgAction::Count)]
    pub next: u8,

    /// Step back one month (repeatable).
    #[arg(long = "prev", action = ArgAction::Count)]
    pub prev: u8,
}

impl NavArgs {
    pub fn steps(&self) -> i32 {
        i32::from(self.next) - i32::from(self.prev)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Show only these categories.
    #[arg(long = "only", value_name = "CATEGORY")]
    pub only: Vec<String>,

    /// Hide these categories.
    #[arg(long = "hide", value_name = "CATEGORY")]
    pub hide: Vec<String>,

    /// Start with every category hidden.
    #[arg(long = "none", conflicts_with = "only")]
    pub none: bool,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls `rc.key=value` / `rc.key:value`
/// words out of the argument list.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = if let Some((k, v)) = rest.split_once('=') {
                Some((format!("rc.{k}"), v.to_string()))
            } else if let Some((k, v)) = rest.split_once(':') {
                Some((format!("rc.{k}"), v.to_string()))
            } else {
                None
            };

            if let Some((k, v)) = parsed {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

/// `today` or a `YYYY-MM-DD` date.
pub fn parse_date_arg(raw: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("today") {
        return Ok(today);
    }
    parse_iso_date(trimmed).ok_or_else(|| anyhow!("expected YYYY-MM-DD or 'today', got: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn positional_rc_overrides_are_extracted() {
        let pre = preprocess_args(&os(&["almanac", "rc.color=off", "month", "rc.preview.limit:3"]))
            .expect("preprocess");
        assert_eq!(pre.cleaned_args, os(&["almanac", "month"]));
        assert_eq!(
            pre.rc_overrides,
            vec![
                ("rc.color".to_string(), "off".to_string()),
                ("rc.preview.limit".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn parses_month_with_navigation_and_filters() {
        let cli = GlobalCli::parse_from(os(&[
            "almanac",
            "-vv",
            "month",
            "2024-02-01",
            "--next",
            "--next",
            "--prev",
            "--hide",
            "Tasks",
        ]));
        assert_eq!(cli.verbose, 2);
        match cli.command.expect("subcommand") {
            Command::Month { date, nav, filters } => {
                assert_eq!(date.as_deref(), Some("2024-02-01"));
                assert_eq!(nav.steps(), 1);
                assert_eq!(filters.hide, vec!["Tasks".to_string()]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn date_arg_accepts_today_and_iso() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 14).expect("valid date");
        assert_eq!(parse_date_arg("Today", today).expect("today"), today);
        assert_eq!(
            parse_date_arg("2024-03-01", today).expect("iso"),
            NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date")
        );
        assert!(parse_date_arg("next week", today).is_err());
    }
}
