pub mod binning;
pub mod category;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod draft;
pub mod event;
pub mod eventfile;
pub mod filter;
pub mod grid;
pub mod links;
pub mod render;
pub mod state;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info,
  warn
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

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting almanac"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.almanacrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let registry =
    eventfile::load_registry(&cfg)?;

  let events_path = cli
    .events
    .clone()
    .or_else(|| {
      cfg.get_path("events.location")
    });
  let events = match events_path {
    | Some(path) => {
      eventfile::load_events(
        &path, &registry
      )
      .with_context(|| {
        format!(
          "failed to load events from \
           {}",
          path.display()
        )
      })?
    }
    | None => {
      warn!(
        "no events file configured; \
         showing an empty calendar"
      );
      vec![]
    }
  };

  let today =
    datetime::today(cfg.timezone());
  let mut state =
    state::CalendarState::new(
      registry, events, today
    )
    .with_mini_cells(cfg.mini_cells()?);

  let mut renderer =
    render::Renderer::new(&cfg)?;

  commands::dispatch(
    &mut state,
    &cfg,
    &mut renderer,
    cli.command.unwrap_or_default(),
    today
  )?;

  info!("done");
  Ok(())
}
