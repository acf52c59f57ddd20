use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow,
  bail
};
use chrono_tz::Tz;
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::binning::DEFAULT_PREVIEW_LIMIT;
use crate::datetime::parse_timezone;
use crate::grid::MINI_CALENDAR_CELLS;

const RC_ENV_VAR: &str = "ALMANACRC";
const RC_FILE_NAME: &str = ".almanacrc";

#[derive(Debug, Clone)]
pub struct Config {
  map:              HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Config {
  /// Built-in defaults only; no rc file.
  pub fn defaults() -> Self {
    let mut cfg = Config {
      map:          HashMap::new(),
      loaded_files: vec![]
    };

    cfg.map.insert(
      "preview.limit".to_string(),
      DEFAULT_PREVIEW_LIMIT.to_string()
    );
    cfg.map.insert(
      "mini.cells".to_string(),
      MINI_CALENDAR_CELLS.to_string()
    );
    cfg.map.insert(
      "color".to_string(),
      "on".to_string()
    );

    cfg
  }

  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Self::defaults();

    let rc =
      resolve_rc_path(rc_override)?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading almanacrc");
      cfg.load_file(&path, &mut vec![])?;
    } else {
      warn!(
        "no almanacrc found; using \
         defaults"
      );
    }

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

  /// Unknown spellings are an error rather
  /// than `false`.
  pub fn get_bool(
    &self,
    key: &str
  ) -> anyhow::Result<Option<bool>> {
    self
      .map
      .get(key)
      .map(|v| {
        parse_bool(v).ok_or_else(|| {
          anyhow!(
            "config key {key} expects on/off, \
             got {v:?}"
          )
        })
      })
      .transpose()
  }

  pub fn get_usize(
    &self,
    key: &str
  ) -> anyhow::Result<Option<usize>> {
    self
      .map
      .get(key)
      .map(|v| {
        v.trim().parse::<usize>().with_context(
          || {
            format!(
              "config key {key} expects a \
               non-negative integer, got \
               {v:?}"
            )
          }
        )
      })
      .transpose()
  }

  /// `events.location` or
  /// `categories.location`, with `~/`
  /// expanded.
  pub fn get_path(
    &self,
    key: &str
  ) -> Option<PathBuf> {
    self
      .map
      .get(key)
      .map(|v| v.trim())
      .filter(|v| !v.is_empty())
      .map(|v| expand_tilde(Path::new(v)))
  }

  pub fn preview_limit(
    &self
  ) -> anyhow::Result<usize> {
    Ok(
      self
        .get_usize("preview.limit")?
        .unwrap_or(DEFAULT_PREVIEW_LIMIT)
    )
  }

  /// Sidebar cells, clamped to whole weeks
  /// between one and six rows.
  pub fn mini_cells(
    &self
  ) -> anyhow::Result<usize> {
    let cells = self
      .get_usize("mini.cells")?
      .unwrap_or(MINI_CALENDAR_CELLS);
    let rows = (cells / 7).clamp(1, 6);
    if rows * 7 != cells {
      warn!(
        cells,
        used = rows * 7,
        "mini.cells is not a whole number of weeks"
      );
    }
    Ok(rows * 7)
  }

  pub fn timezone(&self) -> Option<Tz> {
    self.get("timezone").and_then(|raw| {
      parse_timezone(&raw, "almanacrc")
    })
  }

  /// `chain` holds the canonical paths of
  /// the files currently being read, outermost
  /// first.
  #[tracing::instrument(skip(self, chain))]
  fn load_file(
    &mut self,
    path: &Path,
    chain: &mut Vec<PathBuf>
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let canonical = fs::canonicalize(&path)
      .with_context(|| {
        format!(
          "failed to resolve {}",
          path.display()
        )
      })?;
    if chain.contains(&canonical) {
      bail!(
        "include cycle at {}",
        path.display()
      );
    }

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

    chain.push(canonical);
    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if line.is_empty()
        || line.starts_with('#')
      {
        continue;
      }

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
          self.load_file(
            &include_path,
            chain
          )?;
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
    chain.pop();

    Ok(())
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

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on" | "true" => {
      Some(true)
    }
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_the_month_view() {
    let cfg = Config::defaults();
    assert_eq!(
      cfg.preview_limit()
        .expect("numeric default"),
      2
    );
    assert_eq!(
      cfg.mini_cells()
        .expect("numeric default"),
      35
    );
    assert_eq!(
      cfg.get_bool("color")
        .expect("valid bool"),
      Some(true)
    );
    assert!(cfg.get_path("events.location").is_none());
  }

  #[test]
  fn overrides_strip_rc_prefix() {
    let mut cfg = Config::defaults();
    cfg.apply_overrides(vec![
      (
        "rc.preview.limit".to_string(),
        "3".to_string()
      ),
      (
        "color".to_string(),
        "off".to_string()
      ),
    ]);
    assert_eq!(
      cfg.preview_limit().expect("numeric"),
      3
    );
    assert_eq!(
      cfg.get_bool("color")
        .expect("valid bool"),
      Some(false)
    );
  }

  #[test]
  fn bad_numbers_are_errors() {
    let mut cfg = Config::defaults();
    cfg.apply_overrides(vec![(
      "preview.limit".to_string(),
      "two".to_string()
    )]);
    assert!(cfg.preview_limit().is_err());
  }

  #[test]
  fn mini_cells_snap_to_whole_weeks() {
    let mut cfg = Config::defaults();
    cfg.apply_overrides(vec![(
      "mini.cells".to_string(),
      "44".to_string()
    )]);
    assert_eq!(
      cfg.mini_cells().expect("numeric"),
      42
    );
    cfg.apply_overrides(vec![(
      "mini.cells".to_string(),
      "0".to_string()
    )]);
    assert_eq!(
      cfg.mini_cells().expect("numeric"),
      7
    );
  }

  #[test]
  fn parse_bool_accepts_common_spellings()
  {
    for yes in ["1", "y", "Yes", "ON", "true"]
    {
      assert_eq!(parse_bool(yes), Some(true));
    }
    for no in ["0", "n", "No", "OFF", "false"]
    {
      assert_eq!(parse_bool(no), Some(false));
    }
    assert_eq!(parse_bool("maybe"), None);
  }

  #[test]
  fn unknown_bool_spelling_is_an_error() {
    let mut cfg = Config::defaults();
    cfg.apply_overrides(vec![(
      "color".to_string(),
      "sometimes".to_string()
    )]);
    let err = cfg
      .get_bool("color")
      .expect_err("not a bool");
    assert!(
      err.to_string().contains("sometimes")
    );
  }
}
