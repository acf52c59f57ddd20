use regex::Regex;
use thiserror::Error;

use crate::event::EventLink;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
  #[error("please enter a URL")]
  EmptyUrl
}

/// Byte length of a leading `http://` or
/// `https://`, any case.
fn scheme_len(url: &str) -> Option<usize> {
  Regex::new(r"(?i)^https?://")
    .ok()?
    .find(url)
    .map(|m| m.end())
}

/// Turns user input into an attachable
/// link. Bare hosts get `https://`; a
/// missing title becomes the URL without
/// its scheme.
pub fn normalize_link(
  input: &str,
  title: Option<&str>
) -> Result<EventLink, LinkError> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return Err(LinkError::EmptyUrl);
  }

  let url = if scheme_len(trimmed).is_some()
  {
    trimmed.to_string()
  } else {
    format!("https://{trimmed}")
  };

  let title = title
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .map(str::to_string)
    .unwrap_or_else(|| {
      let start =
        scheme_len(&url).unwrap_or(0);
      url[start..].to_string()
    });

  Ok(EventLink {
    url,
    title
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bare_host_gets_https() {
    let link =
      normalize_link("example.com/docs", None)
        .expect("valid link");
    assert_eq!(link.url, "https://example.com/docs");
    assert_eq!(link.title, "example.com/docs");
  }

  #[test]
  fn existing_scheme_is_kept() {
    let link = normalize_link(
      "  HTTP://intranet/wiki ",
      Some("Wiki")
    )
    .expect("valid link");
    assert_eq!(link.url, "HTTP://intranet/wiki");
    assert_eq!(link.title, "Wiki");
  }

  #[test]
  fn blank_title_falls_back_to_url() {
    let link = normalize_link(
      "https://example.com",
      Some("  ")
    )
    .expect("valid link");
    assert_eq!(link.title, "example.com");
  }

  #[test]
  fn title_drops_scheme_in_any_case() {
    let link =
      normalize_link("HTTPS://Example.com/a", None)
        .expect("valid link");
    assert_eq!(link.url, "HTTPS://Example.com/a");
    assert_eq!(link.title, "Example.com/a");
  }

  #[test]
  fn blank_input_is_rejected() {
    assert_eq!(
      normalize_link("   ", None),
      Err(LinkError::EmptyUrl)
    );
  }
}
