//! YouTube duration strings (`PT1H2M3S`) to display form and totals.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::model::Video;

/// Unanchored on purpose: the first `PT…` run anywhere in the input counts.
static ISO_DURATION: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"PT(?:([0-9]+)H)?(?:([0-9]+)M)?(?:([0-9]+)S)?").expect("duration pattern is valid"));

fn group<'a>(caps: &Captures<'a>, idx: usize) -> Option<&'a str> {
  caps.get(idx).map(|m| m.as_str())
}

/// Render a YouTube duration as `H:MM:SS`, `M:SS` or `0:SS`.
///
/// Input that doesn't contain a `PT` duration is returned unchanged.
/// Components are copied as written, so `PT75M` renders as `75:00`.
pub fn format_duration(iso: &str) -> String {
  let Some(caps) = ISO_DURATION.captures(iso) else {
    return iso.to_string();
  };
  let hours = group(&caps, 1);
  let minutes = group(&caps, 2).unwrap_or("");
  let seconds = group(&caps, 3).unwrap_or("");

  match (hours, group(&caps, 2)) {
    (Some(h), _) => format!("{}:{:0>2}:{:0>2}", h, minutes, seconds),
    (None, Some(m)) => format!("{}:{:0>2}", m, seconds),
    (None, None) => format!("0:{:0>2}", seconds),
  }
}

/// Total seconds in a YouTube duration. Unparseable input counts as zero;
/// oversized components saturate.
pub fn total_seconds(iso: &str) -> u64 {
  let Some(caps) = ISO_DURATION.captures(iso) else {
    return 0;
  };
  // Captures are all ASCII digits, so a parse failure can only be overflow.
  let part = |idx: usize| group(&caps, idx).map_or(0, |s| s.parse::<u64>().unwrap_or(u64::MAX));
  part(1).saturating_mul(3600).saturating_add(part(2).saturating_mul(60)).saturating_add(part(3))
}

/// Sum of every video's duration in seconds.
pub fn total_duration_seconds(videos: &[Video]) -> u64 {
  videos.iter().map(|v| total_seconds(&v.duration)).fold(0, u64::saturating_add)
}

/// Human-readable playlist length: `"1h 2m"` from one hour up, `"12 min"` below.
pub fn calculate_total_duration(videos: &[Video]) -> String {
  format_total(total_duration_seconds(videos))
}

pub fn format_total(seconds: u64) -> String {
  let hours = seconds / 3600;
  let minutes = (seconds % 3600) / 60;
  if hours > 0 { format!("{}h {}m", hours, minutes) } else { format!("{} min", minutes) }
}
