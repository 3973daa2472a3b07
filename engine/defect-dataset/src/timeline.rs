//! Release timeline: date-ordered, 1-indexed releases plus the analyzed subset.

use chrono::{DateTime, Utc};

use crate::config::TagNaming;
use crate::error::DatasetError;
use crate::normalize::parse_instant;
use crate::types::{InboundRelease, Release};

/// Slack for float products of a count and a configured fraction.
pub(crate) const FRACTION_EPSILON: f64 = 1e-9;

/// Immutable, date-ordered view of a project's versions.
#[derive(Debug, Clone)]
pub struct Timeline {
  /// Released versions; `released[i].index == i + 1`.
  released: Vec<Release>,
  /// Unreleased versions in feed order, all at index `released.len() + 1`.
  unreleased: Vec<Release>,
  /// Length of the analyzed prefix of `released`.
  analyzed: usize,
}

impl Timeline {
  /// Index the feed. A version counts as released only when it is flagged
  /// released *and* carries a date; everything else is unreleased.
  pub fn build(
    feeds: &[InboundRelease],
    naming: &TagNaming,
    subset_fraction: f64,
  ) -> Result<Self, DatasetError> {
    let mut dated: Vec<(DateTime<Utc>, &InboundRelease)> = Vec::new();
    let mut undated: Vec<&InboundRelease> = Vec::new();

    for feed in feeds {
      match (&feed.date, feed.released) {
        (Some(date), true) => dated.push((parse_instant("releases[].date", date)?, feed)),
        _ => undated.push(feed),
      }
    }

    // Stable: same-day releases keep feed order.
    dated.sort_by_key(|(date, _)| *date);

    let released: Vec<Release> = dated
      .into_iter()
      .enumerate()
      .map(|(i, (date, feed))| Release {
        index: i as u32 + 1,
        id: feed.id.clone(),
        name: feed.name.clone(),
        tag: naming.derive(&feed.name),
        date: Some(date),
        released: true,
      })
      .collect();

    let next_index = released.len() as u32 + 1;
    let unreleased: Vec<Release> = undated
      .into_iter()
      .map(|feed| Release {
        index: next_index,
        id: feed.id.clone(),
        name: feed.name.clone(),
        tag: naming.derive(&feed.name),
        date: None,
        released: false,
      })
      .collect();

    let analyzed = (released.len() as f64 * subset_fraction + FRACTION_EPSILON).floor() as usize;
    if analyzed == 0 {
      return Err(DatasetError::validation(
        "releases",
        &format!(
          "analyzed subset is empty ({} released versions, fraction {})",
          released.len(),
          subset_fraction
        ),
      ));
    }

    Ok(Self {
      released,
      unreleased,
      analyzed,
    })
  }

  pub fn released(&self) -> &[Release] {
    &self.released
  }

  pub fn unreleased(&self) -> &[Release] {
    &self.unreleased
  }

  pub fn released_count(&self) -> u32 {
    self.released.len() as u32
  }

  /// The leading releases the dataset covers.
  pub fn analyzed(&self) -> &[Release] {
    &self.released[..self.analyzed]
  }

  pub fn last_analyzed(&self) -> &Release {
    &self.released[self.analyzed - 1]
  }

  /// Released version at a 1-based index.
  pub fn by_index(&self, index: u32) -> Option<&Release> {
    if index == 0 {
      return None;
    }
    self.released.get(index as usize - 1)
  }

  /// Lookup by tracker name across released and unreleased versions.
  pub fn by_name(&self, name: &str) -> Option<&Release> {
    self
      .released
      .iter()
      .chain(self.unreleased.iter())
      .find(|r| r.name == name)
  }

  pub fn first_unreleased(&self) -> Option<&Release> {
    self.unreleased.first()
  }

  /// The release current at `date`: the first one shipped on or after it,
  /// falling back to ongoing (unreleased) work.
  pub fn for_date(&self, date: &DateTime<Utc>) -> Option<&Release> {
    self
      .released
      .iter()
      .find(|r| r.date.is_some_and(|d| d >= *date))
      .or_else(|| self.first_unreleased())
  }

  /// Commit window of a released version: `(previous release date, release date]`.
  /// The first release's window is open on the left.
  pub fn window(&self, index: u32) -> Option<(Option<DateTime<Utc>>, DateTime<Utc>)> {
    let end = self.by_index(index)?.date?;
    let start = if index > 1 {
      self.by_index(index - 1).and_then(|r| r.date)
    } else {
      None
    };
    Some((start, end))
  }
}
