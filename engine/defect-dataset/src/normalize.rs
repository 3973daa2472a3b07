//! Normalize the inbound feed into canonical internal models.

use chrono::{DateTime, NaiveDate, Utc};

use crate::config::Config;
use crate::error::DatasetError;
use crate::timeline::Timeline;
use crate::types::*;

/// Parse an RFC3339 timestamp or a bare `YYYY-MM-DD` date (UTC midnight).
pub fn parse_instant(field: &str, raw: &str) -> Result<DateTime<Utc>, DatasetError> {
  if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
    return Ok(ts.with_timezone(&Utc));
  }
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|dt| dt.and_utc())
    .ok_or_else(|| {
      DatasetError::validation(field, &format!("invalid date {:?}: expected RFC3339 or YYYY-MM-DD", raw))
    })
}

/// Normalize a file path for stable comparison:
/// - backslash -> forward slash
/// - collapse repeated slashes
/// - strip leading ./
///
/// Case is kept; source trees are case-sensitive.
pub fn normalize_path(p: &str) -> String {
  let s = p.replace('\\', "/");
  let mut out = String::with_capacity(s.len());
  let mut prev_slash = false;
  for ch in s.chars() {
    if ch == '/' {
      if !prev_slash {
        out.push('/');
      }
      prev_slash = true;
    } else {
      prev_slash = false;
      out.push(ch);
    }
  }
  out.strip_prefix("./").unwrap_or(&out).to_string()
}

/// Numeric suffix of a tracker key ("AVRO-1234" -> 1234).
pub fn sequence_from_key(key: &str) -> Result<u64, DatasetError> {
  key
    .rsplit_once('-')
    .and_then(|(_, n)| n.parse::<u64>().ok())
    .ok_or_else(|| DatasetError::validation("defects[].key", &format!("no numeric suffix in {:?}", key)))
}

/// Does a commit message reference `key` as a whole token? "AVRO-12" must not
/// match "AVRO-123" or "XAVRO-12".
pub fn mentions_key(message: &str, key: &str) -> bool {
  if key.is_empty() {
    return false;
  }
  message.match_indices(key).any(|(start, _)| {
    let before_ok = message[..start]
      .chars()
      .next_back()
      .map_or(true, |c| !c.is_ascii_alphanumeric());
    let after_ok = message[start + key.len()..]
      .chars()
      .next()
      .map_or(true, |c| !c.is_ascii_digit());
    before_ok && after_ok
  })
}

/// Canonical commits: parsed dates, normalized and filtered paths, change-set sizes.
pub fn normalize_commits(raw: &[InboundCommit], config: &Config) -> Result<Vec<Commit>, DatasetError> {
  raw
    .iter()
    .map(|c| {
      let date = parse_instant("commits[].date", &c.date)?;
      let tracked: Vec<&InboundFileChange> = c
        .files
        .iter()
        .filter(|f| config.tracks(&f.path))
        .collect();
      let others = tracked.len().saturating_sub(1) as u64;
      let touched = tracked
        .into_iter()
        .map(|f| TouchedFile {
          path: normalize_path(&f.path),
          added: f.added,
          deleted: f.deleted,
          concurrent_change_set: others,
        })
        .collect();
      Ok(Commit {
        sha: c.sha.clone(),
        author: c.author.clone(),
        date,
        message: c.message.clone(),
        touched,
      })
    })
    .collect()
}

pub fn normalize_inventories(
  raw: &[InboundInventory],
  config: &Config,
) -> Result<Vec<Inventory>, DatasetError> {
  raw
    .iter()
    .map(|inv| {
      let files = inv
        .files
        .iter()
        .filter(|f| config.tracks(&f.path))
        .map(|f| {
          Ok(SourceFile {
            path: normalize_path(&f.path),
            created: parse_instant("inventories[].files[].created", &f.created)?,
            code_lines: f.code_lines,
            comment_lines: f.comment_lines,
          })
        })
        .collect::<Result<Vec<_>, DatasetError>>()?;
      Ok(Inventory {
        release: inv.release.clone(),
        files,
      })
    })
    .collect()
}

/// Resolve declared versions against the timeline, attach referencing commits,
/// and return reports sorted by key sequence.
pub fn normalize_defects(
  raw: &[InboundDefect],
  timeline: &Timeline,
  commits: &[Commit],
) -> Result<Vec<DefectReport>, DatasetError> {
  let mut reports = raw
    .iter()
    .map(|d| {
      let created = parse_instant("defects[].created", &d.created)?;
      let sequence = sequence_from_key(&d.key)?;

      let injected = d
        .affected_versions
        .iter()
        .filter_map(|name| timeline.by_name(name))
        .min_by_key(|r| r.index)
        .cloned();
      let fix = d
        .fix_versions
        .iter()
        .filter_map(|name| timeline.by_name(name))
        .max_by_key(|r| r.index)
        .cloned();
      let opening = timeline.for_date(&created).cloned();

      let linked: Vec<Commit> = commits
        .iter()
        .filter(|c| mentions_key(&c.message, &d.key))
        .cloned()
        .collect();

      let mut touched_files: Vec<String> = Vec::new();
      for path in linked.iter().flat_map(|c| c.touched.iter().map(|t| &t.path)) {
        if !touched_files.contains(path) {
          touched_files.push(path.clone());
        }
      }

      Ok(DefectReport {
        id: d.id.clone(),
        key: d.key.clone(),
        sequence,
        created,
        opening,
        fix,
        injected,
        injected_estimated: false,
        touched_files,
        commits: linked,
      })
    })
    .collect::<Result<Vec<_>, DatasetError>>()?;

  reports.sort_by_key(|r| r.sequence);
  Ok(reports)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::TagNaming;
  use chrono::TimeZone;

  #[test]
  fn parse_instant_accepts_both_formats() {
    let a = parse_instant("d", "2021-05-04").unwrap();
    assert_eq!(a, Utc.with_ymd_and_hms(2021, 5, 4, 0, 0, 0).unwrap());
    let b = parse_instant("d", "2021-05-04T10:30:00+02:00").unwrap();
    assert_eq!(b, Utc.with_ymd_and_hms(2021, 5, 4, 8, 30, 0).unwrap());
    let err = parse_instant("commits[].date", "yesterday").unwrap_err();
    assert!(err.to_string().contains("commits[].date"));
  }

  #[test]
  fn normalize_path_basics() {
    assert_eq!(normalize_path("src\\main\\Foo.java"), "src/main/Foo.java");
    assert_eq!(normalize_path("./src//lang/Bar.java"), "src/lang/Bar.java");
    assert_eq!(normalize_path("Src/Baz.java"), "Src/Baz.java");
  }

  #[test]
  fn key_sequence() {
    assert_eq!(sequence_from_key("AVRO-1234").unwrap(), 1234);
    assert_eq!(sequence_from_key("MY-PROJ-7").unwrap(), 7);
    assert!(sequence_from_key("AVRO").is_err());
  }

  #[test]
  fn key_mentions_are_whole_tokens() {
    assert!(mentions_key("AVRO-12: fix NPE", "AVRO-12"));
    assert!(mentions_key("Fixes [AVRO-12]", "AVRO-12"));
    assert!(!mentions_key("AVRO-123: other", "AVRO-12"));
    assert!(!mentions_key("XAVRO-12 typo", "AVRO-12"));
    assert!(mentions_key("AVRO-123 and AVRO-12.", "AVRO-12"));
  }

  #[test]
  fn change_set_excludes_self_and_untracked() {
    let raw = vec![InboundCommit {
      sha: "c1".into(),
      author: "ann".into(),
      date: "2020-01-10".into(),
      message: "work".into(),
      files: vec![
        InboundFileChange { path: "A.java".into(), added: 5, deleted: 1 },
        InboundFileChange { path: "B.java".into(), added: 2, deleted: 0 },
        InboundFileChange { path: "notes.md".into(), added: 9, deleted: 9 },
      ],
    }];
    let commits = normalize_commits(&raw, &Config::default()).unwrap();
    assert_eq!(commits[0].touched.len(), 2);
    assert!(commits[0].touched.iter().all(|t| t.concurrent_change_set == 1));
    assert_eq!(commits[0].touched[0].churn(), 4);
  }

  #[test]
  fn defects_resolve_versions_and_commits() {
    let releases = vec![
      InboundRelease { id: "1".into(), name: "1.0".into(), date: Some("2020-01-01".into()), released: true },
      InboundRelease { id: "2".into(), name: "1.1".into(), date: Some("2020-02-01".into()), released: true },
      InboundRelease { id: "3".into(), name: "1.2".into(), date: Some("2020-03-01".into()), released: true },
    ];
    let timeline = Timeline::build(&releases, &TagNaming::default(), 1.0).unwrap();
    let commits = normalize_commits(
      &[
        InboundCommit {
          sha: "c1".into(),
          author: "ann".into(),
          date: "2020-02-10".into(),
          message: "PROJ-2 fix".into(),
          files: vec![
            InboundFileChange { path: "A.java".into(), added: 1, deleted: 1 },
            InboundFileChange { path: "B.java".into(), added: 1, deleted: 0 },
          ],
        },
        InboundCommit {
          sha: "c2".into(),
          author: "bob".into(),
          date: "2020-02-11".into(),
          message: "PROJ-2 follow-up".into(),
          files: vec![InboundFileChange { path: "A.java".into(), added: 3, deleted: 0 }],
        },
      ],
      &Config::default(),
    )
    .unwrap();

    let defects = vec![
      InboundDefect {
        id: "200".into(),
        key: "PROJ-2".into(),
        created: "2020-01-15".into(),
        affected_versions: vec!["1.1".into(), "1.0".into(), "9.9".into()],
        fix_versions: vec!["1.1".into(), "1.2".into()],
      },
      InboundDefect {
        id: "100".into(),
        key: "PROJ-1".into(),
        created: "2020-01-15".into(),
        affected_versions: vec![],
        fix_versions: vec![],
      },
    ];

    let reports = normalize_defects(&defects, &timeline, &commits).unwrap();
    assert_eq!(reports[0].key, "PROJ-1");
    assert!(reports[0].fix.is_none());

    let r = &reports[1];
    assert_eq!(r.injected.as_ref().unwrap().name, "1.0");
    assert_eq!(r.fix.as_ref().unwrap().name, "1.2");
    assert_eq!(r.opening.as_ref().unwrap().name, "1.1");
    assert_eq!(r.commits.len(), 2);
    assert_eq!(r.touched_files, vec!["A.java".to_string(), "B.java".to_string()]);
  }
}
