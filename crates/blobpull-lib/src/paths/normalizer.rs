use crate::error::BlobPullError;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Replaces a whole path segment, e.g. a folder that was renamed on the
/// storage side.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentRename {
    pub from: String,
    pub to: String,
}

/// Rules for rewriting local-looking paths into the form blobs are stored
/// under. Applying [`TransformRules::normalize`] twice gives the same result as
/// applying it once, provided [`TransformRules::validate`] accepts the rules.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct TransformRules {
    /// Single characters treated as path separators in addition to `/`.
    pub separator_aliases: Vec<String>,
    /// Single characters percent-escaped in every segment. ASCII control
    /// characters are always escaped.
    pub escape_chars: Vec<String>,
    /// Defaults to renaming `OriginalFiler` segments to `OriginalFiles`.
    pub segment_renames: Vec<SegmentRename>,
}

impl Default for TransformRules {
    fn default() -> Self {
        Self {
            separator_aliases: vec!["\\".to_string()],
            escape_chars: Vec::new(),
            segment_renames: vec![SegmentRename {
                from: "OriginalFiler".to_string(),
                to: "OriginalFiles".to_string(),
            }],
        }
    }
}

impl TransformRules {
    pub fn validate(&self) -> Result<(), BlobPullError> {
        let aliases = single_chars("separator_aliases", &self.separator_aliases)?;
        let escaped = single_chars("escape_chars", &self.escape_chars)?;

        for c in aliases.iter().chain(escaped.iter()) {
            if *c == '/' || *c == '%' || c.is_ascii_hexdigit() {
                return Err(invalid(format!(
                    "'{c}' cannot be used as a separator alias or escaped character"
                )));
            }
        }

        for rename in &self.segment_renames {
            if rename.from.is_empty() || rename.from.contains('/') {
                return Err(invalid(format!(
                    "rename source '{}' must be a single non-empty segment",
                    rename.from
                )));
            }
            if rename.to.is_empty() || rename.to == "." || rename.to.contains('/') {
                return Err(invalid(format!(
                    "rename target '{}' must be a single non-empty segment",
                    rename.to
                )));
            }
            if rename
                .to
                .chars()
                .any(|c| aliases.contains(&c) || must_escape(&escaped, c))
            {
                return Err(invalid(format!(
                    "rename target '{}' contains characters the transform rewrites",
                    rename.to
                )));
            }
            if self.segment_renames.iter().any(|r| r.from == rename.to) {
                return Err(invalid(format!(
                    "rename target '{}' is itself renamed",
                    rename.to
                )));
            }
        }
        Ok(())
    }

    /// Rewrites `raw` into canonical blob path form: separator aliases become
    /// `/`, empty and `.` segments are dropped, disallowed characters are
    /// escaped as `%XX` and whole segment renames are applied.
    pub fn normalize(&self, raw: &str) -> String {
        let aliases = leading_chars(&self.separator_aliases);
        let escaped = leading_chars(&self.escape_chars);

        let unified = raw
            .chars()
            .map(|c| if aliases.contains(&c) { '/' } else { c })
            .collect::<String>();

        unified
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .map(|segment| escape_segment(&escaped, segment))
            .map(|segment| self.rename_segment(segment))
            .join("/")
    }

    fn rename_segment(&self, segment: String) -> String {
        match self.segment_renames.iter().find(|r| r.from == segment) {
            Some(rename) => rename.to.clone(),
            None => segment,
        }
    }
}

fn must_escape(escaped: &[char], c: char) -> bool {
    c.is_ascii_control() || escaped.contains(&c)
}

fn escape_segment(escaped: &[char], segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        if must_escape(escaped, c) {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                // Writing to a String cannot fail.
                let _ = write!(out, "%{byte:02X}");
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn leading_chars(values: &[String]) -> Vec<char> {
    values.iter().filter_map(|s| s.chars().next()).collect()
}

fn single_chars(field: &str, values: &[String]) -> Result<Vec<char>, BlobPullError> {
    values
        .iter()
        .map(|value| {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(invalid(format!(
                    "{field} entries must be single characters, got '{value}'"
                ))),
            }
        })
        .collect()
}

fn invalid(details: String) -> BlobPullError {
    BlobPullError::InvalidTransformRules { details }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules_with_renames() -> TransformRules {
        TransformRules {
            escape_chars: vec!["\"".to_string(), "|".to_string()],
            segment_renames: vec![SegmentRename {
                from: "OriginalFiler".to_string(),
                to: "OriginalFiles".to_string(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_backslashes_become_forward_slashes() {
        let rules = TransformRules::default();
        assert_eq!(
            rules.normalize(r"container\folder\file.pdf"),
            "container/folder/file.pdf"
        );
    }

    #[test]
    fn test_default_rules_rename_original_filer() {
        let rules = TransformRules::default();
        assert_eq!(
            rules.normalize(r"archive\OriginalFiler\2019\scan.tif"),
            "archive/OriginalFiles/2019/scan.tif"
        );
    }

    #[test]
    fn test_redundant_separators_are_stripped() {
        let rules = TransformRules::default();
        assert_eq!(rules.normalize("/container//folder/./file.pdf/"), "container/folder/file.pdf");
        assert_eq!(rules.normalize(r"\\server\share\x"), "server/share/x");
    }

    #[test]
    fn test_disallowed_characters_are_escaped() {
        let rules = rules_with_renames();
        assert_eq!(rules.normalize("c/a\"b|c.txt"), "c/a%22b%7Cc.txt");
        assert_eq!(rules.normalize("c/tab\there"), "c/tab%09here");
        assert_eq!(rules.normalize("c/100%.txt"), "c/100%.txt");
    }

    #[test]
    fn test_segment_renames_apply_to_whole_segments() {
        let rules = rules_with_renames();
        assert_eq!(
            rules.normalize(r"data\OriginalFiler\OriginalFiler.pdf"),
            "data/OriginalFiles/OriginalFiler.pdf"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let rules = rules_with_renames();
        rules.validate().unwrap();
        let inputs = [
            "",
            "/",
            "plain/path.txt",
            r"c:\Users\me\OriginalFiler\x.pdf",
            "//a///b//",
            "./a/./b/.",
            "a/../b",
            "c/a\"b|c\u{7}.txt",
            "c/%22already-escaped",
            "c/ünïcödé/ファイル.txt",
            "OriginalFiler",
        ];
        for input in inputs {
            let once = rules.normalize(input);
            assert_eq!(rules.normalize(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_validate_rejects_rules_that_break_idempotency() {
        let percent = TransformRules {
            escape_chars: vec!["%".to_string()],
            ..Default::default()
        };
        assert!(percent.validate().is_err());

        let hex = TransformRules {
            escape_chars: vec!["A".to_string()],
            ..Default::default()
        };
        assert!(hex.validate().is_err());

        let multi = TransformRules {
            separator_aliases: vec!["::".to_string()],
            ..Default::default()
        };
        assert!(multi.validate().is_err());

        let chained = TransformRules {
            segment_renames: vec![
                SegmentRename {
                    from: "a".to_string(),
                    to: "b".to_string(),
                },
                SegmentRename {
                    from: "b".to_string(),
                    to: "c".to_string(),
                },
            ],
            ..Default::default()
        };
        assert!(chained.validate().is_err());

        let escaped_target = TransformRules {
            escape_chars: vec!["|".to_string()],
            segment_renames: vec![SegmentRename {
                from: "a".to_string(),
                to: "b|c".to_string(),
            }],
            ..Default::default()
        };
        assert!(escaped_target.validate().is_err());

        assert!(TransformRules::default().validate().is_ok());
    }
}
