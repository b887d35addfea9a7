//! Dataset handles: `owner/slug` or `owner/slug/versions/N`.

use crate::error::FetchError;
use std::fmt;
use std::str::FromStr;

/// Parsed dataset handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetHandle {
    pub owner: String,
    pub slug: String,
    /// Pinned version; `None` means "whatever the service calls current".
    pub version: Option<u32>,
}

impl DatasetHandle {
    pub fn parse(raw: &str) -> Result<Self, FetchError> {
        let invalid = |reason| FetchError::InvalidHandle {
            handle: raw.to_string(),
            reason,
        };

        let trimmed = raw.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(invalid("empty handle"));
        }

        let parts: Vec<&str> = trimmed.split('/').collect();
        let (owner, slug, version) = match parts.as_slice() {
            [owner, slug] => (*owner, *slug, None),
            [owner, slug, "versions", n] => {
                let v = n
                    .parse::<u32>()
                    .ok()
                    .filter(|v| *v > 0)
                    .ok_or_else(|| invalid("version must be a positive integer"))?;
                (*owner, *slug, Some(v))
            }
            [_, _, other, _] if *other != "versions" => {
                return Err(invalid("expected owner/slug/versions/N"))
            }
            _ => return Err(invalid("expected owner/slug or owner/slug/versions/N")),
        };

        validate_segment(owner).map_err(invalid)?;
        validate_segment(slug).map_err(invalid)?;

        Ok(DatasetHandle {
            owner: owner.to_string(),
            slug: slug.to_string(),
            version,
        })
    }

    /// Same handle pinned to `version`.
    pub fn with_version(&self, version: u32) -> Self {
        DatasetHandle {
            version: Some(version),
            ..self.clone()
        }
    }
}

/// Owner and slug end up as path components on disk and in URLs, so only a
/// conservative character set is accepted.
fn validate_segment(s: &str) -> Result<(), &'static str> {
    if s.is_empty() {
        return Err("owner and slug must be non-empty");
    }
    if s == "." || s == ".." {
        return Err("owner and slug must not be '.' or '..'");
    }
    if !s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err("owner and slug may only contain letters, digits, '-', '_' and '.'");
    }
    Ok(())
}

impl FromStr for DatasetHandle {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatasetHandle::parse(s)
    }
}

impl fmt::Display for DatasetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.slug)?;
        if let Some(v) = self.version {
            write!(f, "/versions/{}", v)?;
        }
        Ok(())
    }
}
