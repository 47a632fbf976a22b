use std::{cmp::Ordering, fmt::Display};

/// Represents a version number in the format "x.y.z", where "x", "y" and "z" are integers.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct VersionNumber {
    major: u32,
    minor: u32,
    patch: u32,
}

impl Display for VersionNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &VersionNumber) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

/// A release of the mod, parsed from its tag.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Version {
    /// A normal release.
    Stable(VersionNumber),

    /// A pre-release such as "1.4.0-beta.2". Holds the label ("beta") and its number (2, or 0 if
    /// the tag has no number).
    Pre(VersionNumber, String, u32),
}

impl Version {
    /// Parses a release tag such as "v1.3.0" or "1.4.0-beta.2". Returns `None` if the tag isn't a
    /// version.
    pub fn parse(tag: impl AsRef<str>) -> Option<Version> {
        let tag = tag.as_ref().trim();
        let tag = tag.strip_prefix(['v', 'V']).unwrap_or(tag);

        let (number, pre) = match tag.split_once('-') {
            Some((number, pre)) => (number, Some(pre)),
            None => (tag, None),
        };

        let mut dot_segments = number.splitn(3, '.');

        let major = dot_segments.next()?.parse().ok()?;
        let minor = dot_segments.next()?.parse().ok()?;

        // Tags like "v2.1" leave out the patch number.
        let patch = dot_segments.next().map_or(Ok(0), str::parse).ok()?;

        let version_number = VersionNumber {
            major,
            minor,
            patch,
        };

        let Some(pre) = pre else {
            return Some(Version::Stable(version_number));
        };

        // We allow pre-releases to have an additional number as well: "beta.1".
        let mut pre_segments = pre.splitn(2, '.');
        let label = pre_segments.next()?.to_ascii_lowercase();

        if label.is_empty() {
            return None;
        }

        // If the number isn't present, we take it to be zero.
        let pre_rev = pre_segments.next().map_or(Ok(0), str::parse).ok()?;

        Some(Version::Pre(version_number, label, pre_rev))
    }

    pub fn number(&self) -> VersionNumber {
        match self {
            Version::Stable(number) | Version::Pre(number, _, _) => *number,
        }
    }

    /// Returns true if this version is a stable release.
    pub fn is_stable(&self) -> bool {
        matches!(self, Version::Stable(_))
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Version::Stable(number) => number.fmt(f),
            Version::Pre(number, label, 0) => write!(f, "{number}-{label}"),
            Version::Pre(number, label, rev) => write!(f, "{number}-{label}.{rev}"),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Version) -> Ordering {
        match (self, other) {
            (Version::Stable(this), Version::Stable(other)) => this.cmp(other),

            (Version::Stable(this), Version::Pre(other, _, _)) => match this.cmp(other) {
                // If a stable and a pre-release have matching version numbers, the stable release
                // is greater.
                Ordering::Equal => Ordering::Greater,
                o => o,
            },

            (Version::Pre(..), Version::Stable(_)) => other.cmp(self).reverse(),

            (
                Version::Pre(this, this_label, this_rev),
                Version::Pre(other, other_label, other_rev),
            ) => this
                .cmp(other)
                // "alpha" < "beta" < "rc" happens to be alphabetical.
                .then_with(|| this_label.cmp(other_label))
                .then_with(|| this_rev.cmp(other_rev)),
        }
    }
}
