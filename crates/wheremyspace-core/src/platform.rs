//! Per-platform path heuristics.
//!
//! Two fixed tables drive the scanner's behavior around OS internals:
//!
//! - **protected** directories are never opened. Walking them only produces
//!   an unbounded stream of permission errors (Spotlight indexes, volume
//!   metadata, package stores, pseudo filesystems).
//! - **elevated** locations are places where a permission failure would
//!   likely go away when running with administrator rights. This table never
//!   gates traversal; it only enriches the classification of a failure.
//!
//! The tables are plain data. Hosts can extend them through
//! [`ScanConfig`](crate::ScanConfig) or by merging a deserialized
//! [`PathRules`]. Matching is pure string work and never touches the
//! filesystem, so any platform's rules can be evaluated on any host.

use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

/// Operating system the heuristics are evaluated against.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    Windows,
    #[serde(rename = "macos")]
    MacOs,
    Linux,
    Other,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Other
        }
    }

    /// Whether path comparisons ignore case on this platform.
    pub fn case_insensitive(&self) -> bool {
        matches!(self, Platform::Windows | Platform::MacOs)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

const LINUX_PROTECTED: &[&str] = &[
    "/proc",
    "/sys",
    "/dev",
    "/run",
    "/snap",
    "/var/lib/snapd",
    "lost+found",
];

const LINUX_ELEVATED: &[&str] = &[
    "/root",
    "/boot",
    "/etc",
    "/var/lib",
    "/var/log",
    "/var/cache",
    "/var/spool",
];

const MACOS_PROTECTED: &[&str] = &[
    ".Spotlight-V100",
    ".fseventsd",
    ".Trashes",
    ".DocumentRevisions-V100",
    ".TemporaryItems",
    ".MobileBackups",
    "Backups.backupdb",
    "/System/Volumes",
    "/private/var/db",
    "/private/var/vm",
    "/dev",
    "/Volumes/com.apple.TimeMachine.localsnapshots",
];

const MACOS_ELEVATED: &[&str] = &[
    "/System",
    "/Library",
    "/private",
    "/usr",
    "/bin",
    "/sbin",
    "/cores",
];

const WINDOWS_PROTECTED: &[&str] = &[
    "System Volume Information",
    "$WinREAgent",
    "$SysReset",
    "/Windows/WinSxS",
    "/Windows/Installer",
    "/Windows/servicing",
    "/Windows/CSC",
    "/ProgramData/Microsoft/Windows Defender",
];

const WINDOWS_ELEVATED: &[&str] = &[
    "$Recycle.Bin",
    "/Windows",
    "/Program Files",
    "/Program Files (x86)",
    "/ProgramData",
    "/Recovery",
    "/Config.Msi",
    "/Documents and Settings",
];

/// A single table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathRule {
    /// Matches when the final path component equals this name.
    Name(String),
    /// Matches this absolute path and everything below it.
    Prefix(String),
}

impl PathRule {
    /// Anything containing a separator is a prefix, otherwise a name.
    pub fn parse(rule: &str) -> Self {
        if rule.contains('/') || rule.contains('\\') {
            PathRule::Prefix(rule.to_string())
        } else {
            PathRule::Name(rule.to_string())
        }
    }

    fn normalized(&self, platform: Platform) -> Self {
        match self {
            PathRule::Name(name) if platform.case_insensitive() => {
                PathRule::Name(name.to_lowercase())
            }
            PathRule::Name(name) => PathRule::Name(name.clone()),
            PathRule::Prefix(prefix) => PathRule::Prefix(normalize(prefix, platform)),
        }
    }

    /// `path` must already be normalized for the same platform.
    fn matches(&self, path: &str) -> bool {
        match self {
            PathRule::Name(name) => path.rsplit('/').next() == Some(name.as_str()),
            PathRule::Prefix(prefix) => {
                if prefix.is_empty() || prefix == "/" {
                    return false;
                }
                path == prefix
                    || (path.starts_with(prefix.as_str())
                        && path.as_bytes().get(prefix.len()) == Some(&b'/'))
            }
        }
    }
}

impl From<&str> for PathRule {
    fn from(rule: &str) -> Self {
        PathRule::parse(rule)
    }
}

impl From<String> for PathRule {
    fn from(rule: String) -> Self {
        PathRule::parse(&rule)
    }
}

/// The protected and elevated tables for one platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRules {
    /// Directories that are never opened.
    #[serde(default)]
    pub protected: Vec<PathRule>,
    /// Locations where permission failures likely need elevation.
    #[serde(default)]
    pub elevated: Vec<PathRule>,
}

impl PathRules {
    /// Built-in tables for a platform.
    pub fn builtin(platform: Platform) -> Self {
        let (protected, elevated): (&[&str], &[&str]) = match platform {
            Platform::Linux => (LINUX_PROTECTED, LINUX_ELEVATED),
            Platform::MacOs => (MACOS_PROTECTED, MACOS_ELEVATED),
            Platform::Windows => (WINDOWS_PROTECTED, WINDOWS_ELEVATED),
            Platform::Other => (&[], &[]),
        };
        Self {
            protected: protected.iter().map(|r| PathRule::parse(r)).collect(),
            elevated: elevated.iter().map(|r| PathRule::parse(r)).collect(),
        }
    }

    /// Append another set of rules.
    pub fn extend(&mut self, other: PathRules) {
        self.protected.extend(other.protected);
        self.elevated.extend(other.elevated);
    }
}

/// Pure classifier over a platform's [`PathRules`].
#[derive(Debug, Clone)]
pub struct PathClassifier {
    platform: Platform,
    protected: Vec<PathRule>,
    elevated: Vec<PathRule>,
}

impl PathClassifier {
    /// Classifier using the built-in tables for `platform`.
    pub fn new(platform: Platform) -> Self {
        Self::with_rules(platform, PathRules::builtin(platform))
    }

    /// Classifier using an explicit rule set.
    pub fn with_rules(platform: Platform, rules: PathRules) -> Self {
        Self {
            platform,
            protected: rules
                .protected
                .iter()
                .map(|r| r.normalized(platform))
                .collect(),
            elevated: rules
                .elevated
                .iter()
                .map(|r| r.normalized(platform))
                .collect(),
        }
    }

    /// Platform the rules are evaluated against.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Whether `path` must never be opened.
    pub fn is_protected(&self, path: &Path) -> bool {
        let path = normalize(&path.to_string_lossy(), self.platform);
        self.protected.iter().any(|rule| rule.matches(&path))
    }

    /// Whether a permission failure at `path` would likely be fixed by
    /// running with elevated rights.
    pub fn requires_elevated_privilege(&self, path: &Path) -> bool {
        let path = normalize(&path.to_string_lossy(), self.platform);
        self.elevated.iter().any(|rule| rule.matches(&path))
    }
}

/// Forward slashes, no verbatim or drive prefix, no trailing separator,
/// lowercased where the platform is case-insensitive.
fn normalize(path: &str, platform: Platform) -> String {
    let mut path = path.replace('\\', "/");

    for verbatim in ["//?/", "//./"] {
        if let Some(rest) = path.strip_prefix(verbatim) {
            path = rest.to_string();
            break;
        }
    }

    if platform == Platform::Windows {
        let bytes = path.as_bytes();
        if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
            path = path[2..].to_string();
        }
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
    }

    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }

    if platform.case_insensitive() {
        path = path.to_lowercase();
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_parse() {
        assert_eq!(PathRule::parse("/proc"), PathRule::Prefix("/proc".into()));
        assert_eq!(PathRule::parse("lost+found"), PathRule::Name("lost+found".into()));
        assert_eq!(
            PathRule::parse("C:\\Windows"),
            PathRule::Prefix("C:\\Windows".into())
        );
    }

    #[test]
    fn test_prefix_respects_component_boundary() {
        let classifier = PathClassifier::new(Platform::Linux);
        assert!(classifier.is_protected(Path::new("/proc")));
        assert!(classifier.is_protected(Path::new("/proc/1/fd")));
        assert!(!classifier.is_protected(Path::new("/processing")));
        assert!(!classifier.is_protected(Path::new("/home/user/proc")));
    }

    #[test]
    fn test_name_rule_matches_anywhere() {
        let classifier = PathClassifier::new(Platform::Linux);
        assert!(classifier.is_protected(Path::new("/mnt/data/lost+found")));
        assert!(!classifier.is_protected(Path::new("/mnt/data/lost+found-not")));
    }

    #[test]
    fn test_macos_is_case_insensitive() {
        let classifier = PathClassifier::new(Platform::MacOs);
        assert!(classifier.is_protected(Path::new("/Volumes/Backup/.spotlight-v100")));
        assert!(classifier.is_protected(Path::new("/System/Volumes/Data")));
        assert!(classifier.requires_elevated_privilege(Path::new("/library/Caches")));
        assert!(!classifier.is_protected(Path::new("/Users/me/Documents")));
    }

    #[test]
    fn test_windows_paths_on_any_host() {
        let classifier = PathClassifier::new(Platform::Windows);
        assert!(classifier.is_protected(Path::new(r"D:\System Volume Information")));
        assert!(classifier.is_protected(Path::new(r"C:\Windows\WinSxS\amd64_x")));
        assert!(classifier.requires_elevated_privilege(Path::new(r"C:\$Recycle.Bin")));
        assert!(classifier.requires_elevated_privilege(Path::new(r"\\?\C:\Program Files\App")));
        assert!(!classifier.requires_elevated_privilege(Path::new(r"C:\Users\me")));
        assert!(!classifier.is_protected(Path::new(r"C:\Windows\System32")));
    }

    #[test]
    fn test_other_platform_has_no_rules() {
        let classifier = PathClassifier::new(Platform::Other);
        assert!(!classifier.is_protected(Path::new("/proc")));
        assert!(!classifier.requires_elevated_privilege(Path::new("/root")));
    }

    #[test]
    fn test_extended_rules() {
        let mut rules = PathRules::builtin(Platform::Linux);
        rules.extend(PathRules {
            protected: vec![PathRule::parse("node_modules")],
            elevated: vec![PathRule::parse("/srv/secret/")],
        });
        let classifier = PathClassifier::with_rules(Platform::Linux, rules);
        assert!(classifier.is_protected(Path::new("/home/me/app/node_modules")));
        assert!(classifier.requires_elevated_privilege(Path::new("/srv/secret/keys")));
        assert!(classifier.is_protected(Path::new("/sys/kernel")));
    }

    #[test]
    fn test_platform_identifier() {
        assert_eq!(Platform::MacOs.to_string(), "macos");
        let id: &'static str = Platform::Windows.into();
        assert_eq!(id, "windows");
        for platform in [Platform::Windows, Platform::MacOs, Platform::Linux, Platform::Other] {
            let json = serde_json::to_value(platform).unwrap();
            assert_eq!(json, platform.to_string());
        }
    }
}
