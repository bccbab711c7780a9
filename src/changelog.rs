//! Changelog locator
//!
//! The update pipeline caches the changelog of the release it downloaded
//! under `<cache_dir>/changelog/`. Rendering is left to an external HTML
//! viewer, which receives a content URI scoped to that file and a read-only
//! grant instead of a filesystem path.
//!
//! A missing file is the normal state for a client that has not finished an
//! update yet, so [`ChangelogLocator::locate`] returns `None` rather than an
//! error.

use serde::Serialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Name of the changelog directory inside the cache directory
pub const CHANGELOG_DIR: &str = "changelog";
/// Changelog of the currently installed release
pub const CURRENT_CHANGELOG: &str = "current.html";
/// Content provider authority exposing cached files
pub const DEFAULT_AUTHORITY: &str = "app.seamlessupdate.client.fileprovider";
/// Viewer that can decompress and render cached changelogs
pub const DEFAULT_VIEWER: &str = "com.android.htmlviewer";

const CHANGELOG_TITLE: &str = "Changelog";
const CHANGELOG_MIME_TYPE: &str = "text/html";

/// A capability-scoped reference to a cached file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub struct ContentUri {
    authority: String,
    path: String,
}

impl ContentUri {
    pub fn new(authority: &str, root: &str, filename: &str) -> Self {
        Self {
            authority: authority.to_string(),
            path: format!("{}/{}", root, filename),
        }
    }

    pub fn scheme(&self) -> &'static str {
        "content"
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for ContentUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme(), self.authority, self.path)
    }
}

impl From<ContentUri> for String {
    fn from(uri: ContentUri) -> Self {
        uri.to_string()
    }
}

/// Permission handed to the viewer along with the URI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UriGrant {
    pub read: bool,
    pub write: bool,
}

impl UriGrant {
    pub const READ_ONLY: UriGrant = UriGrant {
        read: true,
        write: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewAction {
    View,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewCategory {
    Default,
}

/// Everything the external viewer needs to show a cached changelog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewRequest {
    pub action: ViewAction,
    pub uri: ContentUri,
    pub mime_type: String,
    pub title: String,
    pub category: ViewCategory,
    /// Only this viewer may handle the request
    pub target: String,
    pub grant: UriGrant,
}

/// Resolves cached changelog files to view requests
#[derive(Debug, Clone)]
pub struct ChangelogLocator {
    cache_dir: PathBuf,
    authority: String,
    viewer: String,
}

impl ChangelogLocator {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            authority: DEFAULT_AUTHORITY.to_string(),
            viewer: DEFAULT_VIEWER.to_string(),
        }
    }

    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    pub fn with_viewer(mut self, viewer: impl Into<String>) -> Self {
        self.viewer = viewer.into();
        self
    }

    /// Directory the update pipeline writes changelogs to
    pub fn changelog_dir(&self) -> PathBuf {
        self.cache_dir.join(CHANGELOG_DIR)
    }

    /// Build a view request for a cached changelog, `None` if not cached
    pub fn locate(&self, filename: &str) -> Option<ViewRequest> {
        if !is_plain_filename(filename) {
            log::warn!("Refusing changelog name {:?}: not a plain file name", filename);
            return None;
        }

        let path = self.changelog_dir().join(filename);
        if !path.is_file() {
            log::debug!("No cached changelog at {}", path.display());
            return None;
        }

        Some(ViewRequest {
            action: ViewAction::View,
            uri: ContentUri::new(&self.authority, CHANGELOG_DIR, filename),
            mime_type: CHANGELOG_MIME_TYPE.to_string(),
            title: CHANGELOG_TITLE.to_string(),
            category: ViewCategory::Default,
            target: self.viewer.clone(),
            grant: UriGrant::READ_ONLY,
        })
    }
}

/// A single normal path component made only of URI-safe characters
///
/// Restricting names to `[A-Za-z0-9._-]` keeps the content URI well formed
/// without percent-encoding.
fn is_plain_filename(filename: &str) -> bool {
    let mut components = Path::new(filename).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && filename
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}
