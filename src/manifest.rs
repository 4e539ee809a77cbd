//! The manifest type and its on-disk form.
//!
//! A manifest is a JSON array of image names, sorted by byte order:
//!
//! ```json
//! [
//!   "A.JPG",
//!   "a.png",
//!   "b.png"
//! ]
//! ```
//!
//! ## Encoding
//!
//! - Two-space indentation, one name per line, no trailing newline.
//! - An empty manifest is the two bytes `[]`.
//! - Output is pure ASCII: any other character is written as a `\uXXXX`
//!   escape, using a UTF-16 surrogate pair above U+FFFF. `DEL` is escaped too.
//!
//! The same directory therefore always produces the same bytes, which keeps
//! the file stable under version control and HTTP caching.
//!
//! ## Writing
//!
//! [`write_manifest`] stages the JSON in a temporary file next to the
//! destination and renames it into place. Readers see either the previous
//! manifest or the new one, never a truncated file, and a failed write
//! leaves the previous manifest untouched.
//!
//! The result is the same as a plain overwrite of the file:
//!
//! - A symlinked manifest is written through: the link stays, its target
//!   gets the new content.
//! - An existing manifest must be openable for writing. The platform decides,
//!   so a privileged user can replace a `0444` file and others get the OS error.
//! - If the directory refuses new files but the manifest itself is writable,
//!   the manifest is overwritten in place.

use serde::{Deserialize, Serialize};
use serde_json::ser::{Formatter, PrettyFormatter};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("cannot write manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot encode manifest: {0}")]
    Json(#[from] serde_json::Error),
}

/// Sorted list of image names. Serializes as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    names: Vec<String>,
}

impl Manifest {
    /// Build a manifest, sorting `names` by byte order.
    ///
    /// The sort is not case-aware: `"Z.png"` comes before `"a.png"`.
    pub fn new(mut names: Vec<String>) -> Self {
        names.sort();
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The first `n` names, or all of them if there are fewer.
    pub fn preview(&self, n: usize) -> &[String] {
        &self.names[..n.min(self.names.len())]
    }

    /// Encode as pretty-printed, ASCII-only JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut buf = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut buf, AsciiPrettyFormatter::new());
        self.serialize(&mut ser)?;
        Ok(buf)
    }
}

/// Write `manifest` to `dir/file_name`, replacing any existing file.
///
/// Returns the path written. A symlinked manifest is written through to its
/// target. An existing manifest keeps its permissions, and whether it may be
/// overwritten is decided by the platform, not by its mode bits.
pub fn write_manifest(
    manifest: &Manifest,
    dir: &Path,
    file_name: &str,
) -> Result<PathBuf, WriteError> {
    let path = dir.join(file_name);
    let io_err = |source: io::Error| WriteError::Io {
        path: path.clone(),
        source,
    };

    let json = manifest.to_json()?;
    let target = resolve_target(&path).map_err(io_err)?;
    let existing = inspect_target(&target).map_err(io_err)?;
    let permissions = match &existing {
        Existing::File(permissions) => Some(permissions.clone()),
        Existing::Missing => default_permissions(),
    };

    let staging_dir = target.parent().unwrap_or(dir);
    match stage(&json, staging_dir, permissions) {
        Ok(staged) => {
            staged.persist(&target).map_err(|e| io_err(e.error))?;
        }
        // The file is writable but its directory is not: overwrite in place
        Err(e) if matches!(existing, Existing::File(_)) => {
            tracing::debug!(error = %e, "cannot stage next to manifest, overwriting in place");
            fs::write(&target, &json).map_err(io_err)?;
        }
        Err(e) => return Err(io_err(e)),
    }

    tracing::debug!(path = %target.display(), bytes = json.len(), "wrote manifest");
    Ok(path)
}

/// What is already at the destination.
enum Existing {
    Missing,
    File(fs::Permissions),
}

/// Follow a symlinked manifest to the file it points at.
fn resolve_target(path: &Path) -> io::Result<PathBuf> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => match fs::canonicalize(path) {
            Ok(resolved) => Ok(resolved),
            // Dangling link: writing creates its target
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let link = fs::read_link(path)?;
                Ok(match path.parent() {
                    Some(parent) => parent.join(link),
                    None => link,
                })
            }
            Err(e) => Err(e),
        },
        _ => Ok(path.to_path_buf()),
    }
}

/// Check that an existing target may be overwritten by opening it for
/// writing (without truncating), so the platform's own error surfaces.
fn inspect_target(target: &Path) -> io::Result<Existing> {
    match fs::metadata(target) {
        Ok(meta) => {
            fs::OpenOptions::new().write(true).open(target)?;
            Ok(Existing::File(meta.permissions()))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Existing::Missing),
        Err(e) => Err(e),
    }
}

/// Write `json` to a fresh temp file in `dir`, ready to be renamed into place.
fn stage(
    json: &[u8],
    dir: &Path,
    permissions: Option<fs::Permissions>,
) -> io::Result<NamedTempFile> {
    let mut staged = tempfile::Builder::new()
        .prefix(".images-manifest")
        .tempfile_in(dir)?;
    staged.write_all(json)?;
    staged.as_file().sync_all()?;
    if let Some(permissions) = permissions {
        staged.as_file().set_permissions(permissions)?;
    }
    Ok(staged)
}

// Temp files are created 0600; a fresh manifest has to be readable by the web server.
#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}

/// Pretty JSON with two-space indent that escapes everything outside
/// printable ASCII.
struct AsciiPrettyFormatter<'a> {
    pretty: PrettyFormatter<'a>,
}

impl AsciiPrettyFormatter<'_> {
    fn new() -> Self {
        Self {
            pretty: PrettyFormatter::with_indent(b"  "),
        }
    }
}

impl Formatter for AsciiPrettyFormatter<'_> {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if c.is_ascii() && c != '\x7f' {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manifest(names: &[&str]) -> Manifest {
        Manifest::new(names.iter().map(|n| n.to_string()).collect())
    }

    fn json_string(m: &Manifest) -> String {
        String::from_utf8(m.to_json().unwrap()).unwrap()
    }

    #[test]
    fn new_sorts_by_byte_order() {
        let m = manifest(&["b.png", "a.png", "A.JPG"]);
        assert_eq!(m.names(), &["A.JPG", "a.png", "b.png"]);
    }

    #[test]
    fn json_is_two_space_indented_without_trailing_newline() {
        let m = manifest(&["A.JPG", "a.png"]);
        assert_eq!(json_string(&m), "[\n  \"A.JPG\",\n  \"a.png\"\n]");
    }

    #[test]
    fn empty_manifest_is_bare_brackets() {
        assert_eq!(json_string(&Manifest::default()), "[]");
    }

    #[test]
    fn non_ascii_is_escaped() {
        let m = manifest(&["café.png"]);
        assert_eq!(json_string(&m), "[\n  \"caf\\u00e9.png\"\n]");
    }

    #[test]
    fn astral_characters_use_surrogate_pairs() {
        let m = manifest(&["\u{1F4F7}.png"]);
        assert_eq!(json_string(&m), "[\n  \"\\ud83d\\udcf7.png\"\n]");
    }

    #[test]
    fn quotes_and_backslashes_escaped() {
        let m = manifest(&["say \"hi\\\".png"]);
        assert_eq!(json_string(&m), "[\n  \"say \\\"hi\\\\\\\".png\"\n]");
    }

    #[test]
    fn del_is_escaped() {
        let m = manifest(&["a\x7fb.png"]);
        assert_eq!(json_string(&m), "[\n  \"a\\u007fb.png\"\n]");
    }

    #[test]
    fn json_parses_back_to_same_names() {
        let m = manifest(&["é.png", "z.png", "A.JPG"]);
        let parsed: Manifest = serde_json::from_slice(&m.to_json().unwrap()).unwrap();
        assert_eq!(parsed, m);
    }

    #[test]
    fn preview_truncates() {
        let names: Vec<String> = (0..15).map(|i| format!("{i:02}.png")).collect();
        let m = Manifest::new(names);
        assert_eq!(m.preview(10).len(), 10);
        assert_eq!(m.preview(10)[9], "09.png");
        assert_eq!(m.preview(100).len(), 15);
        assert!(Manifest::default().preview(10).is_empty());
    }

    #[test]
    fn write_creates_file() {
        let tmp = TempDir::new().unwrap();
        let m = manifest(&["a.png"]);

        let path = write_manifest(&m, tmp.path(), "images.json").unwrap();
        assert_eq!(path, tmp.path().join("images.json"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "[\n  \"a.png\"\n]");
    }

    #[test]
    fn write_overwrites_existing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("images.json");
        fs::write(&path, "[\n  \"old.png\",\n  \"older.png\",\n  \"oldest.png\"\n]").unwrap();

        write_manifest(&manifest(&["new.png"]), tmp.path(), "images.json").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[\n  \"new.png\"\n]");
    }

    #[test]
    fn write_leaves_no_staging_files() {
        let tmp = TempDir::new().unwrap();
        write_manifest(&manifest(&["a.png"]), tmp.path(), "images.json").unwrap();

        let entries: Vec<String> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["images.json"]);
    }

    #[test]
    fn write_into_missing_directory_fails() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing");

        let result = write_manifest(&manifest(&["a.png"]), &missing, "images.json");
        assert!(matches!(result, Err(WriteError::Io { .. })));
        assert!(!missing.exists());
    }

    #[test]
    fn read_only_manifest_follows_platform_access() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("images.json");
        fs::write(&path, "[]").unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&path, perms).unwrap();
        // Privileged users may write read-only files; everyone else may not
        let writable = fs::OpenOptions::new().write(true).open(&path).is_ok();

        let result = write_manifest(&manifest(&["a.png"]), tmp.path(), "images.json");

        if writable {
            assert!(result.is_ok());
            assert_eq!(fs::read_to_string(&path).unwrap(), "[\n  \"a.png\"\n]");
            assert!(fs::metadata(&path).unwrap().permissions().readonly());
        } else {
            assert!(matches!(
                result,
                Err(WriteError::Io { ref source, .. })
                    if source.kind() == io::ErrorKind::PermissionDenied
            ));
            assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
        }

        // Let TempDir clean up
        let mut perms = fs::metadata(&path).unwrap().permissions();
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        fs::set_permissions(&path, perms).unwrap();
    }

    #[test]
    fn directory_in_the_way_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("images.json")).unwrap();

        let result = write_manifest(&manifest(&["a.png"]), tmp.path(), "images.json");
        assert!(matches!(result, Err(WriteError::Io { .. })));
        assert!(tmp.path().join("images.json").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_manifest_is_written_through() {
        let tmp = TempDir::new().unwrap();
        let shared = tmp.path().join("shared.json");
        fs::write(&shared, "[]").unwrap();
        let link = tmp.path().join("images.json");
        std::os::unix::fs::symlink("shared.json", &link).unwrap();

        write_manifest(&manifest(&["a.png"]), tmp.path(), "images.json").unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&shared).unwrap(), "[\n  \"a.png\"\n]");
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_creates_its_target() {
        let tmp = TempDir::new().unwrap();
        let link = tmp.path().join("images.json");
        std::os::unix::fs::symlink("shared.json", &link).unwrap();

        write_manifest(&manifest(&["a.png"]), tmp.path(), "images.json").unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(
            fs::read_to_string(tmp.path().join("shared.json")).unwrap(),
            "[\n  \"a.png\"\n]"
        );
    }

    #[cfg(unix)]
    #[test]
    fn writable_manifest_in_read_only_directory_is_overwritten() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("images");
        fs::create_dir(&dir).unwrap();
        let path = dir.join("images.json");
        fs::write(&path, "[]").unwrap();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).unwrap();

        let result = write_manifest(&manifest(&["a.png"]), &dir, "images.json");
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();

        result.unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[\n  \"a.png\"\n]");
        let entries = fs::read_dir(&dir).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[cfg(unix)]
    #[test]
    fn new_manifest_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = write_manifest(&manifest(&["a.png"]), tmp.path(), "images.json").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn overwrite_keeps_existing_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("images.json");
        fs::write(&path, "[]").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o664)).unwrap();

        write_manifest(&manifest(&["a.png"]), tmp.path(), "images.json").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o664);
    }
}
