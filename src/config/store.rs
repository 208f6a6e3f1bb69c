use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::error::StoreError;
use super::record::{CredentialRecord, Field, FieldValue, RecordPatch};

const CONFIG_DIR_NAME: &str = "playlister";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Where the credential file lives.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use `explicit` when given, otherwise the per-user default.
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        match explicit {
            Some(path) if !path.as_os_str().is_empty() => Self::new(path),
            _ => Self::default(),
        }
    }

    /// `<config dir>/playlister/config.toml`, e.g. `~/.config/playlister/config.toml`.
    pub fn default_path() -> PathBuf {
        if let Some(dirs) = directories::BaseDirs::new() {
            return dirs
                .config_dir()
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME);
        }
        directories::UserDirs::new()
            .map(|dirs| {
                dirs.home_dir()
                    .join(".config")
                    .join(CONFIG_DIR_NAME)
                    .join(CONFIG_FILE_NAME)
            })
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

/// Owner of the single [`CredentialRecord`] and its TOML file.
///
/// The file is read lazily on the first `get`/`set` and never again unless
/// [`load`](Self::load) is called explicitly. Every `set` writes the whole
/// record back immediately.
///
/// # Example
/// ```no_run
/// use playlister::config::{CredentialStore, Field, StoreConfig};
///
/// let mut store = CredentialStore::new(StoreConfig::new("/tmp/playlister.toml"));
/// store.set(Field::Client, "client-id")?;
/// assert_eq!(store.get(Field::Client)?.as_text(), Some("client-id"));
/// # Ok::<(), playlister::config::StoreError>(())
/// ```
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    record: CredentialRecord,
    loaded: bool,
}

impl CredentialStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            path: config.path,
            record: CredentialRecord::default(),
            loaded: false,
        }
    }

    pub fn new_default() -> Self {
        Self::new(StoreConfig::default())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Read access to the whole record, loading it first if needed.
    pub fn record(&mut self) -> Result<&CredentialRecord, StoreError> {
        self.ensure_loaded()?;
        Ok(&self.record)
    }

    pub fn get(&mut self, field: Field) -> Result<FieldValue, StoreError> {
        self.ensure_loaded()?;
        Ok(self.record.get(field))
    }

    pub fn get_named(&mut self, name: &str) -> Result<FieldValue, StoreError> {
        let field = Field::parse(name)?;
        self.get(field)
    }

    pub fn set(&mut self, field: Field, value: impl Into<FieldValue>) -> Result<(), StoreError> {
        self.update([(field, value.into())])
    }

    pub fn set_named(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), StoreError> {
        let field = Field::parse(name)?;
        self.set(field, value)
    }

    /// Apply several updates as one batch and persist once.
    ///
    /// Nothing changes, in memory or on disk, unless every update is valid
    /// and the write succeeds.
    pub fn update<I>(&mut self, updates: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = (Field, FieldValue)>,
    {
        self.ensure_loaded()?;
        let mut next = self.record.clone();
        for (field, value) in updates {
            next.apply(field, value)?;
        }
        write_record(&self.path, &next)?;
        self.record = next;
        Ok(())
    }

    /// Merge the file (if any) into the in-memory record.
    ///
    /// A missing file is not an error; the record keeps its defaults.
    pub fn load(&mut self) -> Result<(), StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                info!("Reading config file");
                let patch: RecordPatch =
                    toml::from_str(&raw).map_err(|err| StoreError::Malformed {
                        path: self.path.clone(),
                        message: err.to_string(),
                    })?;
                self.record.merge(patch);
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(StoreError::storage(&self.path, err)),
        }
        self.loaded = true;
        Ok(())
    }

    /// Write the full record to disk, creating parent directories first.
    pub fn persist(&self) -> Result<(), StoreError> {
        write_record(&self.path, &self.record)
    }

    fn ensure_loaded(&mut self) -> Result<(), StoreError> {
        if !self.loaded {
            self.load()?;
        }
        Ok(())
    }
}

fn write_record(path: &Path, record: &CredentialRecord) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| StoreError::storage(parent, err))?;
        }
    }
    let serialized = toml::to_string(record)?;
    info!("Writing config file");
    fs::write(path, serialized).map_err(|err| StoreError::storage(path, err))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .map_err(|err| StoreError::storage(path, err))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, CredentialStore) {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(StoreConfig::new(dir.path().join("config.toml")));
        (dir, store)
    }

    #[test]
    fn missing_file_yields_defaults_and_marks_loaded() {
        let (_dir, mut store) = temp_store();
        assert!(!store.is_loaded());
        assert_eq!(store.get(Field::Token).unwrap(), FieldValue::Text(String::new()));
        assert!(store.is_loaded());
        assert!(!store.path().exists());
    }

    #[test]
    fn file_is_read_only_on_first_access() {
        let (_dir, mut store) = temp_store();
        fs::write(store.path(), "token = 'first'\n").unwrap();
        assert_eq!(store.get(Field::Token).unwrap().as_text(), Some("first"));

        fs::write(store.path(), "token = 'second'\n").unwrap();
        assert_eq!(store.get(Field::Token).unwrap().as_text(), Some("first"));
    }

    #[test]
    fn explicit_load_rereads_the_file() {
        let (_dir, mut store) = temp_store();
        fs::write(store.path(), "token = 'first'\n").unwrap();
        store.get(Field::Token).unwrap();
        fs::write(store.path(), "token = 'second'\n").unwrap();
        store.load().unwrap();
        assert_eq!(store.get(Field::Token).unwrap().as_text(), Some("second"));
    }

    #[test]
    fn set_is_visible_immediately_and_written_through() {
        let (_dir, mut store) = temp_store();
        store.set(Field::Client, "cid").unwrap();
        assert_eq!(store.get(Field::Client).unwrap().as_text(), Some("cid"));

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("client = \"cid\""), "unexpected file: {raw}");
    }

    #[test]
    fn blind_set_keeps_fields_already_on_disk() {
        let (_dir, mut store) = temp_store();
        fs::write(store.path(), "client = 'cid'\nsecret = 'shh'\n").unwrap();
        store.set(Field::Token, "tok").unwrap();

        let mut reopened = CredentialStore::new(StoreConfig::new(store.path()));
        let record = reopened.record().unwrap();
        assert_eq!(record.client_id, "cid");
        assert_eq!(record.client_secret, "shh");
        assert_eq!(record.access_token, "tok");
    }

    #[test]
    fn named_access_rejects_unknown_fields() {
        let (_dir, mut store) = temp_store();
        assert!(matches!(
            store.get_named("username"),
            Err(StoreError::UnknownField(name)) if name == "username"
        ));
        assert!(matches!(
            store.set_named("username", "x"),
            Err(StoreError::UnknownField(_))
        ));
        assert!(!store.path().exists());
        assert_eq!(store.get_named("secret").unwrap().as_text(), Some(""));
    }

    #[test]
    fn rejected_batch_changes_nothing() {
        let (_dir, mut store) = temp_store();
        store.set(Field::Token, "keep").unwrap();
        let result = store.update([
            (Field::Token, FieldValue::from("lost")),
            (Field::Validity, FieldValue::from("not-a-time")),
        ]);
        assert!(matches!(result, Err(StoreError::TypeMismatch { .. })));
        assert_eq!(store.get(Field::Token).unwrap().as_text(), Some("keep"));

        let mut reopened = CredentialStore::new(StoreConfig::new(store.path()));
        assert_eq!(reopened.record().unwrap().access_token, "keep");
    }

    #[test]
    fn persist_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("config.toml");
        let mut store = CredentialStore::new(StoreConfig::new(&path));
        store.set(Field::Refresh, "ref").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn round_trip_preserves_every_field() {
        let (_dir, mut store) = temp_store();
        let mut playlists = BTreeMap::new();
        playlists.insert("weekly".to_string(), "37i9dQZEVXcJZyENOWUFo7".to_string());
        let validity = DateTime::from_timestamp(1_900_000_000, 0).unwrap();
        store
            .update([
                (Field::Client, FieldValue::from("cid")),
                (Field::Secret, FieldValue::from("secret")),
                (Field::Token, FieldValue::from("tok")),
                (Field::Refresh, FieldValue::from("ref")),
                (Field::Validity, FieldValue::from(validity)),
                (Field::Playlists, FieldValue::from(playlists)),
            ])
            .unwrap();
        let written = store.record().unwrap().clone();

        let mut reopened = CredentialStore::new(StoreConfig::new(store.path()));
        assert_eq!(reopened.record().unwrap(), &written);
    }

    #[test]
    fn malformed_file_is_reported() {
        let (_dir, mut store) = temp_store();
        fs::write(store.path(), "token = [unterminated").unwrap();
        assert!(matches!(
            store.get(Field::Token),
            Err(StoreError::Malformed { .. })
        ));
        assert!(!store.is_loaded());
    }

    #[test]
    fn unreadable_path_is_a_storage_error() {
        let dir = TempDir::new().unwrap();
        let mut store = CredentialStore::new(StoreConfig::new(dir.path()));
        assert!(matches!(
            store.get(Field::Token),
            Err(StoreError::Storage { .. })
        ));
    }

    #[test]
    #[cfg(unix)]
    fn written_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let (_dir, mut store) = temp_store();
        store.set(Field::Secret, "shh").unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn resolve_prefers_explicit_path() {
        let config = StoreConfig::resolve(Some(PathBuf::from("/tmp/custom.toml")));
        assert_eq!(config.path, PathBuf::from("/tmp/custom.toml"));
        let fallback = StoreConfig::resolve(Some(PathBuf::new()));
        assert_eq!(fallback.path, StoreConfig::default_path());
        assert!(StoreConfig::default_path().ends_with("playlister/config.toml"));
    }
}
