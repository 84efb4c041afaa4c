use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use super::ClientResult;

pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const DOCTOR_ID_KEY: &str = "doctorId";
pub const USERNAME_KEY: &str = "username";
pub const CONVERSATION_ID_KEY: &str = "conversationId";

/// String key/value storage, the shape of browser local storage.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> ClientResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> ClientResult<()>;
    fn remove(&self, key: &str) -> ClientResult<()>;
}

#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Keeps the entries in a JSON object on disk so a session survives restarts.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> ClientResult<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, entries: &HashMap<String, String>) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }

    fn update(&self, change: impl FnOnce(&mut HashMap<String, String>)) -> ClientResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut entries = self.load()?;
        change(&mut entries);
        self.save(&entries)
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

/// Typed view over the session keys.
pub struct TokenManager<S: SessionStorage> {
    storage: S,
}

impl<S: SessionStorage> TokenManager<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn save_session(&self, token: &str, username: &str, doctor_id: Option<i64>) -> ClientResult<()> {
        self.storage.set(AUTH_TOKEN_KEY, token)?;
        self.storage.set(USERNAME_KEY, username)?;
        match doctor_id {
            Some(id) => self.storage.set(DOCTOR_ID_KEY, &id.to_string()),
            None => self.storage.remove(DOCTOR_ID_KEY),
        }
    }

    pub fn token(&self) -> ClientResult<Option<String>> {
        self.storage.get(AUTH_TOKEN_KEY)
    }

    pub fn username(&self) -> ClientResult<Option<String>> {
        self.storage.get(USERNAME_KEY)
    }

    /// Stored doctor id; an unparsable value reads as absent.
    pub fn doctor_id(&self) -> ClientResult<Option<i64>> {
        Ok(self.storage.get(DOCTOR_ID_KEY)?.and_then(|raw| raw.parse().ok()))
    }

    pub fn conversation_id(&self) -> ClientResult<Option<String>> {
        self.storage.get(CONVERSATION_ID_KEY)
    }

    pub fn set_conversation_id(&self, conversation_id: &str) -> ClientResult<()> {
        self.storage.set(CONVERSATION_ID_KEY, conversation_id)
    }

    pub fn is_authenticated(&self) -> ClientResult<bool> {
        Ok(self.token()?.map(|t| !t.is_empty()).unwrap_or(false))
    }

    /// Forgets every session key.
    pub fn clear(&self) -> ClientResult<()> {
        for key in [AUTH_TOKEN_KEY, DOCTOR_ID_KEY, USERNAME_KEY, CONVERSATION_ID_KEY] {
            self.storage.remove(key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise<S: SessionStorage>(tokens: &TokenManager<S>) {
        assert!(!tokens.is_authenticated().unwrap());

        tokens.save_session("jwt-value", "jperez", Some(12)).unwrap();
        tokens.set_conversation_id("conv-9").unwrap();
        assert!(tokens.is_authenticated().unwrap());
        assert_eq!(tokens.token().unwrap().as_deref(), Some("jwt-value"));
        assert_eq!(tokens.username().unwrap().as_deref(), Some("jperez"));
        assert_eq!(tokens.doctor_id().unwrap(), Some(12));
        assert_eq!(tokens.conversation_id().unwrap().as_deref(), Some("conv-9"));

        tokens.save_session("second", "admin", None).unwrap();
        assert_eq!(tokens.doctor_id().unwrap(), None);

        tokens.clear().unwrap();
        assert!(!tokens.is_authenticated().unwrap());
        assert_eq!(tokens.conversation_id().unwrap(), None);
    }

    #[test]
    fn memory_storage_session_lifecycle() {
        exercise(&TokenManager::new(MemoryStorage::new()));
    }

    #[test]
    fn file_storage_session_lifecycle_and_persistence() {
        let path = std::env::temp_dir().join(format!("medbot-session-{}.json", uuid::Uuid::new_v4()));
        exercise(&TokenManager::new(FileStorage::new(&path)));

        let first = TokenManager::new(FileStorage::new(&path));
        first.save_session("persisted", "jperez", Some(3)).unwrap();
        let reopened = TokenManager::new(FileStorage::new(&path));
        assert_eq!(reopened.token().unwrap().as_deref(), Some("persisted"));
        assert_eq!(reopened.doctor_id().unwrap(), Some(3));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn garbage_doctor_id_reads_as_none() {
        let storage = MemoryStorage::new();
        storage.set(DOCTOR_ID_KEY, "abc").unwrap();
        assert_eq!(TokenManager::new(storage).doctor_id().unwrap(), None);
    }
}
