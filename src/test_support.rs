// In-memory adapters for every storage port, used by service and HTTP tests

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::{
    models::User, password::PasswordService, repository::UserRepository, service::AuthService,
    token::TokenService,
};
use crate::error::StoreError;
use crate::images::{
    models::{CappedInsert, LogImage},
    repository::ImageRepository,
    service::ImageService,
    storage::ImageStorage,
};
use crate::logs::{
    models::LogEntry,
    query::{listing_order, LogQuery, Page},
    repository::LogRepository,
    service::LogService,
};
use crate::AppState;

pub const TEST_SECRET: &str = "test_secret_key_for_testing_purposes";

fn unavailable() -> StoreError {
    StoreError::Backend("backend unavailable".to_string())
}

#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUsers {
    pub fn snapshot(&self) -> Vec<User> {
        self.users.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn create(&self, user: &User) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = email.to_lowercase();
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.id != user.id && u.email == user.email) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(user.clone())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.users
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[derive(Default)]
pub struct InMemoryLogs {
    entries: Mutex<HashMap<Uuid, LogEntry>>,
    fail: AtomicBool,
}

impl InMemoryLogs {
    /// Make every later call fail as if the backend were down
    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.entries.lock().unwrap().contains_key(&id)
    }

    pub fn count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl LogRepository for InMemoryLogs {
    async fn create(&self, entry: &LogEntry) -> Result<LogEntry, StoreError> {
        self.check()?;
        self.entries.lock().unwrap().insert(entry.id, entry.clone());
        Ok(entry.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<LogEntry>, StoreError> {
        self.check()?;
        Ok(self.entries.lock().unwrap().get(&id).cloned())
    }

    async fn update(&self, entry: &LogEntry) -> Result<LogEntry, StoreError> {
        self.check()?;
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(&entry.id) {
            Some(existing) if existing.user_id == entry.user_id => {
                *existing = entry.clone();
                Ok(entry.clone())
            }
            _ => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<(), StoreError> {
        self.check()?;
        let mut entries = self.entries.lock().unwrap();
        match entries.get(&id) {
            Some(entry) if entry.user_id == owner => {
                entries.remove(&id);
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }

    async fn delete_all_by_owner(&self, owner: Uuid) -> Result<u64, StoreError> {
        self.check()?;
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, e| e.user_id != owner);
        Ok((before - entries.len()) as u64)
    }

    async fn search(
        &self,
        query: &LogQuery,
        page: Page,
    ) -> Result<(Vec<LogEntry>, i64), StoreError> {
        let all = self.find_all(query).await?;
        let total = all.len() as i64;
        let items = all
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Ok((items, total))
    }

    async fn find_all(&self, query: &LogQuery) -> Result<Vec<LogEntry>, StoreError> {
        self.check()?;
        let mut matches: Vec<LogEntry> = self
            .entries
            .lock()
            .unwrap()
            .values()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        matches.sort_by(listing_order);
        Ok(matches)
    }
}

pub struct InMemoryImages {
    images: Mutex<Vec<LogImage>>,
    logs: Arc<InMemoryLogs>,
    fail_inserts: AtomicBool,
}

impl InMemoryImages {
    pub fn new(logs: Arc<InMemoryLogs>) -> Self {
        Self {
            images: Mutex::new(Vec::new()),
            logs,
            fail_inserts: AtomicBool::new(false),
        }
    }

    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.images.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageRepository for InMemoryImages {
    async fn insert_capped(&self, image: &LogImage, max: i64) -> Result<CappedInsert, StoreError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        // One lock across check and insert keeps the cap atomic
        let mut images = self.images.lock().unwrap();
        if !self.logs.contains(image.log_id) {
            return Err(StoreError::NotFound);
        }
        let count = images.iter().filter(|i| i.log_id == image.log_id).count() as i64;
        if count >= max {
            return Ok(CappedInsert::AtCapacity);
        }
        images.push(image.clone());
        Ok(CappedInsert::Inserted(image.clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<LogImage>, StoreError> {
        Ok(self.images.lock().unwrap().iter().find(|i| i.id == id).cloned())
    }

    async fn find_by_log(&self, log_id: Uuid) -> Result<Vec<LogImage>, StoreError> {
        Ok(self
            .images
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.log_id == log_id)
            .cloned()
            .collect())
    }

    async fn count_by_log(&self, log_id: Uuid) -> Result<i64, StoreError> {
        Ok(self
            .images
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.log_id == log_id)
            .count() as i64)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut images = self.images.lock().unwrap();
        let before = images.len();
        images.retain(|i| i.id != id);
        if images.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_by_log(&self, log_id: Uuid) -> Result<u64, StoreError> {
        let mut images = self.images.lock().unwrap();
        let before = images.len();
        images.retain(|i| i.log_id != log_id);
        Ok((before - images.len()) as u64)
    }

    async fn find_by_owner(&self, owner: Uuid) -> Result<Vec<LogImage>, StoreError> {
        Ok(self
            .images
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.user_id == owner)
            .cloned()
            .collect())
    }

    async fn delete_by_owner(&self, owner: Uuid) -> Result<u64, StoreError> {
        let mut images = self.images.lock().unwrap();
        let before = images.len();
        images.retain(|i| i.user_id != owner);
        Ok((before - images.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryStorage {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryStorage {
    pub fn count(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(url)
    }
}

#[async_trait]
impl ImageStorage for InMemoryStorage {
    async fn upload(
        &self,
        bytes: &[u8],
        filename: &str,
        content_type: &str,
    ) -> Result<String, StoreError> {
        let url = format!(
            "/uploads/{}{}",
            Uuid::new_v4(),
            crate::images::storage::file_extension(filename, content_type)
        );
        self.blobs.lock().unwrap().insert(url.clone(), bytes.to_vec());
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), StoreError> {
        self.blobs.lock().unwrap().remove(url);
        Ok(())
    }
}

/// Every adapter plus the wired services, for inspection from tests
pub struct TestContext {
    pub users: Arc<InMemoryUsers>,
    pub logs: Arc<InMemoryLogs>,
    pub images: Arc<InMemoryImages>,
    pub storage: Arc<InMemoryStorage>,
    pub tokens: Arc<TokenService>,
    pub log_service: LogService,
    pub image_service: ImageService,
    pub auth_service: AuthService,
}

impl TestContext {
    pub fn new() -> Self {
        let users = Arc::new(InMemoryUsers::default());
        let logs = Arc::new(InMemoryLogs::default());
        let images = Arc::new(InMemoryImages::new(logs.clone()));
        let storage = Arc::new(InMemoryStorage::default());
        let tokens = Arc::new(TokenService::new(TEST_SECRET, 900, 604_800));

        let log_service = LogService::new(logs.clone(), images.clone(), storage.clone());
        let image_service = ImageService::new(logs.clone(), images.clone(), storage.clone());
        let auth_service = AuthService::new(
            users.clone(),
            Arc::new(PasswordService::fast()),
            tokens.clone(),
            log_service.clone(),
        );

        Self {
            users,
            logs,
            images,
            storage,
            tokens,
            log_service,
            image_service,
            auth_service,
        }
    }

    pub fn state(&self) -> AppState {
        AppState {
            auth: self.auth_service.clone(),
            logs: self.log_service.clone(),
            images: self.image_service.clone(),
            tokens: self.tokens.clone(),
        }
    }
}
