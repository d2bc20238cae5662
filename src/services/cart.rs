use crate::models::cart::{CartLine, CartProduct, CartTotals};
use std::{
    collections::{HashMap, HashSet},
    fs,
    io::{self, Write},
    num::NonZeroU32,
    path::PathBuf,
    sync::{Arc, Mutex, RwLock},
    time::Duration,
};
use tempfile::NamedTempFile;
use thiserror::Error;
use uuid::Uuid;

/// Key the cart snapshot is stored under
pub const CART_STORAGE_KEY: &str = "cart";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Key/value storage the cart snapshot lives in, scoped to one client
pub trait CartStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Storage kept in process memory. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Storage writing one `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl CartStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;

        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        // Write then rename so a reader never sees half a snapshot
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Cart operations over an injected storage port.
///
/// Every operation reads the snapshot, applies its change and writes the
/// whole sequence back. Nothing here returns an error: unreadable snapshots
/// are treated as an empty cart and failed writes are logged.
#[derive(Debug, Clone)]
pub struct CartService<S> {
    storage: S,
}

impl<S: CartStorage> CartService<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns the stored lines, or an empty cart if there is no usable snapshot
    pub fn get_cart(&self) -> Vec<CartLine> {
        let raw = match self.storage.get(CART_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read cart snapshot: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<CartLine>>(&raw) {
            Ok(lines) => normalize(lines),
            Err(e) => {
                tracing::warn!("Discarding unparseable cart snapshot: {}", e);
                Vec::new()
            }
        }
    }

    /// Replaces the stored snapshot with `lines`, minus zero-quantity lines
    /// and repeated product ids
    pub fn save_cart(&self, lines: &[CartLine]) {
        let lines = normalize(lines.to_vec());
        let serialized = match serde_json::to_string(&lines) {
            Ok(serialized) => serialized,
            Err(e) => {
                tracing::error!("Failed to serialize cart: {}", e);
                return;
            }
        };

        if let Err(e) = self.storage.set(CART_STORAGE_KEY, &serialized) {
            tracing::error!("Failed to save cart snapshot: {}", e);
        }
    }

    /// Adds `quantity` (default 1) of a product, merging into an existing line
    pub fn add_item(&self, product: CartProduct, quantity: Option<NonZeroU32>) -> Vec<CartLine> {
        let quantity = quantity.unwrap_or(NonZeroU32::MIN);
        let mut lines = self.get_cart();

        match lines
            .iter_mut()
            .find(|line| line.product_id == product.product_id)
        {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(quantity.get());
            }
            None => lines.push(CartLine::new(product, quantity)),
        }

        self.save_cart(&lines);
        lines
    }

    /// Sets the quantity of a line; zero or negative removes it
    pub fn update_quantity(&self, product_id: &str, quantity: i64) -> Vec<CartLine> {
        if quantity <= 0 {
            return self.remove_item(product_id);
        }

        let mut lines = self.get_cart();
        let Some(line) = lines.iter_mut().find(|line| line.product_id == product_id) else {
            return lines;
        };

        line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        self.save_cart(&lines);
        lines
    }

    pub fn remove_item(&self, product_id: &str) -> Vec<CartLine> {
        let mut lines = self.get_cart();
        let before = lines.len();

        lines.retain(|line| line.product_id != product_id);

        if lines.len() != before {
            self.save_cart(&lines);
        }
        lines
    }

    pub fn clear_cart(&self) {
        self.save_cart(&[]);
    }

    pub fn total_items(&self) -> u64 {
        self.totals().total_items
    }

    pub fn total_price(&self) -> u64 {
        self.totals().total_price
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from_lines(&self.get_cart())
    }

    pub fn is_in_cart(&self, product_id: &str) -> bool {
        self.get_cart()
            .iter()
            .any(|line| line.product_id == product_id)
    }

    /// Quantity of a product in the cart, 0 if absent
    pub fn item_quantity(&self, product_id: &str) -> u32 {
        self.get_cart()
            .iter()
            .find(|line| line.product_id == product_id)
            .map_or(0, |line| line.quantity)
    }
}

/// Drops zero-quantity lines and repeated product ids (first one wins)
fn normalize(lines: Vec<CartLine>) -> Vec<CartLine> {
    let mut seen = HashSet::new();
    let before = lines.len();

    let lines: Vec<CartLine> = lines
        .into_iter()
        .filter(|line| line.quantity > 0 && seen.insert(line.product_id.clone()))
        .collect();

    if lines.len() != before {
        tracing::warn!(
            "Dropped {} invalid cart lines",
            before - lines.len()
        );
    }

    lines
}

/// Name of the snapshot file inside a cart directory
const CART_FILE: &str = "cart.json";

/// Per-client carts stored as `<root>/<uuid>/cart.json`.
///
/// Operations on one cart are serialized so concurrent requests carrying the
/// same cart id never interleave their read-modify-write cycles.
#[derive(Debug)]
pub struct CartRegistry {
    root: PathBuf,
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl CartRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(id).or_default().clone()
    }

    /// Runs `op` against one cart while holding that cart's lock. Blocks.
    pub fn with_cart<T>(&self, id: Uuid, op: impl FnOnce(&CartService<FileStorage>) -> T) -> T {
        let lock = self.lock_for(id);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        op(&CartService::new(FileStorage::new(
            self.root.join(id.to_string()),
        )))
    }

    /// Deletes carts untouched for longer than `max_age` and returns how many
    /// were removed. Directories not named by a cart id are left alone.
    pub fn remove_stale(&self, max_age: Duration) -> Result<usize, StorageError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry?;
            let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(|name| Uuid::parse_str(name).ok())
            else {
                continue;
            };
            if !entry.file_type()?.is_dir() {
                continue;
            }

            let lock = self.lock_for(id);
            let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

            let dir = entry.path();
            let snapshot = dir.join(CART_FILE);
            let touched = fs::metadata(&snapshot)
                .or_else(|_| fs::metadata(&dir))?
                .modified()?;

            // A clock that went backwards counts as fresh
            let stale = touched.elapsed().map_or(false, |age| age > max_age);
            if stale {
                fs::remove_dir_all(&dir)?;
                removed += 1;
            }
        }

        self.prune_idle_locks();
        Ok(removed)
    }

    /// Forgets locks nobody holds or waits on
    fn prune_idle_locks(&self) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}
