use std::{
    collections::{hash_map::DefaultHasher, HashMap},
    hash::Hasher,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, OnceLock, RwLock,
    },
};

use log::info;

use super::{
    registry::{read_lock, write_lock},
    DataType, HandlerError,
};
use crate::value::Value;

/// Cheap fingerprint of a value: equal values yield equal descriptions
pub type Description = u64;

pub type DescriptionFn = Arc<dyn Fn(&Value) -> Description + Send + Sync>;

/// Uses the value's own description when it has one, otherwise hashes its
/// structure
pub fn default_description(value: &Value) -> Description {
    if let Some(description) = value.intrinsic_description() {
        return description;
    }
    let mut hasher = DefaultHasher::new();
    value.hash_structure(&mut hasher);
    hasher.finish()
}

fn shared_default() -> DescriptionFn {
    static DEFAULT: OnceLock<DescriptionFn> = OnceLock::new();
    DEFAULT
        .get_or_init(|| Arc::new(default_description))
        .clone()
}

/// Per-type description functions, resolved through ancestors like
/// handlers and cached per type
pub struct DescriptionRegistry {
    registered: RwLock<HashMap<DataType, DescriptionFn>>,
    resolved: RwLock<HashMap<DataType, DescriptionFn>>,
    locked: AtomicBool,
}

impl DescriptionRegistry {
    pub fn new() -> Self {
        Self {
            registered: RwLock::new(HashMap::new()),
            resolved: RwLock::new(HashMap::new()),
            locked: AtomicBool::new(false),
        }
    }

    pub fn register<F>(&self, data_type: DataType, function: F) -> Result<(), HandlerError>
    where
        F: Fn(&Value) -> Description + Send + Sync + 'static,
    {
        if self.locked.load(Ordering::Acquire) {
            return Err(HandlerError::RegistryLocked { data_type });
        }
        info!("DescriptionRegistry: Registering description for '{data_type}'");
        write_lock(&self.registered).insert(data_type, Arc::new(function));
        Ok(())
    }

    /// The function describing values of `data_type`: its own registered
    /// function, else the first ancestor's, else the default
    pub fn resolve(&self, data_type: DataType, ancestors: &[DataType]) -> DescriptionFn {
        self.locked.store(true, Ordering::Release);

        if let Some(function) = read_lock(&self.resolved).get(&data_type) {
            return function.clone();
        }

        let function = {
            let registered = read_lock(&self.registered);
            std::iter::once(&data_type)
                .chain(ancestors)
                .find_map(|candidate| registered.get(candidate).cloned())
                .unwrap_or_else(shared_default)
        };

        write_lock(&self.resolved)
            .entry(data_type)
            .or_insert(function)
            .clone()
    }

    pub fn describe(&self, data_type: DataType, ancestors: &[DataType], value: &Value) -> Description {
        // A registered function for the exact type wins over the value's
        // intrinsic description; the default covers the rest
        let function = self.resolve(data_type, ancestors);
        function(value)
    }
}

impl Default for DescriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
