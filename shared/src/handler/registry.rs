use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
};

use log::{debug, info};

use replicant_serde::{FloatWidth, IntegerWidth};

use super::{
    compound::{BitfieldHandler, ListHandler, StructHandler},
    native::{
        BoolHandler, FloatHandler, LengthPrefixedHandler, Payload, SignedHandler, UnsignedHandler,
        DEFAULT_INTEGER_BITS, DEFAULT_MAX_LENGTH,
    },
    DataType, Handler, HandlerError, TypeFlag,
};

/// Builds a handler for a flag; receives the registry so compound types can
/// resolve their elements
pub type HandlerFactory =
    Arc<dyn Fn(&TypeFlag, &HandlerRegistry) -> Result<Arc<dyn Handler>, HandlerError> + Send + Sync>;

pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Maps data types to handler factories and caches the handlers built for
/// each [`TypeFlag`].
///
/// Resolution tries the flag's own type, then each declared ancestor in
/// order. The type a request ends up served by is remembered, as is every
/// handler built, so repeated lookups return the same `Arc`.
pub struct HandlerRegistry {
    factories: RwLock<HashMap<DataType, HandlerFactory>>,
    ancestors: RwLock<HashMap<DataType, Vec<DataType>>>,
    served_by: RwLock<HashMap<DataType, DataType>>,
    handlers: RwLock<HashMap<TypeFlag, Arc<dyn Handler>>>,
    locked: AtomicBool,
}

impl HandlerRegistry {
    /// An empty registry, without even the native types
    pub fn empty() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
            ancestors: RwLock::new(HashMap::new()),
            served_by: RwLock::new(HashMap::new()),
            handlers: RwLock::new(HashMap::new()),
            locked: AtomicBool::new(false),
        }
    }

    /// A registry with factories for every native data type
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.insert_factory(DataType::BOOL, Arc::new(|_, _| Ok(Arc::new(BoolHandler))));
        registry.insert_factory(DataType::INTEGER, Arc::new(build_unsigned));
        registry.insert_factory(DataType::SIGNED_INTEGER, Arc::new(build_signed));
        registry.insert_factory(DataType::FLOAT, Arc::new(build_float));
        registry.insert_factory(
            DataType::TEXT,
            Arc::new(|flag, _| Ok(Arc::new(length_prefixed(Payload::Text, flag)))),
        );
        registry.insert_factory(
            DataType::BYTES,
            Arc::new(|flag, _| Ok(Arc::new(length_prefixed(Payload::Bytes, flag)))),
        );
        registry.insert_factory(
            DataType::BITFIELD,
            Arc::new(|flag, _| {
                Ok(Arc::new(BitfieldHandler::new(
                    flag.get_max_length().unwrap_or(DEFAULT_MAX_LENGTH),
                )))
            }),
        );
        registry.insert_factory(DataType::LIST, Arc::new(build_list));
        registry.insert_factory(DataType::STRUCT, Arc::new(build_struct));
        registry
    }

    /// Registers a factory for `data_type`. Fails once any handler has been
    /// resolved.
    pub fn register<F>(&self, data_type: DataType, factory: F) -> Result<(), HandlerError>
    where
        F: Fn(&TypeFlag, &HandlerRegistry) -> Result<Arc<dyn Handler>, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        if self.is_locked() {
            return Err(HandlerError::RegistryLocked { data_type });
        }
        info!("HandlerRegistry: Registering handler factory for '{data_type}'");
        self.insert_factory(data_type, Arc::new(factory));
        Ok(())
    }

    /// Declares the ancestry of a type, nearest ancestor first. Allowed at
    /// any time, since new kinds may appear after the registry is locked.
    pub fn declare_type(&self, data_type: DataType, ancestors: &[DataType]) {
        debug!("HandlerRegistry: Declaring '{data_type}' with ancestors {ancestors:?}");
        write_lock(&self.ancestors).insert(data_type, ancestors.to_vec());
    }

    pub fn ancestors_of(&self, data_type: DataType) -> Vec<DataType> {
        read_lock(&self.ancestors)
            .get(&data_type)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    pub fn lock(&self) {
        self.locked.store(true, Ordering::Release);
    }

    /// Returns the handler for `flag`, building and caching it on first use
    pub fn resolve(&self, flag: &TypeFlag) -> Result<Arc<dyn Handler>, HandlerError> {
        self.lock();

        if let Some(handler) = read_lock(&self.handlers).get(flag) {
            return Ok(handler.clone());
        }

        let served_by = self.served_by(flag.data_type())?;
        let factory = read_lock(&self.factories)
            .get(&served_by)
            .cloned()
            .ok_or(HandlerError::NoHandler {
                data_type: flag.data_type(),
            })?;

        // No lock is held while the factory runs; it may resolve elements
        let handler = factory(flag, self)?;

        let mut handlers = write_lock(&self.handlers);
        Ok(handlers.entry(flag.clone()).or_insert(handler).clone())
    }

    /// The type whose factory serves `data_type`
    fn served_by(&self, data_type: DataType) -> Result<DataType, HandlerError> {
        if read_lock(&self.factories).contains_key(&data_type) {
            return Ok(data_type);
        }
        if let Some(served_by) = read_lock(&self.served_by).get(&data_type) {
            return Ok(*served_by);
        }

        let found = {
            let factories = read_lock(&self.factories);
            self.ancestors_of(data_type)
                .into_iter()
                .find(|ancestor| factories.contains_key(ancestor))
        };
        match found {
            Some(ancestor) => {
                debug!("HandlerRegistry: '{data_type}' is served by '{ancestor}'");
                write_lock(&self.served_by).insert(data_type, ancestor);
                Ok(ancestor)
            }
            None => Err(HandlerError::NoHandler { data_type }),
        }
    }

    pub(crate) fn insert_factory(&self, data_type: DataType, factory: HandlerFactory) {
        write_lock(&self.factories).insert(data_type, factory);
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn build_unsigned(flag: &TypeFlag, _: &HandlerRegistry) -> Result<Arc<dyn Handler>, HandlerError> {
    let width = match flag.get_max_value() {
        Some(max_value) => IntegerWidth::for_unsigned(max_value),
        None => IntegerWidth::from_bit_length(flag.get_max_bits().unwrap_or(DEFAULT_INTEGER_BITS))?,
    };
    Ok(Arc::new(UnsignedHandler::new(width).with_max_value(flag.get_max_value())))
}

/// `max_value` bounds the magnitude and gains a sign bit; `max_bits`
/// already counts it
fn build_signed(flag: &TypeFlag, _: &HandlerRegistry) -> Result<Arc<dyn Handler>, HandlerError> {
    let width = match flag.get_max_value() {
        Some(max_value) => IntegerWidth::for_signed(max_value)?,
        None => IntegerWidth::from_bit_length(flag.get_max_bits().unwrap_or(DEFAULT_INTEGER_BITS))?,
    };
    Ok(Arc::new(SignedHandler::new(width).with_max_magnitude(flag.get_max_value())))
}

fn build_float(flag: &TypeFlag, _: &HandlerRegistry) -> Result<Arc<dyn Handler>, HandlerError> {
    let width = if flag.is_max_precision() {
        FloatWidth::F64
    } else {
        FloatWidth::F32
    };
    Ok(Arc::new(FloatHandler::new(width)))
}

fn length_prefixed(payload: Payload, flag: &TypeFlag) -> LengthPrefixedHandler {
    LengthPrefixedHandler::new(payload, flag.get_max_length().unwrap_or(DEFAULT_MAX_LENGTH))
}

fn build_list(flag: &TypeFlag, registry: &HandlerRegistry) -> Result<Arc<dyn Handler>, HandlerError> {
    let element = flag
        .elements()
        .first()
        .ok_or(HandlerError::MissingElementType {
            data_type: flag.data_type(),
        })?;
    let element = registry.resolve(element)?;
    Ok(Arc::new(ListHandler::new(
        element,
        flag.get_max_length().unwrap_or(DEFAULT_MAX_LENGTH),
    )))
}

fn build_struct(flag: &TypeFlag, registry: &HandlerRegistry) -> Result<Arc<dyn Handler>, HandlerError> {
    if flag.elements().is_empty() {
        return Err(HandlerError::MissingElementType {
            data_type: flag.data_type(),
        });
    }
    let members = flag
        .elements()
        .iter()
        .map(|member| registry.resolve(member))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Arc::new(StructHandler::new(members)))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use replicant_serde::SerdeErr;

    use super::*;
    use crate::value::Value;

    #[test]
    fn max_value_selects_minimal_width() {
        let registry = HandlerRegistry::new();
        let wide = registry.resolve(&TypeFlag::integer().max_value(300)).unwrap();
        let narrow = registry.resolve(&TypeFlag::integer().max_value(255)).unwrap();

        assert_eq!(wide.pack(&Value::UInt(300)).unwrap().len(), 2);
        assert_eq!(narrow.pack(&Value::UInt(255)).unwrap().len(), 1);
    }

    #[test]
    fn integer_defaults_to_one_byte() {
        let registry = HandlerRegistry::new();
        let handler = registry.resolve(&TypeFlag::integer()).unwrap();
        assert_eq!(handler.fixed_size(), Some(1));
    }

    #[test]
    fn max_bits_round_up_to_power_of_two() {
        let registry = HandlerRegistry::new();
        let handler = registry.resolve(&TypeFlag::integer().max_bits(20)).unwrap();
        assert_eq!(handler.fixed_size(), Some(4));
    }

    #[test]
    fn wider_than_eight_bytes_is_a_value_error() {
        let registry = HandlerRegistry::new();
        assert_eq!(
            registry.resolve(&TypeFlag::integer().max_bits(65)).unwrap_err(),
            HandlerError::Serde(SerdeErr::IntegerTooWide { bytes: 9 })
        );
    }

    #[test]
    fn signed_max_value_adds_a_sign_bit() {
        let registry = HandlerRegistry::new();
        let handler = registry
            .resolve(&TypeFlag::signed_integer().max_value(200))
            .unwrap();
        assert_eq!(handler.fixed_size(), Some(2));
        let handler = registry
            .resolve(&TypeFlag::signed_integer().max_value(127))
            .unwrap();
        assert_eq!(handler.fixed_size(), Some(1));
    }

    #[test]
    fn resolution_is_memoized_per_flag() {
        let registry = HandlerRegistry::new();
        let first = registry.resolve(&TypeFlag::float()).unwrap();
        let second = registry.resolve(&TypeFlag::float()).unwrap();
        let precise = registry.resolve(&TypeFlag::float().max_precision()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &precise));
    }

    #[test]
    fn ancestor_factory_serves_declared_type() {
        const SCORE: DataType = DataType::new("score");
        let registry = HandlerRegistry::new();
        registry.declare_type(SCORE, &[DataType::INTEGER]);

        let handler = registry.resolve(&TypeFlag::new(SCORE).max_value(1000)).unwrap();
        assert_eq!(handler.fixed_size(), Some(2));
    }

    #[test]
    fn ancestor_walk_happens_once() {
        const DERIVED: DataType = DataType::new("derived");
        const BASE: DataType = DataType::new("base");
        let builds = Arc::new(AtomicUsize::new(0));

        let registry = HandlerRegistry::empty();
        let counter = builds.clone();
        registry
            .register(BASE, move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(BoolHandler))
            })
            .unwrap();
        registry.declare_type(DERIVED, &[BASE]);

        let first = registry.resolve(&TypeFlag::new(DERIVED)).unwrap();
        let second = registry.resolve(&TypeFlag::new(DERIVED)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(read_lock(&registry.served_by).get(&DERIVED), Some(&BASE));
    }

    #[test]
    fn unknown_type_is_a_lookup_error() {
        const MYSTERY: DataType = DataType::new("mystery");
        let registry = HandlerRegistry::new();
        assert_eq!(
            registry.resolve(&TypeFlag::new(MYSTERY)).unwrap_err(),
            HandlerError::NoHandler { data_type: MYSTERY }
        );
    }

    #[test]
    fn registration_locks_after_first_resolution() {
        const LATE: DataType = DataType::new("late");
        let registry = HandlerRegistry::new();
        registry.register(LATE, |_, _| Ok(Arc::new(BoolHandler))).unwrap();
        registry.resolve(&TypeFlag::boolean()).unwrap();

        assert!(registry.is_locked());
        assert_eq!(
            registry.register(LATE, |_, _| Ok(Arc::new(BoolHandler))),
            Err(HandlerError::RegistryLocked { data_type: LATE })
        );
    }

    #[test]
    fn list_without_element_is_rejected() {
        let registry = HandlerRegistry::new();
        assert_eq!(
            registry.resolve(&TypeFlag::new(DataType::LIST)).unwrap_err(),
            HandlerError::MissingElementType {
                data_type: DataType::LIST
            }
        );
    }

    #[test]
    fn struct_resolves_each_member() {
        let registry = HandlerRegistry::new();
        let flag = TypeFlag::structure(vec![
            TypeFlag::integer().max_value(1000),
            TypeFlag::boolean(),
        ]);
        let handler = registry.resolve(&flag).unwrap();
        let value = Value::Struct(vec![Value::UInt(999), Value::Bool(true)]);
        assert_eq!(handler.pack(&value).unwrap(), vec![0x03, 0xE7, 1]);
    }
}
