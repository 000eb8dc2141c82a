use std::{fmt, sync::Arc};

use crate::{
    handler::{Description, DescriptionFn, Handler, TypeFlag},
    value::Value,
};

use super::KindError;

/// Declaration of a replicated field
#[derive(Clone, Debug)]
pub struct Field {
    name: &'static str,
    flag: TypeFlag,
    initial_value: Value,
    notify_on_replicated: bool,
}

impl Field {
    pub fn new(name: &'static str, flag: TypeFlag) -> Self {
        Self {
            name,
            flag,
            initial_value: Value::None,
            notify_on_replicated: false,
        }
    }

    /// Declares a field by example value, inferring its data type
    pub fn from_value(name: &'static str, value: Value) -> Result<Self, KindError> {
        let data_type = value
            .data_type()
            .ok_or(KindError::UntypedField { field: name })?;
        Ok(Self::new(name, TypeFlag::new(data_type)).initial(value))
    }

    pub fn initial(mut self, value: impl Into<Value>) -> Self {
        self.initial_value = value.into();
        self
    }

    /// Runs the kind's `on_replicated` hooks when a remote write to this
    /// field commits
    pub fn notify(mut self) -> Self {
        self.notify_on_replicated = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn flag(&self) -> &TypeFlag {
        &self.flag
    }

    pub fn initial_value(&self) -> &Value {
        &self.initial_value
    }

    pub fn notify_on_replicated(&self) -> bool {
        self.notify_on_replicated
    }
}

/// A field bound into a kind: its stable index plus the handler and
/// description function resolved for it
#[derive(Clone)]
pub struct FieldDescriptor {
    index: usize,
    field: Field,
    handler: Arc<dyn Handler>,
    describe: DescriptionFn,
}

impl FieldDescriptor {
    pub(crate) fn new(
        index: usize,
        field: Field,
        handler: Arc<dyn Handler>,
        describe: DescriptionFn,
    ) -> Self {
        Self {
            index,
            field,
            handler,
            describe,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &'static str {
        self.field.name
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    pub fn describe(&self, value: &Value) -> Description {
        (self.describe)(value)
    }

    /// `None` is always assignable
    pub fn accepts(&self, value: &Value) -> bool {
        value.is_none() || self.handler.accepts(value)
    }

    pub(crate) fn set_initial(&mut self, value: Value) {
        self.field.initial_value = value;
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("index", &self.index)
            .field("field", &self.field)
            .finish()
    }
}
