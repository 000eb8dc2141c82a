use super::DataType;

/// A data type plus the metadata that selects its wire encoding.
///
/// Two flags are the same flag when every part matches, which is what the
/// handler cache keys on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeFlag {
    data_type: DataType,
    max_value: Option<u64>,
    max_bits: Option<u32>,
    max_length: Option<u64>,
    max_precision: bool,
    elements: Vec<TypeFlag>,
}

impl TypeFlag {
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            max_value: None,
            max_bits: None,
            max_length: None,
            max_precision: false,
            elements: Vec::new(),
        }
    }

    pub fn boolean() -> Self {
        Self::new(DataType::BOOL)
    }

    pub fn integer() -> Self {
        Self::new(DataType::INTEGER)
    }

    pub fn signed_integer() -> Self {
        Self::new(DataType::SIGNED_INTEGER)
    }

    pub fn float() -> Self {
        Self::new(DataType::FLOAT)
    }

    pub fn text() -> Self {
        Self::new(DataType::TEXT)
    }

    pub fn bytes() -> Self {
        Self::new(DataType::BYTES)
    }

    pub fn bitfield() -> Self {
        Self::new(DataType::BITFIELD)
    }

    pub fn list(element: TypeFlag) -> Self {
        Self::new(DataType::LIST).element(element)
    }

    pub fn structure(members: Vec<TypeFlag>) -> Self {
        let mut flag = Self::new(DataType::STRUCT);
        flag.elements = members;
        flag
    }

    pub fn roles() -> Self {
        Self::new(DataType::ROLES)
    }

    pub fn replicable() -> Self {
        Self::new(DataType::REPLICABLE)
    }

    pub fn kind() -> Self {
        Self::new(DataType::KIND)
    }

    // Builder-style metadata

    pub fn max_value(mut self, max_value: u64) -> Self {
        self.max_value = Some(max_value);
        self
    }

    pub fn max_bits(mut self, max_bits: u32) -> Self {
        self.max_bits = Some(max_bits);
        self
    }

    pub fn max_length(mut self, max_length: u64) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn max_precision(mut self) -> Self {
        self.max_precision = true;
        self
    }

    pub fn element(mut self, element: TypeFlag) -> Self {
        self.elements.push(element);
        self
    }

    // Getters

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn get_max_value(&self) -> Option<u64> {
        self.max_value
    }

    pub fn get_max_bits(&self) -> Option<u32> {
        self.max_bits
    }

    pub fn get_max_length(&self) -> Option<u64> {
        self.max_length
    }

    pub fn is_max_precision(&self) -> bool {
        self.max_precision
    }

    pub fn elements(&self) -> &[TypeFlag] {
        &self.elements
    }
}
