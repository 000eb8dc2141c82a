use std::fmt;

/// Tag naming the kind of value a field holds.
///
/// The set is open: user types and replicable kinds introduce their own tags
/// and declare ancestors on the [`HandlerRegistry`](super::HandlerRegistry)
/// so that handlers resolve through them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataType(&'static str);

impl DataType {
    pub const BOOL: DataType = DataType("bool");
    /// Unsigned integer
    pub const INTEGER: DataType = DataType("integer");
    pub const SIGNED_INTEGER: DataType = DataType("signed_integer");
    pub const FLOAT: DataType = DataType("float");
    pub const TEXT: DataType = DataType("text");
    pub const BYTES: DataType = DataType("bytes");
    pub const BITFIELD: DataType = DataType("bitfield");
    pub const LIST: DataType = DataType("list");
    pub const STRUCT: DataType = DataType("struct");
    pub const ROLES: DataType = DataType("roles");
    /// Reference to a replicable, also the name of the root replicable kind
    pub const REPLICABLE: DataType = DataType("replicable");
    /// Name of a replicable kind
    pub const KIND: DataType = DataType("kind");

    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Debug for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataType({})", self.0)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
