mod codec;
mod compound;
mod data_type;
mod description;
mod error;
mod native;
mod registry;
mod replication;
mod type_flag;

pub use codec::Handler;
pub use compound::{BitfieldHandler, ListHandler, StructHandler};
pub use data_type::DataType;
pub use description::{default_description, Description, DescriptionFn, DescriptionRegistry};
pub use error::HandlerError;
pub use native::{
    BoolHandler, FloatHandler, LengthPrefixedHandler, Payload, SignedHandler, UnsignedHandler,
    DEFAULT_INTEGER_BITS, DEFAULT_MAX_LENGTH,
};
pub use registry::{HandlerFactory, HandlerRegistry};
pub use replication::{KindHandler, ReplicableRefHandler, RolesHandler};
pub use type_flag::TypeFlag;
pub(crate) use registry::{read_lock, write_lock};
