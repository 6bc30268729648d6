//! Marshalled object format for cache keys and values.

mod data_input;
mod data_output;
mod identified;
mod traits;

pub use data_input::{DataInput, ObjectDataInput};
pub use data_output::{DataOutput, ObjectDataOutput};
pub use identified::{DataSerializableFactory, FactoryRegistry, IdentifiedDataSerializable};
pub use traits::{Deserializable, Serializable};
