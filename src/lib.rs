pub mod codec;
pub mod config;
pub mod constructors;
pub mod error;
pub mod types;

pub use codec::{Codec, ColumnResult, Registry};
pub use config::{CodecConfig, DateOrder};
pub use error::{CodecError, ConfigError};
pub use types::{Binary, Format, NativeValue, RawValue, TimezoneTable, TypeIdentifier, Zone};

pub type Result<T> = std::result::Result<T, CodecError>;
