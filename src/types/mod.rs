// Value types shared by the codecs
pub mod datetime_utils;
pub mod decimal_handler;
pub mod timezone;
pub mod type_identifier;
pub mod value;

pub use decimal_handler::DecimalHandler;
pub use timezone::{TimezoneTable, Zone};
pub use type_identifier::TypeIdentifier;
pub use value::{Binary, Format, NativeValue, RawValue};
