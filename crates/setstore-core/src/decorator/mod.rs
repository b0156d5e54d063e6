//! # Decorators
//!
//! Storages wrapping another [`SettingsStorage`](crate::storage::SettingsStorage)
//! and changing exactly one aspect of it:
//!
//! - [`DefaultModuleSettingsStorage`] substitutes a configured module for `None`
//! - [`StringifyValueSettingsStorage`] encodes values to text and decodes them on read
//! - [`DefaultValueTypeSettingsStorage`] stores text and coerces it back to the
//!   type of the caller's default
pub mod default_module;
pub mod default_value_type;
pub mod stringify;

pub use default_module::DefaultModuleSettingsStorage;
pub use default_value_type::{coerce_to_default_type, DefaultValueTypeSettingsStorage};
pub use stringify::{Decoder, Encoder, StringifyValueSettingsStorage};

#[cfg(test)]
mod tests;
