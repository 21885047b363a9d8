#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub mod builtin;
pub mod catalog;
pub mod codec;
pub mod error;
pub mod kind;
pub mod record;
pub mod value;

pub use builtin::*;
pub use catalog::{Catalog, FieldSpec, TypeDescriptor};
pub use codec::{decode, encode};
pub use error::{Error, Result};
pub use kind::FieldKind;
pub use record::{Field, Record};
pub use value::{Complex, Tensor, Value};
