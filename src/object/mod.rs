//! Dynamic object model
//!
//! Beans expose a reflective call surface (`get` / `call` / `set`) so the
//! decorator can wrap any constructed object without knowing its concrete type.

pub mod bean;
pub mod value;

pub use bean::{Bean, Constructor, DynamicBean, DynamicBeanBuilder};
pub use value::{CallFn, Function, Promise, Value};
