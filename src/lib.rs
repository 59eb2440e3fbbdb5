pub mod binder;
pub mod check;
pub mod directive;
pub mod driver;
pub mod pattern;
pub mod scope;
