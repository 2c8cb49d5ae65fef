#[macro_use]
extern crate log;

mod kmlib;
pub use self::kmlib::*;
