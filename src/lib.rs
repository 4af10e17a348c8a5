#[cfg(test)]
macro_rules! inline_csv {
    ($line:literal) => {
        $line
    };
    ($line:literal, $($lines:literal),+ $(,)?) => {
        concat!($line, "\n", inline_csv!($($lines),+))
    };
}
#[cfg(test)]
pub(crate) use inline_csv;

pub mod core;
pub use crate::core::*;

pub mod error;
pub use crate::error::*;

pub mod config;
pub use crate::config::*;

pub mod reference;
pub use crate::reference::*;

pub mod transaction;
pub use crate::transaction::*;

pub mod join;
pub use crate::join::*;

pub mod aggregate;
pub use crate::aggregate::*;

pub mod nest;
pub use crate::nest::*;

pub mod pipeline;
pub use crate::pipeline::*;
