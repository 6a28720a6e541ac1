//! Output destinations for rendered bytes.
//!
//! A [`Writer`] receives the final (transformed) bytes of every format. The
//! orchestrator calls writers from several format threads at once, so
//! implementations synchronize internally.

mod file;
mod memory;
mod stream;

pub use file::FileWriter;
pub use memory::MemoryWriter;
pub use stream::{StderrWriter, StdoutWriter};

use crate::context::Context;
use crate::error::Result;
use crate::render::short_type_name;

/// Destination for rendered output.
pub trait Writer: Send + Sync {
    /// Persist `data` rendered for `format`.
    fn write(&self, cx: &Context, format: &str, data: &[u8]) -> Result<()>;

    /// Identity used in error reports. Defaults to the type name.
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }
}
