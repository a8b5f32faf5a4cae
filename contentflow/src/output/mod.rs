//! Rendering and persistence of final outputs.
//!
//! Renderers are pure functions of the content and [`RenderOptions`].
//! Persistence is a separate step taken by the output node handler through an
//! [`ExecutionStore`].

mod delivery;
mod format;
mod formatter;
mod store;

pub use delivery::{checksum, DeliveryDescriptor};
pub use format::OutputFormat;
pub use formatter::{OutputFormatter, RenderOptions, RenderedArtifact, RenderedOutput};
#[cfg(test)]
pub use store::MockExecutionStore;
pub use store::{ExecutionStore, InMemoryExecutionStore, PersistedArtifact};
