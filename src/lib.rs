mod error;
mod midi_importer;
mod model;
mod timeline;
mod util;

pub use error::*;
pub use midi_importer::*;
pub use model::config::*;
pub use model::events::*;
pub use model::song::*;
pub use timeline::*;
pub use util::*;
