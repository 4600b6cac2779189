//! The presentation engine: node surface, the shared rendering contract and
//! the list, files and poster strategies.

pub mod aggregate;
pub mod episodes;
pub mod format;
pub mod list;
pub mod poster;
pub mod presentation;
pub mod scheduler;
pub mod sort;
pub mod surface;
pub mod tree;
pub mod viewport;

pub use list::ListPresentation;
pub use poster::{PosterConfig, PosterPresentation};
pub use presentation::{Activation, Presentation};
pub use sort::SortKey;
pub use tree::FilesPresentation;
