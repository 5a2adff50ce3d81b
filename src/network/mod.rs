pub mod registry;
pub mod context;
pub mod dialogue;
pub mod annotate;
pub mod table;
pub mod scorer;
pub mod aggregate;
pub mod normalize;
pub mod pipeline;
pub mod wasm;


pub use registry::*;
pub use context::*;
pub use dialogue::*;
pub use annotate::*;
pub use table::*;
pub use scorer::*;
pub use aggregate::*;
pub use normalize::*;
pub use pipeline::*;
pub use wasm::*;
