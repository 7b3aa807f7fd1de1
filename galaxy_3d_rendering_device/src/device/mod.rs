/// Device module: handles, resource descriptors and the rendering device facade

pub mod handle;
pub mod handle_registry;
pub mod resource;
pub mod format;
pub mod capabilities;
pub mod config;
pub mod texture;
pub mod buffer;
pub mod sampler;
pub mod shader;
pub mod pipeline;
pub mod uniform;
pub mod vertex;
pub mod framebuffer;
pub mod interner;
pub mod command_list;
pub mod submission;
pub mod backend;
pub mod rendering_device;

#[cfg(test)]
pub(crate) mod mock_backend;

pub use handle::*;
pub use handle_registry::*;
pub use resource::*;
pub use format::{DataFormat, FormatAspect, FormatInfo, NumericKind};
pub use capabilities::*;
pub use config::*;
pub use texture::*;
pub use buffer::*;
pub use sampler::*;
pub use shader::*;
pub use pipeline::*;
pub use uniform::*;
pub use vertex::*;
pub use framebuffer::*;
pub use interner::*;
pub use command_list::*;
pub use submission::*;
pub use backend::*;
pub use rendering_device::*;
