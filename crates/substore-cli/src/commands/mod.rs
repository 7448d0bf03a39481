pub mod install;
pub mod render;

pub use install::InstallCommand;
pub use render::RenderCommand;
