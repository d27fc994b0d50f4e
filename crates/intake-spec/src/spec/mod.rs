pub mod question;
pub mod registry;

pub use question::{QuestionDefinition, QuestionKind};
pub use registry::{Registry, RegistryError, RegistrySpec};
