mod extract;
mod pipeline;
mod run;

pub use extract::is_supported_document;
pub use run::run;
