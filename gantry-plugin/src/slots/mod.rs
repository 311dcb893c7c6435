//! Concrete converter pairs for the slots the engine ships

pub mod infill;
pub mod postprocess;
pub mod simplify;

pub use infill::{InfillGenerateRequest, InfillGenerateResponse};
pub use postprocess::{PostprocessRequest, PostprocessResponse};
pub use simplify::{SimplifyRequest, SimplifyResponse};
