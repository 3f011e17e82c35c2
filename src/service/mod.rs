pub mod flow;

pub use flow::{acquire_credentials, run};
