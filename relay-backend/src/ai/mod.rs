pub mod completion;

pub use completion::{Completer, GroqClient};
