pub mod errors;
pub mod function;
pub mod interpreter;
pub mod object;
pub mod reader;
pub mod scope;

pub use errors::{InterpreterError, RuntimeResult};
pub use interpreter::Interpreter;
pub use object::Value;
pub use reader::{FsReader, MemoryReader, SourceReader};
