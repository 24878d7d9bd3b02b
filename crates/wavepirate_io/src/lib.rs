mod sink;
mod source;

pub use sink::{DirectorySinks, FileSink, WrittenFile, output_file_name};
pub use source::{SourceFile, base_name};
