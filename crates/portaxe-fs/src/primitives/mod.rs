pub mod atomic_write;
pub mod copy;
pub mod walk;

pub use atomic_write::{AtomicWriteOptions, atomic_read, atomic_write};
pub use copy::copy_file;
pub use walk::{list_files, to_slash_path};
