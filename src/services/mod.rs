//! Support services for image I/O

mod io;

pub use io::ImageIoService;
