mod object_backend;

pub use object_backend::{ByteStream, ObjectBackend, ObjectRead, ObjectWriter, ReadRequest};
