mod boundary;
mod multipart_encoder;

pub use boundary::generate_boundary;
pub use multipart_encoder::MultipartEncoder;
pub use multipart_encoder::MultipartItem;
