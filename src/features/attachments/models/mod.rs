mod attachment;

pub use attachment::Attachment;
