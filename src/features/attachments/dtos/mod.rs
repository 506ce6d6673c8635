mod attachment_dto;

pub use attachment_dto::{
    AttachmentResponseDto, IntegrityResponseDto, ReconcileResponseDto, UploadedFile,
};
