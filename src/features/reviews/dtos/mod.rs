mod review_dto;

pub use review_dto::{
    ApproveReviewDto, CreateReviewDto, CreateReviewFormDto, DeleteReviewQuery, EligibilityQuery,
    EligibilityResponseDto, ModerationCounts, RejectReviewDto, ReviewResponseDto, UpdateReviewDto,
};
