//! Business logic services.

#![allow(missing_docs)]

pub mod admin;
pub mod analytics;
pub mod email;
pub mod expertise;
pub mod inquiry;
pub mod media;
pub mod pagination;
pub mod property;
pub mod review;
pub mod sidebar;
pub mod slug;
pub mod upload;
pub mod validation;

pub use admin::{
    AuthService, AuthSession, ChangePasswordInput, Claims, LoginInput, RegisterInput, TokenPair,
    TokenType,
};
pub use analytics::{
    AnalyticsEvent, AnalyticsService, DailyPoint, DashboardOverview, InquiryOverview,
    PropertyOverview, TopProperty,
};
pub use email::{EmailService, Mailer, RenderedEmail, SiteInfo, SmtpMailer};
pub use expertise::{CreateExpertiseInput, ExpertiseService};
pub use inquiry::{CreateInquiryInput, InquiryService, InquiryView, RespondInput, StatusStats};
pub use media::{MediaConfig, MediaService, ProcessedImage, UploadFile};
pub use pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page, PageRequest};
pub use property::{
    AmenityFlags, PropertyDetail, PropertyInput, PropertyMedia, PropertyService, PropertyStats,
    PropertySummary, PropertyUpdate,
};
pub use review::{
    CreateReviewInput, PropertyReviews, PublicReview, ReviewService, ReviewStats,
    ReviewStatusInput, ReviewView,
};
pub use sidebar::{SidebarInput, SidebarMedia, SidebarService};
pub use upload::Uploader;
