//! Database entities.

pub mod admin;
pub mod analytics;
pub mod expertise_inquiry;
pub mod inquiry;
pub mod property;
pub mod property_image;
pub mod property_review;
pub mod property_video;
pub mod sidebar_content;

pub use admin::Entity as Admin;
pub use analytics::Entity as Analytics;
pub use expertise_inquiry::Entity as ExpertiseInquiry;
pub use inquiry::Entity as Inquiry;
pub use property::Entity as Property;
pub use property_image::Entity as PropertyImage;
pub use property_review::Entity as PropertyReview;
pub use property_video::Entity as PropertyVideo;
pub use sidebar_content::Entity as SidebarContent;
