pub mod moderation;
pub mod question;
