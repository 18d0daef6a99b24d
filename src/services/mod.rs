pub mod browser;
pub mod company;
pub mod cookies;
pub mod navigation;
pub mod notifier;
pub mod session;
pub mod token;
