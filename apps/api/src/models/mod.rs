pub mod client;
pub mod contract;
pub mod project;
pub mod template;
