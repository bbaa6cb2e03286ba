pub mod health;
pub mod skill_download;
pub mod skill_upload;
