pub mod advisory;
pub mod analysis;
pub mod color_utils;
pub mod config;
pub mod filtering;
pub mod image_input;
pub mod local;
pub mod provider;
pub mod remote;
pub mod report;
pub mod weights_cache;
