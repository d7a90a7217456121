pub mod config;
pub mod logger;
pub mod server;
mod assembler;
mod dates;
mod deferred;
mod error;
mod feed;
mod model;
mod pages;
mod paginator;
mod search;
mod store;
mod tags;
mod text_utils;
mod view;
mod visibility;
