//! newscat - Hacker News in the terminal
//!
//! This crate fetches the Hacker News front page feed, renders it as a
//! table and lets the user open a story or refresh from a small prompt.
//!
//! The pieces are usable on their own: [`session::Session`] runs over any
//! [`fetcher::FeedSource`], async reader and writer, and
//! [`config::Config::from_str`] loads settings from TOML for embedders.

pub mod age;
mod canvas;
pub mod config;
pub mod feed;
pub mod fetcher;
pub mod render;
pub mod session;
