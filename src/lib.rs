//! Notes Bot Library
//!
//! A Telegram bot for keeping personal notes.
//!
//! This crate provides the core functionality for:
//! - Loading configuration from the environment
//! - Storing users and their text, voice and photo notes in PostgreSQL
//! - Driving the add/edit/delete/list dialogue per user
//! - Receiving updates and sending replies via the Telegram Bot API

pub mod config;
pub mod conversation;
pub mod storage;
pub mod telegram;
