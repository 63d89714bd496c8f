//! Hirewise - request rate limiting and pasted job posting parsing
//!
//! This crate provides the two self-contained server-side utilities of the
//! Hirewise job-search assistant: an in-memory fixed-window rate limiter
//! keyed by arbitrary strings, and a heuristic parser that turns a pasted
//! job description into structured form fields.

pub mod config;
pub mod error;
pub mod posting;
pub mod ratelimit;
