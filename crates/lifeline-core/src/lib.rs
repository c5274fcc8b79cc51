#![cfg_attr(not(test), no_std)]

//! Board-independent core of the Lifeline alert transceivers.
//!
//! Everything in here is polled from a single cooperative loop and talks to
//! hardware only through the traits in [`input`], [`radio`], [`network`] and
//! [`provisioning`].

pub mod app;
pub mod catalog;
pub mod feedback;
pub mod history;
pub mod input;
pub mod network;
pub mod packet;
pub mod provisioning;
pub mod radio;
pub mod relay;
pub mod render;
pub mod retry;
pub mod text_policy;
