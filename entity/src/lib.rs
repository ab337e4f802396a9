//! Domain snapshot models for the Sitedesk suite.
//!
//! These are the already-loaded shapes the authorization core evaluates;
//! each model implements [`platform_authz::ResourceView`] so it can be
//! handed to the engine directly, and converts into a
//! [`platform_authz::ResourceRecord`] for untyped stores.

pub mod change_request;
pub mod contract;
pub mod daily_log;
pub mod document;
pub mod inspection;
pub mod invitation;
pub mod payment;
pub mod project;
pub mod rfi;
pub mod task;
