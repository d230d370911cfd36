//! # Talos Core
//!
//! Core types shared by the Talos service foundation library:
//!
//! - [`JsonResponse`] — the response envelope handlers produce
//! - [`RequestContext`] — the per-request handle handlers consume
//! - [`Handler`] — the application handler contract
//!
//! ## Example
//!
//! ```rust
//! use talos_core::{Handler, JsonResponse, RequestContext};
//!
//! let handler = Handler::new(|_ctx: RequestContext| async {
//!     Some(JsonResponse::new().with_message("hello"))
//! });
//! ```

#![doc(html_root_url = "https://docs.rs/talos-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod handler;
pub mod response;

pub use context::{RawResponse, RequestContext, RequestContextBuilder, RequestId, ResponseSlot};
pub use handler::Handler;
pub use response::JsonResponse;
