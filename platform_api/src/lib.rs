//! # Platform API
//!
//! The boundary between the messaging core and the world around it.
//!
//! ## Philosophy
//!
//! The core provides **mechanisms**, the platform provides **transport**:
//! - Managers route messages; platforms carry them between threads and processes
//! - Managers create components; platforms decide where they run
//! - Time is read through a [`Clock`], never ambiently
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A wire format (payloads are opaque to the platform contract)
//! - A thread scheduler (one manager per thread, run-to-completion)

pub mod clock;
pub mod error;
pub mod platform;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::MessagingError;
pub use platform::{LocalPlatform, Platform, ProcessFlags};
