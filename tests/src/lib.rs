//! # Message Hub Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Cross-crate flows
//!     ├── broker_flow.rs    # Registration, routing, ordering, shutdown
//!     └── runtime_flow.rs   # Loader-built graphs end to end
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p hub-tests
//!
//! # By category
//! cargo test -p hub-tests integration::
//!
//! # Benchmarks
//! cargo bench -p hub-tests
//! ```

#![allow(dead_code)]

pub mod integration;
