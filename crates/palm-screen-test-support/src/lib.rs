//! Test support utilities for palm-screen.
//!
//! Provides mocks for every core port and synthetic palm image builders.
//!
//! # Example
//!
//! ```
//! use palm_screen_test_support::{MockImageSource, SyntheticImageBuilder};
//!
//! // Create synthetic test images
//! let palm = SyntheticImageBuilder::palm(128, 128);
//! let dark = SyntheticImageBuilder::black(128, 128);
//!
//! // Create mock image source
//! let source = MockImageSource::new(vec![palm, dark]);
//! ```

mod builders;
mod mocks;

pub use builders::{SyntheticImageBuilder, PALM_TONE};
pub use mocks::{
    MockCamera, MockImageSource, MockInferenceClient, MockNoticeSink, MockPersistence,
    MockProgressSink,
};
