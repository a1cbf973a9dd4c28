//! Scraping instructions engine
//!
//! Declarative schemes describing how to extract structured data from HTML:
//! - Scheme model (string / list / object, tagged by `type`)
//! - Path locator producing `tag > tag:nth-of-type(k)` element paths
//! - Relativizer rewriting list element paths relative to their list
//! - Interlacer merging scraped content back into a scheme
//! - Executor running a scheme over an HTML document
//! - FFI interface for host applications

pub mod error;
pub mod extractor;
pub mod ffi;
pub mod locator;
pub mod scheme;
pub mod transforms;

pub use error::{Error, Result};
pub use extractor::{execute, execute_instructions, scrape_json};
pub use locator::{locate_first, locate_path};
pub use scheme::*;
pub use transforms::*;
