//! Scaffolding of a new `.conduit/` directory.
//!
//! Generates a starter configuration from templates embedded in the binary:
//! - `config.toml`
//! - `runners/*.yaml`
//! - `services/*.yaml`
//!
//! # Example
//!
//! ```no_run
//! use conduit_core::init::{generate_conduit_structure, InitOptions};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = InitOptions {
//!     target_dir: PathBuf::from("."),
//!     force: false,
//!     minimal: false,
//! };
//!
//! let written = generate_conduit_structure(options).await?;
//! println!("Wrote {} files", written.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generator;
pub mod templates;

pub use error::{InitError, InitResult};
pub use generator::{generate_conduit_structure, InitOptions};
pub use templates::{get_template, list_templates};
