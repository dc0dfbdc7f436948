//! From a successful extraction to a self-contained portable directory.
//!
//! The [`Pipeline`] drives one conversion end to end. The pieces it uses are
//! public on their own:
//!
//! - [`deps::resolve`] maps imported libraries to known redistributables.
//! - [`LayoutBuilder`] places files, stages redistributables, and writes the
//!   launcher definition, the companion documentation and the manifest.
//! - [`verify_layout`] checks a finished layout against its manifest.

pub mod deps;
mod docs;
mod error;
pub mod launcher;
mod layout;
mod manifest;
mod pipeline;

pub use deps::{DependencyRequirement, Reason, Redistributable};
pub use docs::{AppInfo, CONFIG_FILE, INFO_FILE, LauncherSettings, PortableConfig, PortableSettings, README_FILE};
pub use error::{Error, Result};
pub use launcher::{LauncherDefinition, RegistrySnapshot};
pub use layout::{LayoutBuilder, LayoutOptions, PortableLayout, SUBDIRECTORIES};
pub use manifest::{LAUNCHER_FILE, MANIFEST_FILE, Manifest, ManifestEntry, VerifyReport, verify_layout};
pub use pipeline::{ConversionReport, ConvertOptions, Pipeline, analyze};
