//! Build steps for publishing a component library.
//!
//! Every step delegates the heavy lifting (compiling, bundling, rendering docs,
//! installing packages) to external tools through a [`CommandRunner`] and only
//! takes care of staging files and generating configuration around them.

pub mod demo;
pub mod docs;
pub mod error;
pub mod manifest;
pub mod package;
pub mod paths;
pub mod process;
pub mod stager;
pub mod templates;

#[cfg(test)]
pub(crate) mod testing;

pub use demo::{inject_stories, render_story_cases, DemoBuilder, DemoOptions};
pub use docs::{DocsBuilder, DocsOutcome, RewriteRule};
pub use error::{BuildError, ConfigError};
pub use manifest::{DependencyMap, Manifest};
pub use package::{BuildOutcome, PackageBuilder};
pub use paths::{Layout, ProjectPaths};
pub use process::{CommandRunner, Invocation, SystemRunner, ToolError, ToolOutput, Tools};
pub use templates::{
    compiler_config, compiler_config_in, final_descriptor, install_manifest, package_descriptor,
    CompilerConfig, DependencyLabel, PackageDescriptor, TargetVariant,
};

/// Log a section banner.
pub fn banner(title: &str) {
    tracing::info!(">> ==============");
    tracing::info!(">> {}", title);
    tracing::info!(">> ==============");
}
