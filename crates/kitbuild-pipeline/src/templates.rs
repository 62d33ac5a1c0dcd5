//! Generated configuration: compiler config and package descriptors.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, ConfigError};
use crate::manifest::{DependencyMap, Manifest};

/// Language level a package build targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetVariant {
    /// ES5 output, consumed by `main`/`module`
    Legacy,
    /// ES2015 output; also produces declarations and metadata
    Modern,
}

impl TargetVariant {
    /// Both variants in build order.
    pub const ALL: [TargetVariant; 2] = [TargetVariant::Legacy, TargetVariant::Modern];

    /// Suffix used in file names and as the compiler target.
    pub fn suffix(self) -> &'static str {
        match self {
            TargetVariant::Legacy => "es5",
            TargetVariant::Modern => "es2015",
        }
    }
}

impl fmt::Display for TargetVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// `tsconfig-<variant>.json` contents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompilerConfig {
    pub compiler_options: CompilerOptions,
    pub files: Vec<String>,
    pub angular_compiler_options: AngularCompilerOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    pub base_url: String,
    pub declaration: bool,
    pub strip_internal: bool,
    pub experimental_decorators: bool,
    pub emit_decorator_metadata: bool,
    pub module: String,
    pub module_resolution: String,
    pub out_dir: String,
    pub root_dir: String,
    pub lib: Vec<String>,
    pub skip_lib_check: bool,
    pub target: String,
    pub source_map: bool,
    pub inline_sources: bool,
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AngularCompilerOptions {
    pub annotate_for_closure_compiler: bool,
    pub strict_metadata_emit: bool,
    pub skip_template_codegen: bool,
    pub flat_module_out_file: String,
    pub flat_module_id: String,
}

/// Generate the compiler configuration for a variant, compiling the sources
/// staged under `build/`.
///
/// Both variants emit ES modules since the bundler consumes them; only the
/// language target and the output directory differ.
pub fn compiler_config(variant: TargetVariant, module_id: &str) -> CompilerConfig {
    compiler_config_in(variant, module_id, "build")
}

/// Like [`compiler_config`] with a custom staging directory (root-relative or
/// absolute). The staged `src` is compiled so that packages installed into
/// the staging directory resolve, and `rootDir` is the staging directory so
/// output lands in `<staging>/_<variant>/src`.
pub fn compiler_config_in(
    variant: TargetVariant,
    module_id: &str,
    staging: &str,
) -> CompilerConfig {
    let staging = staging.trim_end_matches('/');
    let staging = if staging.starts_with('/') || staging.starts_with("./") {
        staging.to_string()
    } else {
        format!("./{}", staging)
    };
    CompilerConfig {
        compiler_options: CompilerOptions {
            base_url: ".".to_string(),
            declaration: true,
            strip_internal: true,
            experimental_decorators: true,
            emit_decorator_metadata: true,
            module: "es2015".to_string(),
            module_resolution: "node".to_string(),
            out_dir: format!("{}/_{}", staging, variant.suffix()),
            root_dir: staging.clone(),
            lib: vec!["es2015".to_string(), "dom".to_string()],
            skip_lib_check: true,
            target: variant.suffix().to_string(),
            source_map: true,
            inline_sources: true,
            types: Vec::new(),
        },
        files: vec![format!("{}/src/index.ts", staging)],
        angular_compiler_options: AngularCompilerOptions {
            annotate_for_closure_compiler: true,
            strict_metadata_emit: true,
            skip_template_codegen: true,
            flat_module_out_file: format!("{}.js", module_id),
            flat_module_id: module_id.to_string(),
        },
    }
}

/// The three dependency groups a descriptor may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyLabel {
    Dependencies,
    PeerDependencies,
    DevDependencies,
}

impl DependencyLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            DependencyLabel::Dependencies => "dependencies",
            DependencyLabel::PeerDependencies => "peerDependencies",
            DependencyLabel::DevDependencies => "devDependencies",
        }
    }
}

impl FromStr for DependencyLabel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dependencies" => Ok(DependencyLabel::Dependencies),
            "peerDependencies" => Ok(DependencyLabel::PeerDependencies),
            "devDependencies" => Ok(DependencyLabel::DevDependencies),
            other => Err(ConfigError::UnknownLabel(other.to_string())),
        }
    }
}

/// A generated `package.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PackageDescriptor {
    pub name: String,
    pub version: String,
    pub description: String,
    pub main: String,
    pub module: String,
    pub es2015: String,
    pub typings: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<DependencyMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_dependencies: Option<DependencyMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_dependencies: Option<DependencyMap>,
}

impl PackageDescriptor {
    /// Read a previously written descriptor.
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let content = fs::read_to_string(path).map_err(|e| BuildError::fs(path, e))?;
        serde_json::from_str(&content).map_err(|e| {
            BuildError::Configuration(ConfigError::MalformedManifest {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        })
    }

    /// Override the published name (e.g. a scoped `@org/module`).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn slot(&mut self, label: DependencyLabel) -> &mut Option<DependencyMap> {
        match label {
            DependencyLabel::Dependencies => &mut self.dependencies,
            DependencyLabel::PeerDependencies => &mut self.peer_dependencies,
            DependencyLabel::DevDependencies => &mut self.dev_dependencies,
        }
    }
}

/// Generate a package descriptor, placing each map under its label.
///
/// Labels must be `dependencies`, `peerDependencies` or `devDependencies`, and
/// each may appear at most once.
pub fn package_descriptor(
    module_id: &str,
    version: &str,
    description: &str,
    groups: &[(&str, &DependencyMap)],
) -> Result<PackageDescriptor, ConfigError> {
    let mut descriptor = PackageDescriptor {
        name: module_id.to_string(),
        version: version.to_string(),
        description: description.to_string(),
        main: format!("{}.es5.js", module_id),
        module: format!("{}.es5.js", module_id),
        es2015: format!("{}.es2015.js", module_id),
        typings: format!("{}.d.ts", module_id),
        dependencies: None,
        peer_dependencies: None,
        dev_dependencies: None,
    };

    for (label, map) in groups {
        let label: DependencyLabel = label.parse()?;
        let slot = descriptor.slot(label);
        if slot.is_some() {
            return Err(ConfigError::DuplicateLabel(label.as_str().to_string()));
        }
        *slot = Some((*map).clone());
    }

    Ok(descriptor)
}

/// Manifest written to the staging dir before installing.
///
/// Peer and dev dependencies are merged into `dependencies` so everything the
/// compiler needs gets installed, while `peerDependencies` stays empty.
pub fn install_manifest(manifest: &Manifest) -> Result<PackageDescriptor, ConfigError> {
    let mut install_deps = manifest.peer_dependencies.clone();
    install_deps.extend(
        manifest
            .dev_dependencies
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );
    let no_peers = DependencyMap::new();

    package_descriptor(
        &manifest.module_id,
        &manifest.version,
        &manifest.description,
        &[
            ("dependencies", &install_deps),
            ("peerDependencies", &no_peers),
            ("devDependencies", &manifest.dependencies),
        ],
    )
}

/// Final publishable descriptor with every group under its original label.
pub fn final_descriptor(manifest: &Manifest) -> Result<PackageDescriptor, ConfigError> {
    let descriptor = package_descriptor(
        &manifest.module_id,
        &manifest.version,
        &manifest.description,
        &[
            ("peerDependencies", &manifest.peer_dependencies),
            ("dependencies", &manifest.dependencies),
            ("devDependencies", &manifest.dev_dependencies),
        ],
    )?;

    Ok(match &manifest.name {
        Some(name) => descriptor.with_name(name.clone()),
        None => descriptor,
    })
}
