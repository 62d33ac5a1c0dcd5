//! Project layout resolution.
//!
//! All paths are derived from an explicit project root instead of the process
//! working directory, so the build steps never need to `chdir`.

use std::path::{Path, PathBuf};

use crate::templates::TargetVariant;

/// Repository-relative locations used by the build.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Library sources
    pub src: PathBuf,
    /// Scratch staging directory
    pub build: PathBuf,
    /// Distribution directory
    pub dist: PathBuf,
    /// Generated documentation
    pub documentation: PathBuf,
    /// Documentation tool templates patched to use the CDN
    pub doc_templates: PathBuf,
    /// Demo staging directory
    pub demo: PathBuf,
    /// Demo application template
    pub demo_template: PathBuf,
    /// Story sources embedded into the demo
    pub stories: PathBuf,
    /// Story index containing the injection placeholder
    pub story_index: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            src: PathBuf::from("src"),
            build: PathBuf::from("build"),
            dist: PathBuf::from("dist"),
            documentation: PathBuf::from("documentation"),
            doc_templates: PathBuf::from("node_modules/compodoc/src/templates"),
            demo: PathBuf::from("dist-demo"),
            demo_template: PathBuf::from("node_modules/@cloukit/library-build-chain/demo-template"),
            stories: PathBuf::from("src/demo/stories"),
            story_index: PathBuf::from("src/demo/story-index.ts"),
        }
    }
}

/// Absolute project paths anchored at a root directory.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    root: PathBuf,
    layout: Layout,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>, layout: Layout) -> Self {
        Self {
            root: root.into(),
            layout,
        }
    }

    /// Resolve a repository-relative path against the project root.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> PathBuf {
        self.resolve("package.json")
    }

    pub fn readme(&self) -> PathBuf {
        self.resolve("README.md")
    }

    pub fn src_dir(&self) -> PathBuf {
        self.resolve(&self.layout.src)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.resolve(&self.layout.build)
    }

    /// Staged copy of the source tree.
    pub fn staged_src_dir(&self) -> PathBuf {
        self.build_dir().join("src")
    }

    pub fn staged_manifest(&self) -> PathBuf {
        self.build_dir().join("package.json")
    }

    /// Compiler output for a variant, e.g. `build/_es5`.
    pub fn variant_out_dir(&self, variant: TargetVariant) -> PathBuf {
        self.build_dir().join(format!("_{}", variant.suffix()))
    }

    /// Generated compiler configuration, e.g. `tsconfig-es5.json`.
    pub fn compiler_config(&self, variant: TargetVariant) -> PathBuf {
        self.resolve(compiler_config_name(variant))
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.resolve(&self.layout.dist)
    }

    /// Bundled output for a variant, e.g. `dist/button.es5.js`.
    pub fn bundle(&self, module_id: &str, variant: TargetVariant) -> PathBuf {
        self.dist_dir()
            .join(format!("{}.{}.js", module_id, variant.suffix()))
    }

    pub fn documentation_dir(&self) -> PathBuf {
        self.resolve(&self.layout.documentation)
    }

    pub fn doc_templates_dir(&self) -> PathBuf {
        self.resolve(&self.layout.doc_templates)
    }

    pub fn demo_dir(&self) -> PathBuf {
        self.resolve(&self.layout.demo)
    }

    pub fn demo_template_dir(&self) -> PathBuf {
        self.resolve(&self.layout.demo_template)
    }

    pub fn stories_dir(&self) -> PathBuf {
        self.resolve(&self.layout.stories)
    }

    pub fn story_index(&self) -> PathBuf {
        self.resolve(&self.layout.story_index)
    }

    /// Where the demo flow parks `node_modules` while the demo dir is rebuilt.
    pub fn retained_demo_modules(&self) -> PathBuf {
        self.resolve("_dist_demo_node_modules")
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }
}

/// File name of the compiler configuration for a variant.
pub fn compiler_config_name(variant: TargetVariant) -> String {
    format!("tsconfig-{}.json", variant.suffix())
}
