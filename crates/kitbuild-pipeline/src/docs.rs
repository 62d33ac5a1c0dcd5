//! API documentation generation.
//!
//! The documentation tool's templates reference their scripts, styles and
//! images locally. They are patched to load from a versioned CDN instead, and
//! the local copies the tool emits are pruned afterwards.

use std::fs;
use std::sync::Arc;

use regex::{NoExpand, Regex};

use crate::error::BuildError;
use crate::paths::{compiler_config_name, ProjectPaths};
use crate::process::{CommandRunner, Invocation, Tools};
use crate::stager;
use crate::templates::TargetVariant;

/// Default CDN hosting the documentation theme.
pub const DEFAULT_CDN_URL: &str = "https://cloukit.github.io/compodoc-theme/theme/1.0.0-beta.10";

/// Asset directories superseded by the CDN.
const PRUNED_ASSET_DIRS: [&str; 4] = ["fonts", "images", "styles", "js"];

/// Result of a documentation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocsOutcome {
    Generated,
    Failed,
}

/// A textual substitution applied to a set of template files.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    /// Template files relative to the templates directory
    pub files: Vec<&'static str>,
    pub pattern: Regex,
    pub replacement: String,
}

impl RewriteRule {
    fn new(files: &[&'static str], pattern: &str, replacement: String) -> Self {
        Self {
            files: files.to_vec(),
            // Patterns are compile-time constants.
            pattern: Regex::new(pattern).expect("invalid rewrite pattern"),
            replacement,
        }
    }

    /// Apply the rule to template text.
    pub fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, NoExpand(&self.replacement))
            .into_owned()
    }

    /// Rules pointing script, stylesheet, favicon and logo references at `cdn_url`.
    pub fn cdn_rules(cdn_url: &str) -> Vec<RewriteRule> {
        let cdn = cdn_url.trim_end_matches('/');
        vec![
            RewriteRule::new(
                &[
                    "page.hbs",
                    "partials/component.hbs",
                    "partials/module.hbs",
                    "partials/routes.hbs",
                    "partials/overview.hbs",
                ],
                r#"src="[^"]*js/"#,
                format!(r#"src="{}/dist/js/"#, cdn),
            ),
            RewriteRule::new(
                &["page.hbs"],
                r#"href="[^"]*styles/style\.css"#,
                format!(r#"href="{}/style.css"#, cdn),
            ),
            RewriteRule::new(
                &["page.hbs"],
                r#"href="[^"]*images/favicon\.ico"#,
                format!(r#"href="{}/images/favicon.ico"#, cdn),
            ),
            RewriteRule::new(
                &["partials/menu.hbs"],
                r#"src="[^"]*images/compodoc-vectorise\.svg"#,
                format!(r#"src="{}/images/compodoc-logo.svg"#, cdn),
            ),
        ]
    }
}

/// Runs the documentation generator over the library sources.
pub struct DocsBuilder {
    paths: ProjectPaths,
    tools: Tools,
    runner: Arc<dyn CommandRunner>,
    cdn_url: String,
}

impl DocsBuilder {
    pub fn new(
        paths: ProjectPaths,
        tools: Tools,
        runner: Arc<dyn CommandRunner>,
        cdn_url: impl Into<String>,
    ) -> Self {
        Self {
            paths,
            tools,
            runner,
            cdn_url: cdn_url.into(),
        }
    }

    /// Generate documentation titled `<name> v<version>`.
    ///
    /// A generator failure is logged and reported as [`DocsOutcome::Failed`].
    pub fn build(
        &self,
        package_name: &str,
        package_version: &str,
    ) -> Result<DocsOutcome, BuildError> {
        let output_dir = self.paths.documentation_dir();
        stager::remove_dir_if_exists(&output_dir)?;

        crate::banner("CREATING DOCUMENTATION");

        let patched = self.patch_templates()?;
        tracing::debug!("Patched {} documentation templates", patched);

        let generate = Invocation::new(
            self.tools.program(&self.paths, &self.tools.doc_generator),
            self.paths.root(),
        )
        .args([
            "--tsconfig".to_string(),
            compiler_config_name(TargetVariant::Legacy),
            "--disableCoverage".to_string(),
            "--disablePrivateOrInternalSupport".to_string(),
            "--name".to_string(),
            format!("{} v{}", package_name, package_version),
            self.paths.layout().src.display().to_string(),
        ]);

        let output = self.runner.run(&generate)?;
        if !output.success {
            tracing::error!("DOCUMENTATION ERROR. STOP!");
            for line in output.stderr.lines() {
                tracing::error!("{}", line);
            }
            return Ok(DocsOutcome::Failed);
        }

        for dir in PRUNED_ASSET_DIRS {
            stager::remove_dir_if_exists(&output_dir.join(dir))?;
        }

        Ok(DocsOutcome::Generated)
    }

    /// Rewrite asset URLs in the documentation templates. Returns the number of
    /// files written.
    pub fn patch_templates(&self) -> Result<usize, BuildError> {
        let templates = self.paths.doc_templates_dir();
        let mut written = 0;

        for rule in RewriteRule::cdn_rules(&self.cdn_url) {
            for file in &rule.files {
                let path = templates.join(file);
                if !path.exists() {
                    tracing::warn!("Documentation template not found: {}", path.display());
                    continue;
                }

                let text = fs::read_to_string(&path).map_err(|e| BuildError::fs(&path, e))?;
                let patched = rule.apply(&text);
                if patched != text {
                    stager::write_file(&path, patched)?;
                    written += 1;
                }
            }
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ToolOutput;
    use crate::testing::{library_fixture, MockRunner};
    use tempfile::tempdir;

    const CDN: &str = "https://cdn.example.com/theme/1.0.0";

    #[test]
    fn rewrites_script_references() {
        let rules = RewriteRule::cdn_rules(CDN);
        let text = r#"<script src="../resources/js/libs/bootstrap.js"></script>"#;

        let patched = rules[0].apply(text);

        assert!(patched.contains("https://cdn.example.com/theme/1.0.0/dist/js/libs/bootstrap.js"));
        assert!(!patched.contains("../resources/js/"));
    }

    #[test]
    fn rewriting_is_idempotent() {
        let rules = RewriteRule::cdn_rules(CDN);
        let once = rules[0].apply(r#"<script src="js/app.js">"#);
        assert_eq!(rules[0].apply(&once), once);
    }

    #[test]
    fn rewrites_styles_and_images() {
        let rules = RewriteRule::cdn_rules(CDN);
        let page = r#"<link href="./styles/style.css"><link href="./images/favicon.ico">"#;
        let page = rules[1].apply(page);
        let page = rules[2].apply(&page);
        assert_eq!(
            page,
            format!(r#"<link href="{CDN}/style.css"><link href="{CDN}/images/favicon.ico">"#)
        );

        let menu = rules[3].apply(r#"<img src="../images/compodoc-vectorise.svg">"#);
        assert_eq!(menu, format!(r#"<img src="{CDN}/images/compodoc-logo.svg">"#));
    }

    #[test]
    fn build_patches_templates_and_prunes_assets() {
        let temp = tempdir().unwrap();
        let paths = library_fixture(temp.path());
        let templates = paths.doc_templates_dir();
        fs::create_dir_all(templates.join("partials")).unwrap();
        fs::write(templates.join("page.hbs"), r#"<script src="js/menu.js">"#).unwrap();

        let runner = Arc::new(MockRunner::new(|inv| {
            let docs = inv.cwd.join("documentation");
            for dir in ["fonts", "images", "styles", "js", "components"] {
                fs::create_dir_all(docs.join(dir)).unwrap();
            }
            ToolOutput::ok("")
        }));
        let builder = DocsBuilder::new(paths, Tools::default(), runner.clone(), CDN);

        let outcome = builder.build("@cloukit/toggle", "1.0.0").unwrap();

        assert_eq!(outcome, DocsOutcome::Generated);
        let page = fs::read_to_string(templates.join("page.hbs")).unwrap();
        assert!(page.contains(&format!("{CDN}/dist/js/menu.js")));

        let docs = temp.path().join("documentation");
        assert!(docs.join("components").exists());
        for dir in PRUNED_ASSET_DIRS {
            assert!(!docs.join(dir).exists(), "{dir} should be pruned");
        }

        let calls = runner.calls.lock().unwrap();
        assert!(calls[0].args.contains(&"@cloukit/toggle v1.0.0".to_string()));
        assert!(calls[0].args.contains(&"tsconfig-es5.json".to_string()));
        assert_eq!(calls[0].args.last().unwrap(), "src");
    }

    #[test]
    fn generator_failure_keeps_assets() {
        let temp = tempdir().unwrap();
        let paths = library_fixture(temp.path());
        let runner = Arc::new(MockRunner::new(|inv| {
            fs::create_dir_all(inv.cwd.join("documentation/js")).unwrap();
            ToolOutput::failed(1, "no tsconfig")
        }));

        let outcome = DocsBuilder::new(paths, Tools::default(), runner, CDN)
            .build("toggle", "1.0.0")
            .unwrap();

        assert_eq!(outcome, DocsOutcome::Failed);
        assert!(temp.path().join("documentation/js").exists());
    }
}
