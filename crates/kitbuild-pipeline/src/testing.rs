//! Test doubles for the build steps.

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use crate::paths::{Layout, ProjectPaths};
use crate::process::{CommandRunner, Invocation, ToolError, ToolOutput};

type Handler = Box<dyn Fn(&Invocation) -> ToolOutput + Send + Sync>;

/// Records every invocation and answers through a handler.
pub struct MockRunner {
    handler: Handler,
    pub calls: Mutex<Vec<Invocation>>,
    pub detached: Mutex<Vec<Invocation>>,
}

impl MockRunner {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Invocation) -> ToolOutput + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            detached: Mutex::new(Vec::new()),
        }
    }

    /// Runner whose commands all succeed without side effects.
    pub fn succeeding() -> Self {
        Self::new(|_| ToolOutput::ok(""))
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.program_name())
            .collect()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
        self.calls.lock().unwrap().push(invocation.clone());
        Ok((self.handler)(invocation))
    }

    fn spawn_detached(&self, invocation: &Invocation) -> Result<(), ToolError> {
        self.detached.lock().unwrap().push(invocation.clone());
        Ok(())
    }
}

/// Behaves like the compiler and bundler: the compiler emits the flat module,
/// declarations and metadata; the bundler writes its `-o` target.
pub fn fake_toolchain(invocation: &Invocation) -> ToolOutput {
    let name = invocation.program_name();
    let args = &invocation.args;

    if name == "ngc" {
        let config_path = invocation.cwd.join(&args[1]);
        let config: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(config_path).unwrap()).unwrap();
        // Like the real compiler, a missing entry file is a compile error.
        let entry = config["files"][0].as_str().unwrap();
        if !invocation.cwd.join(entry).is_file() {
            let message = format!("error TS6053: File '{}' not found.", entry);
            return ToolOutput::failed(2, message);
        }
        let out_dir = invocation
            .cwd
            .join(config["compilerOptions"]["outDir"].as_str().unwrap())
            .join("src");
        let module_id = config["angularCompilerOptions"]["flatModuleId"]
            .as_str()
            .unwrap();

        fs::create_dir_all(out_dir.join("components")).unwrap();
        fs::write(out_dir.join(format!("{}.js", module_id)), "export {};").unwrap();
        fs::write(out_dir.join(format!("{}.d.ts", module_id)), "export {};").unwrap();
        fs::write(out_dir.join("components/toggle.d.ts"), "export {};").unwrap();
        fs::write(out_dir.join(format!("{}.metadata.json", module_id)), "{}").unwrap();
        return ToolOutput::ok("compiled");
    }

    if name == "rollup" {
        let out = invocation.cwd.join(&args[2]);
        fs::create_dir_all(out.parent().unwrap()).unwrap();
        fs::write(out, "bundle").unwrap();
    }

    ToolOutput::ok("")
}

/// A minimal library checkout under `root`.
pub fn library_fixture(root: &Path) -> ProjectPaths {
    fs::create_dir_all(root.join("src/demo/stories")).unwrap();
    fs::write(root.join("src/index.ts"), "export * from './toggle';").unwrap();
    fs::write(root.join("README.md"), "# toggle").unwrap();
    fs::write(
        root.join("package.json"),
        r#"{
  "name": "@cloukit/toggle",
  "moduleId": "toggle",
  "version": "1.0.0",
  "description": "Toggle switch",
  "dependencies": { "tslib": "^1.7.1" },
  "peerDependencies": { "@angular/core": "^4.3.0" },
  "devDependencies": { "typescript": "~2.4.0" }
}"#,
    )
    .unwrap();

    ProjectPaths::new(root, Layout::default())
}
