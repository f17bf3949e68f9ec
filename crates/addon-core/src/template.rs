//! Action templating.
//!
//! Action bodies are rendered with minijinja before they run. The context
//! exposes `project`, `addon` and one key per `yaml_read_files` entry.
//! Undefined variables are errors. Comments use `{## ... ##}` so that shell
//! expansions like `${#array[@]}` pass through untouched.

use std::collections::BTreeMap;
use std::path::Path;

use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, UndefinedBehavior, Value};
use serde::Serialize;

use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::project::ProjectContext;

const RESERVED_KEYS: &[&str] = &["project", "addon"];

/// The add-on fields visible to templates as `addon`.
#[derive(Debug, Clone, Serialize)]
struct AddonContext<'a> {
    name: &'a str,
    dependencies: &'a [String],
    project_files: &'a [String],
    global_files: &'a [String],
}

/// Variables available while rendering one add-on's actions.
#[derive(Debug, Clone)]
pub struct TemplateContext {
    addon: String,
    values: BTreeMap<String, Value>,
}

impl TemplateContext {
    /// Build the context for `descriptor`, reading its `yaml_read_files`
    /// relative to `config_dir`.
    ///
    /// A listed file that does not exist is exposed as `none`.
    pub fn load(project: &ProjectContext, descriptor: &Descriptor, config_dir: &Path) -> Result<Self> {
        let mut values = BTreeMap::new();
        values.insert("project".to_string(), Value::from_serialize(project));
        values.insert(
            "addon".to_string(),
            Value::from_serialize(AddonContext {
                name: &descriptor.name,
                dependencies: &descriptor.dependencies,
                project_files: &descriptor.project_files,
                global_files: &descriptor.global_files,
            }),
        );

        for (key, rel) in &descriptor.yaml_read_files {
            if RESERVED_KEYS.contains(&key.as_str()) {
                tracing::warn!(addon = %descriptor.name, key = %key, "yaml_read_files key shadows a built-in variable; ignoring");
                continue;
            }
            let tree = read_yaml_tree(&descriptor.name, &config_dir.join(rel))?;
            values.insert(key.clone(), Value::from_serialize(&tree));
        }

        Ok(Self {
            addon: descriptor.name.clone(),
            values,
        })
    }

    /// Render `source` against this context.
    pub fn render(&self, source: &str) -> Result<String> {
        let env = environment().map_err(|e| self.template_error(&e))?;
        env.render_str(source, &self.values)
            .map_err(|e| self.template_error(&e))
    }

    fn template_error(&self, e: &minijinja::Error) -> Error {
        let mut reason = e.to_string();
        if let Some(detail) = e.detail() {
            if !reason.contains(detail) {
                reason = format!("{reason}: {detail}");
            }
        }
        Error::Template {
            addon: self.addon.clone(),
            reason,
        }
    }
}

fn environment() -> std::result::Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.set_syntax(
        SyntaxConfig::builder()
            .comment_delimiters("{##", "##}")
            .build()?,
    );
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    Ok(env)
}

fn read_yaml_tree(addon: &str, path: &Path) -> Result<serde_yaml::Value> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(addon, path = %path.display(), "yaml_read_files entry does not exist");
            return Ok(serde_yaml::Value::Null);
        }
        Err(e) => return Err(e.into()),
    };
    serde_yaml::from_str(&content).map_err(|e| Error::Template {
        addon: addon.to_string(),
        reason: format!("cannot parse {}: {e}", path.display()),
    })
}
