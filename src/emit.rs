use std::{
    fs,
    path::{Path, PathBuf},
};

use handlebars::{handlebars_helper, no_escape, Handlebars};
use serde::Serialize;
use tracing::info;

use crate::{collect_deps::ModuleRecord, error::Error};

const BUNDLE_TEMPLATE: &str = include_str!("../templates/bundle.hbs");

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BundleData<'a> {
    entry_path: &'a str,
    source_list: Vec<BundleSource<'a>>,
}

#[derive(Serialize)]
struct BundleSource<'a> {
    path: &'a str,
    code: &'a str,
}

// Quotes a value as a JavaScript literal.
handlebars_helper!(json: |value: Json| value.to_string());

/// Renders the module table and runtime loader into a single script that
/// runs `entry_id` when loaded.
pub fn render_bundle(entry_id: &str, modules: &[ModuleRecord]) -> Result<String, Error> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars.register_escape_fn(no_escape);
    handlebars.register_helper("json", Box::new(json));
    handlebars.register_template_string("bundle", BUNDLE_TEMPLATE)?;

    let data = BundleData {
        entry_path: entry_id,
        source_list: modules
            .iter()
            .map(|module| BundleSource {
                path: &module.id,
                code: &module.source,
            })
            .collect(),
    };
    Ok(handlebars.render("bundle", &data)?)
}

/// Writes `contents` to `<output_dir>/<filename>`, creating `output_dir`.
pub fn write_bundle(output_dir: &Path, filename: &str, contents: &str) -> Result<PathBuf, Error> {
    let path = output_dir.join(filename);
    let write_error = |source| Error::Write {
        path: path.clone(),
        source,
    };
    fs::create_dir_all(output_dir).map_err(write_error)?;
    fs::write(&path, contents).map_err(write_error)?;
    info!(path = %path.display(), bytes = contents.len(), "wrote bundle");
    Ok(path)
}
