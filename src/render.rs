//! Template environment shared by every generated page.
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::debug;
use minijinja::{Environment, Value};
use serde::Serialize;

use crate::enums::label_for;
use crate::error::Result;

type LoaderResult = std::result::Result<Option<String>, minijinja::Error>;

// Loads a template from the first directory that has it.  Names escaping the directories are
// treated as missing.
fn search_loader(directories: Vec<PathBuf>) -> impl Fn(&str) -> LoaderResult + Send + Sync + 'static {
    move |name: &str| {
        if name.split(['/', '\\']).any(|segment| segment == "..") {
            return Ok(None);
        }
        for directory in &directories {
            match fs::read_to_string(directory.join(name)) {
                Ok(source) => return Ok(Some(source)),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(minijinja::Error::new(
                        minijinja::ErrorKind::InvalidOperation,
                        format!("could not read template {name}"),
                    )
                    .with_source(e))
                }
            }
        }
        Ok(None)
    }
}

/// List of `[key, value]` pairs of a map.
///
/// # Errors
/// Returns `Err` if the value is not iterable.
pub fn items_filter(value: &Value) -> std::result::Result<Vec<Value>, minijinja::Error> {
    value
        .try_iter()?
        .map(|key| {
            let item = value.get_item(&key)?;
            Ok(Value::from(vec![key, item]))
        })
        .collect()
}

/// Label of a serialized enum value, or the value itself when it names no enum.
#[must_use]
pub fn enum_name_filter(value: &Value, kind: Option<String>) -> String {
    match value.as_str() {
        Some(name) => label_for(kind.as_deref(), name).map_or_else(|| name.to_string(), String::from),
        None => value.to_string(),
    }
}

#[must_use]
pub fn debug_filter(value: &Value) -> String {
    format!("{value:#?}")
}

/// Formatted generation time shown in page footers.
#[must_use]
pub fn format_update_datetime(datetime: DateTime<Utc>) -> String {
    datetime.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Minify an HTML document, keeping the markup browsers and the CSS rely on.
///
/// # Errors
/// Returns `Err` if the minifier produces invalid UTF-8.
pub fn minify(html: &str) -> Result<String> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.do_not_minify_doctype = true;
    Ok(String::from_utf8(minify_html::minify(html.as_bytes(), &cfg))?)
}

pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    /// Templates are looked up in `templates_directory`, then in `pages_directory`.
    #[must_use]
    pub fn new(templates_directory: &Path, pages_directory: &Path) -> Self {
        let mut env = Environment::new();
        env.set_loader(search_loader(vec![
            templates_directory.to_path_buf(),
            pages_directory.to_path_buf(),
        ]));
        env.add_filter("items", items_filter);
        env.add_filter("enum_name", enum_name_filter);
        env.add_filter("debug", debug_filter);
        Renderer { env }
    }

    /// # Errors
    /// Returns `Err` if the template is missing or fails to render.
    pub fn render<S: Serialize>(&self, template: &str, context: S) -> Result<String> {
        Ok(self.env.get_template(template)?.render(context)?)
    }

    /// Render, minify and write a page, creating its parent directories.
    ///
    /// # Errors
    /// Returns `Err` if rendering fails or the destination cannot be written.
    pub fn render_to_file<S: Serialize>(
        &self,
        template: &str,
        context: S,
        destination: &Path,
    ) -> Result<()> {
        let html = minify(&self.render(template, context)?)?;
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!("(Renderer.render_to_file) Writing {} from {template}", destination.display());
        fs::write(destination, html)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use minijinja::context;
    use tempfile::tempdir;

    fn renderer_with(templates: &[(&str, &str)], pages: &[(&str, &str)]) -> (tempfile::TempDir, Renderer) {
        let root = tempdir().unwrap();
        for (dir, files) in [("templates", templates), ("pages", pages)] {
            for (name, source) in files {
                let path = root.path().join(dir).join(name);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(path, source).unwrap();
            }
        }
        let renderer = Renderer::new(&root.path().join("templates"), &root.path().join("pages"));
        (root, renderer)
    }

    #[test]
    fn test_items_filter() {
        let (_root, renderer) = renderer_with(
            &[("t.html.jinja", "{% for k, v in m|items %}{{ k }}={{ v }};{% endfor %}")],
            &[],
        );
        let out = renderer
            .render("t.html.jinja", context! { m => context! { a => 1, b => 2 } })
            .unwrap();
        assert_eq!(out, "a=1;b=2;");
    }

    #[test]
    fn test_enum_name_filter() {
        let (_root, renderer) = renderer_with(
            &[(
                "t.html.jinja",
                "{{ f|enum_name }}|{{ n|enum_name('ResistType') }}|{{ x|enum_name }}|{{ 3|enum_name }}",
            )],
            &[],
        );
        let out = renderer
            .render("t.html.jinja", context! { f => "VANU_SOVEREIGNTY", n => "NONE", x => "OTHER" })
            .unwrap();
        assert_eq!(out, "Vanu Sovereignty|None|OTHER|3");
    }

    #[test]
    fn test_pages_extend_templates() {
        let (_root, renderer) = renderer_with(
            &[("base.html.jinja", "<p>{% block content %}{% endblock %}</p>")],
            &[("index.html.jinja", "{% extends 'base.html.jinja' %}{% block content %}hi{% endblock %}")],
        );
        assert_eq!(renderer.render("index.html.jinja", context! {}).unwrap(), "<p>hi</p>");
    }

    #[test]
    fn test_loader_rejects_parent_directories() {
        let (_root, renderer) = renderer_with(&[("a.html.jinja", "a")], &[]);
        assert!(renderer.render("../templates/a.html.jinja", context! {}).is_err());
        assert!(renderer.render("missing.html.jinja", context! {}).is_err());
    }

    #[test]
    fn test_render_to_file_minifies() {
        let (root, renderer) = renderer_with(
            &[(
                "t.html.jinja",
                "<!DOCTYPE html>\n<html>\n  <head><title>{{ title }}</title></head>\n  <body>\n    <p>  x  </p>\n  </body>\n</html>\n",
            )],
            &[],
        );
        let destination = root.path().join("site/a/b.html");
        renderer
            .render_to_file("t.html.jinja", context! { title => "T" }, &destination)
            .unwrap();

        let html = fs::read_to_string(destination).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>T</title>"));
        assert!(html.contains("</p>"));
        assert!(!html.contains("\n  "));
    }

    #[test]
    fn test_format_update_datetime() {
        let datetime = Utc.with_ymd_and_hms(2024, 3, 9, 17, 5, 0).unwrap();
        assert_eq!(format_update_datetime(datetime), "2024-03-09 17:05 UTC");
    }
}
