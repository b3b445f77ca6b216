// Server-side HTML views
//
// Templates are compiled into the binary and rendered with minijinja.

use minijinja::{AutoEscape, Environment};
use serde::Serialize;

const SERVICE_NAME: &str = "Store Probe";

const TEMPLATES: &[(&str, &str)] = &[
    ("layout", include_str!("../views/layout.html")),
    ("home/index", include_str!("../views/home/index.html")),
];

/// Renders named templates
pub struct ViewRenderer {
    env: Environment<'static>,
}

impl ViewRenderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        // Template names carry no extension, so escaping is switched on explicitly
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.add_global("service_name", SERVICE_NAME);
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(context)
    }
}
